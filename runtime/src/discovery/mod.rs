// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Schema discovery: propose a mode, list selector, field suggestions, and a
//! pagination descriptor for an unknown page.
//!
//! Runs synchronously on an HTML snapshot. Heuristics run in priority order
//! and share one [`SuggestionSet`], so a signal found twice is reported once
//! with the confidence of its first finder.

pub mod accumulator;
pub mod heuristics;
pub mod pagination;

use crate::types::{DiscoveryResult, Mode};
use accumulator::SuggestionSet;
use scraper::Html;

/// Analyse a document snapshot.
pub fn discover(html: &str) -> DiscoveryResult {
    let doc = Html::parse_document(html);
    let mut set = SuggestionSet::new();

    heuristics::single_signals(&doc, &mut set);
    let counts = heuristics::identifier_hints(&doc, &mut set);
    let list_item_selector = heuristics::find_list_container(&doc, &counts);
    if let Some(list) = &list_item_selector {
        heuristics::inner_probes(&doc, list, &mut set);
    }
    let pagination = pagination::detect(&doc);

    let mode = if list_item_selector.is_some() {
        Mode::List
    } else if !set.is_empty() {
        Mode::Single
    } else {
        Mode::Unknown
    };

    DiscoveryResult {
        mode,
        list_item_selector,
        suggestions: set.into_vec(),
        pagination,
    }
}
