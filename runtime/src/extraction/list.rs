// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! One page's worth of list extraction.
//!
//! 1. Resolve a working selector from the list selector (its alternatives,
//!    or generic structural fallbacks when it is a single selector).
//! 2. Trigger lazy loading until the on-page count reaches the target or
//!    growth stagnates.
//! 3. Snapshot the page and extract every item, then drop in-page
//!    duplicates and excluded items.

use super::dedup::SeenSet;
use super::{exclusion, fields::extract_record};
use crate::config::EngineConfig;
use crate::renderer::{pause, ClickTarget, PhraseMatch, RenderContext, Scroll};
use crate::selectors::{self, split_alternatives};
use crate::types::{ExclusionFilter, Field, Item};
use scraper::Html;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Structural selectors tried when a single list selector matches nothing.
pub const GENERIC_FALLBACKS: &[&str] = &[
    r#"[class*="product"]"#,
    r#"[class*="item"]"#,
    r#"[class*="card"]"#,
    r#"[class*="result"]"#,
    "article",
    ".search-result",
    ".listing",
];

/// Phrases of controls clicked while converging.
pub const LOAD_MORE_CLICK_PHRASES: &[&str] = &[
    "load more",
    "see more",
    "show more",
    "more results",
    "more properties",
];

const LOAD_MORE_CLICK_SCOPE: &str = r#"button, a[role="button"], a"#;

/// Corrective upward scroll when a round produced nothing.
const NUDGE_UP_PX: i64 = -400;

/// Candidate selectors for a list selector, in the order they are tried.
pub fn selector_variants(list_selector: &str) -> Vec<String> {
    let alternatives = split_alternatives(list_selector);
    if alternatives.len() > 1 {
        return alternatives.into_iter().map(str::to_string).collect();
    }
    alternatives
        .into_iter()
        .chain(GENERIC_FALLBACKS.iter().copied())
        .map(str::to_string)
        .collect()
}

/// The first variant that matches at least one element on the live page.
pub async fn resolve_working_selector(
    ctx: &dyn RenderContext,
    list_selector: &str,
) -> Option<String> {
    for variant in selector_variants(list_selector) {
        let count = ctx.count(&variant).await.unwrap_or(0);
        debug!(selector = %variant, count, "checking list selector");
        if count > 0 {
            return Some(variant);
        }
    }
    None
}

/// Click target for a text-matched load-more control.
pub fn load_more_by_text() -> ClickTarget {
    ClickTarget::Text {
        scope: LOAD_MORE_CLICK_SCOPE.to_string(),
        phrases: LOAD_MORE_CLICK_PHRASES
            .iter()
            .map(|p| p.to_string())
            .collect(),
        matching: PhraseMatch::Contains,
    }
}

/// Poll until the count of `selector` exceeds `previous` or `timeout_ms`
/// elapses. Returns the last count seen.
pub async fn wait_for_growth(
    ctx: &dyn RenderContext,
    selector: &str,
    previous: usize,
    timeout_ms: u64,
    poll_ms: u64,
) -> usize {
    let start = Instant::now();
    loop {
        let current = ctx.count(selector).await.unwrap_or(0);
        if current > previous || start.elapsed() >= Duration::from_millis(timeout_ms) {
            return current;
        }
        pause(poll_ms).await;
    }
}

/// Lazy-load convergence: grow the on-page count towards `desired`.
///
/// Stops when the target is reached or after `stagnation_limit` consecutive
/// rounds without growth. Returns the final count.
pub async fn converge(
    ctx: &mut dyn RenderContext,
    selector: &str,
    desired: usize,
    config: &EngineConfig,
) -> usize {
    let t = &config.timings;
    let mut count = ctx.count(selector).await.unwrap_or(0);
    let mut stagnant = 0u32;

    while count < desired {
        let before = count;
        let _ = ctx
            .scroll(Scroll::ToBottom {
                step_px: t.scroll_step_px,
                tick_ms: t.scroll_tick_ms,
            })
            .await;
        if ctx.click(&load_more_by_text()).await.unwrap_or(false) {
            pause(t.load_more_pause_ms).await;
        }
        count = wait_for_growth(&*ctx, selector, before, t.growth_wait_ms, t.poll_interval_ms).await;

        if count <= before {
            stagnant += 1;
            let _ = ctx.scroll(Scroll::By(NUDGE_UP_PX)).await;
            pause(t.nudge_up_pause_ms).await;
            let _ = ctx.scroll(Scroll::ToEnd).await;
            pause(t.nudge_down_pause_ms).await;
            let maybe = ctx.count(selector).await.unwrap_or(0);
            if maybe > count {
                count = maybe;
                stagnant = 0;
            }
        } else {
            stagnant = 0;
        }
        debug!(count, desired, stagnant, "lazy-load round");

        if stagnant >= config.stagnation_limit {
            info!(count, desired, "lazy loading stagnated");
            break;
        }
    }

    pause(t.after_lazy_load_ms).await;
    count
}

/// Extract every element matching `selector` from an HTML snapshot.
///
/// `_index` is the element's position among the matches.
pub fn parse_items(html: &str, selector: &str, fields: &[Field], base: Option<&Url>) -> Vec<Item> {
    let doc = Html::parse_document(html);
    let Some(sel) = selectors::parse(selector) else {
        return Vec::new();
    };
    doc.select(&sel)
        .enumerate()
        .map(|(index, el)| Item {
            index,
            detail_url: None,
            values: extract_record(el, fields, base),
        })
        .collect()
}

/// Result of one page pass.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// The selector that matched on this page, if any.
    pub working_selector: Option<String>,
    /// Items after in-page dedup and exclusion.
    pub items: Vec<Item>,
    /// Elements matched before filtering.
    pub matched: usize,
}

/// The List Extractor.
pub struct ListExtractor<'a> {
    pub config: &'a EngineConfig,
    pub fields: &'a [Field],
    pub exclusion: Option<&'a ExclusionFilter>,
}

impl<'a> ListExtractor<'a> {
    pub fn new(
        config: &'a EngineConfig,
        fields: &'a [Field],
        exclusion: Option<&'a ExclusionFilter>,
    ) -> Self {
        Self {
            config,
            fields,
            exclusion,
        }
    }

    /// Extract the currently loaded page.
    ///
    /// `target` is the on-page count to converge towards; `None` skips lazy
    /// loading entirely.
    pub async fn extract(
        &self,
        ctx: &mut dyn RenderContext,
        list_selector: &str,
        target: Option<usize>,
    ) -> PageExtraction {
        let Some(working) = resolve_working_selector(&*ctx, list_selector).await else {
            info!(selector = list_selector, "no list selector matched, page yields nothing");
            return PageExtraction::default();
        };
        info!(selector = %working, "using list selector");

        if let Some(desired) = target {
            converge(ctx, &working, desired, self.config).await;
        }

        let html = match ctx.get_html().await {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "page snapshot failed");
                return PageExtraction {
                    working_selector: Some(working),
                    ..Default::default()
                };
            }
        };
        let base = ctx.get_url().await.ok().and_then(|u| Url::parse(&u).ok());

        let raw = parse_items(&html, &working, self.fields, base.as_ref());
        let matched = raw.len();

        let mut seen = SeenSet::new(self.fields);
        let unique = seen.retain_new(raw);
        if unique.len() < matched {
            debug!(removed = matched - unique.len(), "in-page duplicates removed");
        }

        let before_exclusion = unique.len();
        let items = exclusion::apply(self.exclusion, unique);
        if items.len() < before_exclusion {
            info!(excluded = before_exclusion - items.len(), "exclusion filter applied");
        }

        PageExtraction {
            working_selector: Some(working),
            items,
            matched,
        }
    }
}
