// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! "Try selector list, first match wins" resolution.
//!
//! Fields, list containers, and pagination controls all resolve an ordered
//! list of candidate selectors against a document or an element. This module
//! implements that loop once, parameterized by a [`Predicate`].
//!
//! Everything here is synchronous and works on `scraper` types, which are
//! `!Send`: parse, resolve, and drop the document before the next await.

use scraper::{ElementRef, Html, Selector};

/// What a candidate selector must satisfy to be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// At least this many elements match.
    AtLeast(usize),
    /// The first match exists and is not disabled.
    Enabled,
}

/// Parse a selector, returning `None` on invalid syntax.
pub fn parse(selector: &str) -> Option<Selector> {
    Selector::parse(selector.trim()).ok()
}

/// Split a comma-separated fallback chain into its alternatives.
///
/// Commas inside brackets, parentheses, or quotes are part of the selector
/// (`[data-testid*="a,b"]` stays whole). An unbalanced chain is split on
/// every comma instead. Empty alternatives are dropped.
pub fn split_alternatives(chain: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in chain.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '[') | (None, '(') => depth += 1,
            (None, ']') | (None, ')') => depth -= 1,
            (None, ',') if depth <= 0 => {
                parts.push(&chain[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&chain[start..]);

    if depth != 0 || quote.is_some() {
        parts = chain.split(',').collect();
    }

    parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Whether an element is disabled for clicking purposes.
pub fn is_disabled(el: &ElementRef<'_>) -> bool {
    let v = el.value();
    v.attr("disabled").is_some()
        || v.attr("aria-disabled")
            .map(|a| a.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

/// Whether `selector` satisfies `predicate` within `document`.
pub fn satisfies(document: &Html, selector: &str, predicate: Predicate) -> bool {
    let Some(sel) = parse(selector) else {
        return false;
    };
    match predicate {
        Predicate::AtLeast(n) => document.select(&sel).take(n.max(1)).count() >= n.max(1),
        Predicate::Enabled => document
            .select(&sel)
            .next()
            .map(|el| !is_disabled(&el))
            .unwrap_or(false),
    }
}

/// First candidate that satisfies the predicate in the document.
pub fn first_satisfying<'a, I>(document: &Html, candidates: I, predicate: Predicate) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .find(|c| satisfies(document, c, predicate))
}

/// First element matched by any alternative, tried in order, under `root`.
///
/// Invalid alternatives are skipped rather than failing the chain.
pub fn first_match_in<'a>(root: ElementRef<'a>, alternatives: &[&str]) -> Option<ElementRef<'a>> {
    alternatives.iter().find_map(|alt| {
        let sel = parse(alt)?;
        root.select(&sel).next()
    })
}

/// Number of elements matching `selector`, zero on invalid syntax.
pub fn count(document: &Html, selector: &str) -> usize {
    parse(selector)
        .map(|sel| document.select(&sel).count())
        .unwrap_or(0)
}

/// Trimmed text content of an element.
pub fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text collapsed to single spaces, lowercased, for phrase matching.
pub fn normalized_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
