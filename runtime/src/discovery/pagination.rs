// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pagination control detection.
//!
//! Classification priority: load-more, then numbered pages, then next/prev
//! links, then lazy-load indicators, else none.

use crate::selectors::{self, element_text, first_satisfying, normalized_text, Predicate};
use crate::types::{PaginationDescriptor, PaginationKind};
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;

pub const NEXT_SELECTORS: &[&str] = &[
    r#"a[rel="next"]"#,
    r#"link[rel="next"]"#,
    r#"a[aria-label*="next" i]:not([disabled])"#,
    r#"button[aria-label*="next" i]:not([disabled])"#,
    r#"a[title*="next" i]"#,
    r#"button[title*="next" i]:not([disabled])"#,
    "a.next",
    "button.next:not([disabled])",
    "li.next a",
    ".pagination-next a",
    ".next",
];

pub const PREV_SELECTORS: &[&str] = &[
    r#"a[rel="prev"]"#,
    r#"link[rel="prev"]"#,
    r#"a[aria-label*="prev" i]"#,
    r#"button[aria-label*="prev" i]:not([disabled])"#,
    r#"a[title*="prev" i]"#,
    "a.prev",
    "button.prev:not([disabled])",
    "li.prev a",
    ".pagination-prev a",
    ".prev",
];

pub const LOAD_MORE_SELECTORS: &[&str] = &[
    r#"button[aria-label*="load more" i]"#,
    r#"button[aria-label*="show more" i]"#,
    r#"a[aria-label*="load more" i]"#,
    r#"[data-testid*="load-more"]"#,
    ".load-more",
    ".show-more",
];

/// Containers whose numeric children form a page list.
pub const NUMBERED_CONTAINERS: &[&str] = &[
    ".pagination a",
    ".page-numbers a",
    r#"nav[aria-label*="pagination" i] a"#,
    r#"[class*="pagination"] button"#,
    r#"a[href*="page="]"#,
];

pub const CURRENT_PAGE_SELECTORS: &[&str] = &[
    r#"[aria-current="page"]"#,
    ".pagination .active",
    ".pagination .current",
    ".page-numbers.current",
];

pub const TOTAL_PAGES_SELECTORS: &[&str] = &[
    "[data-total-pages]",
    ".total-pages",
    ".pagination .last",
];

pub const INFINITE_SCROLL_INDICATORS: &[&str] = &[
    "[data-infinite-scroll]",
    ".infinite-scroll",
    "[data-scroll-loader]",
    r#"[class*="infinite"]"#,
    r#"[class*="lazy-load"]"#,
];

/// Script tokens that signal client-side lazy loading.
const SCRIPT_HINTS: &[&str] = &["infinitescroll", "infinite-scroll", "lazyload"];

/// Scope scanned for load-more controls by text.
pub const LOAD_MORE_TEXT_SCOPE: &str = r#"button, a, [role="button"]"#;

/// Phrases on a load-more control.
pub const LOAD_MORE_PHRASES: &[&str] = &["load more", "show more", "view more", "see more"];

fn load_more_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(load more|show more|view more|see more)\b").expect("valid regex")
    })
}

fn page_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[1-9]\d*$").expect("valid regex"))
}

/// Find a load-more control. `Some(None)` means one was found by text but
/// has no stable selector (no id).
fn find_load_more(doc: &Html) -> Option<Option<String>> {
    if let Some(sel) = first_satisfying(doc, LOAD_MORE_SELECTORS.iter().copied(), Predicate::Enabled)
    {
        return Some(Some(sel.to_string()));
    }
    let scope = selectors::parse(LOAD_MORE_TEXT_SCOPE)?;
    let hit = doc
        .select(&scope)
        .filter(|el| !selectors::is_disabled(el))
        .find(|el| load_more_re().is_match(&normalized_text(el)))?;
    Some(
        hit.value()
            .id()
            .filter(|id| !id.is_empty() && !id.contains(['"', '\\']))
            .map(|id| format!(r#"[id="{id}"]"#)),
    )
}

/// Container selectors with at least two positive-integer children.
fn find_numbered(doc: &Html) -> Vec<String> {
    NUMBERED_CONTAINERS
        .iter()
        .filter(|c| {
            let Some(sel) = selectors::parse(c) else {
                return false;
            };
            doc.select(&sel)
                .filter(|el| page_number_re().is_match(&element_text(el)))
                .take(2)
                .count()
                >= 2
        })
        .map(|c| c.to_string())
        .collect()
}

fn has_lazy_load_hints(doc: &Html) -> bool {
    if first_satisfying(doc, INFINITE_SCROLL_INDICATORS.iter().copied(), Predicate::AtLeast(1))
        .is_some()
    {
        return true;
    }
    let Some(scripts) = selectors::parse("script") else {
        return false;
    };
    doc.select(&scripts).any(|s| {
        let body = s.text().collect::<String>().to_lowercase();
        let src = s.value().attr("src").unwrap_or("").to_lowercase();
        SCRIPT_HINTS
            .iter()
            .any(|h| body.contains(h) || src.contains(h))
    })
}

/// Detect pagination controls on a parsed document.
pub fn detect(doc: &Html) -> PaginationDescriptor {
    let next = first_satisfying(doc, NEXT_SELECTORS.iter().copied(), Predicate::Enabled);
    let prev = first_satisfying(doc, PREV_SELECTORS.iter().copied(), Predicate::AtLeast(1));
    let load_more = find_load_more(doc);
    let numbered = find_numbered(doc);

    let kind = if load_more.is_some() {
        PaginationKind::LoadMoreButton
    } else if !numbered.is_empty() {
        PaginationKind::TraditionalPagination
    } else if next.is_some() || prev.is_some() {
        if has_lazy_load_hints(doc) {
            PaginationKind::InfiniteScroll
        } else {
            PaginationKind::TraditionalPagination
        }
    } else if has_lazy_load_hints(doc) {
        PaginationKind::InfiniteScroll
    } else {
        PaginationKind::None
    };

    let has_numbered_pages = !numbered.is_empty();
    PaginationDescriptor {
        kind,
        next_button_selector: next.map(str::to_string),
        prev_button_selector: prev.map(str::to_string),
        load_more_selector: load_more.flatten(),
        page_number_selectors: numbered,
        has_numbered_pages,
        current_page_selector: first_satisfying(
            doc,
            CURRENT_PAGE_SELECTORS.iter().copied(),
            Predicate::AtLeast(1),
        )
        .map(str::to_string),
        total_pages_selector: first_satisfying(
            doc,
            TOTAL_PAGES_SELECTORS.iter().copied(),
            Predicate::AtLeast(1),
        )
        .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect_html(html: &str) -> PaginationDescriptor {
        detect(&Html::parse_document(html))
    }

    #[test]
    fn test_load_more_beats_numbered() {
        let d = detect_html(
            r#"<div class="pagination"><a>1</a><a>2</a></div>
               <button class="load-more">Load more</button>"#,
        );
        assert_eq!(d.kind, PaginationKind::LoadMoreButton);
        assert_eq!(d.load_more_selector.as_deref(), Some(".load-more"));
        assert!(d.has_numbered_pages);
    }

    #[test]
    fn test_load_more_by_text() {
        let d = detect_html(r#"<button id="more-btn">  Show more results </button>"#);
        assert_eq!(d.kind, PaginationKind::LoadMoreButton);
        assert_eq!(d.load_more_selector.as_deref(), Some(r#"[id="more-btn"]"#));

        let d = detect_html(r#"<button>See more</button>"#);
        assert_eq!(d.kind, PaginationKind::LoadMoreButton);
        assert_eq!(d.load_more_selector, None);
    }

    #[test]
    fn test_numbered_requires_two_numbers() {
        let d = detect_html(
            r#"<div class="pagination"><a>1</a><a href="?page=2">Next</a></div>"#,
        );
        assert!(!d.has_numbered_pages);

        let d = detect_html(
            r#"<div class="pagination"><a aria-current="page">1</a><a>2</a><a>3</a></div>"#,
        );
        assert_eq!(d.kind, PaginationKind::TraditionalPagination);
        assert_eq!(d.page_number_selectors, vec![".pagination a".to_string()]);
        assert_eq!(d.current_page_selector.as_deref(), Some(r#"[aria-current="page"]"#));
    }

    #[test]
    fn test_next_link_and_disabled_next() {
        let d = detect_html(r#"<a rel="prev" href="/p1">Prev</a><a rel="next" href="/p3">Next</a>"#);
        assert_eq!(d.kind, PaginationKind::TraditionalPagination);
        assert_eq!(d.next_button_selector.as_deref(), Some(r#"a[rel="next"]"#));
        assert_eq!(d.prev_button_selector.as_deref(), Some(r#"a[rel="prev"]"#));

        let d = detect_html(r#"<button class="next" disabled>Next</button>"#);
        assert_eq!(d.kind, PaginationKind::None);
    }

    #[test]
    fn test_next_prev_with_scroll_sentinel_is_infinite() {
        let d = detect_html(r#"<a rel="next" href="/p2">Next</a><div data-infinite-scroll></div>"#);
        assert_eq!(d.kind, PaginationKind::InfiniteScroll);
        assert_eq!(d.next_button_selector.as_deref(), Some(r#"a[rel="next"]"#));

        let d = detect_html(r#"<a rel="prev" href="/p1">Previous</a>"#);
        assert_eq!(d.kind, PaginationKind::TraditionalPagination);
        assert_eq!(d.next_button_selector, None);
    }

    #[test]
    fn test_lazy_load_indicators() {
        let d = detect_html(r#"<div data-infinite-scroll></div>"#);
        assert_eq!(d.kind, PaginationKind::InfiniteScroll);

        let d = detect_html(r#"<script>window.lazyLoad = true;</script>"#);
        assert_eq!(d.kind, PaginationKind::InfiniteScroll);

        assert_eq!(detect_html("<p>plain</p>").kind, PaginationKind::None);
    }
}
