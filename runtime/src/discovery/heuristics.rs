// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Field and list-container heuristics.
//!
//! Each pass reads the parsed document and appends to a [`SuggestionSet`].
//! Confidence reflects how explicit the signal is: test identifiers and meta
//! tags carry intent, bare tag names do not.

use super::accumulator::SuggestionSet;
use crate::selectors::{self, element_text, first_match_in};
use scraper::{ElementRef, Html};
use std::collections::HashMap;

/// Attributes treated as generic test identifiers.
pub const TEST_ID_ATTRS: &[&str] = &["data-testid", "data-test", "data-qa"];

/// Structural class names tried when no identifier repeats.
pub const CLASS_CANDIDATES: &[&str] = &[
    ".card",
    ".item",
    ".result",
    ".listing",
    ".product",
    ".property-card",
    ".product-card",
    ".search-result",
];

/// Minimum repetitions for a list container on the first pass.
pub const STRICT_THRESHOLD: usize = 5;

/// Minimum repetitions on the relaxed second pass.
pub const RELAXED_THRESHOLD: usize = 3;

/// Number of container elements inspected when validating or probing.
const SAMPLE_SIZE: usize = 3;

// ── Single-page signals ──────────────────────────────────────────────────────

/// Headings, meta tags, canonical link, and first image.
pub fn single_signals(doc: &Html, set: &mut SuggestionSet) {
    let first = |sel: &str| selectors::parse(sel).and_then(|s| doc.select(&s).next());
    let has_attr = |sel: &str, attr: &str| {
        first(sel)
            .and_then(|el| el.value().attr(attr))
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    };

    if first("h1").map(|el| !element_text(&el).is_empty()).unwrap_or(false) {
        set.text("title", "h1", 0.6, "h1");
    }
    if first("h2").map(|el| !element_text(&el).is_empty()).unwrap_or(false) {
        set.text("subtitle", "h2", 0.4, "h2");
    }
    if has_attr(r#"meta[property="og:title"]"#, "content") {
        set.attr("og_title", r#"meta[property="og:title"]"#, "content", 0.7, "meta");
    }
    if has_attr(r#"meta[name="description"]"#, "content") {
        set.attr("description", r#"meta[name="description"]"#, "content", 0.6, "meta");
    }
    if has_attr(r#"link[rel="canonical"]"#, "href") {
        set.attr("canonical", r#"link[rel="canonical"]"#, "href", 0.8, "link");
    }
    if has_attr("img", "src") {
        set.attr("image", "img", "src", 0.3, "img");
    }
}

// ── Test-identifier hints ────────────────────────────────────────────────────

/// How often one identifier value occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCount {
    pub attr: &'static str,
    pub value: String,
    pub count: usize,
}

impl IdentifierCount {
    pub fn selector(&self) -> String {
        format!(r#"[{}="{}"]"#, self.attr, self.value)
    }
}

/// Values that can be embedded in a quoted attribute selector as-is.
fn quotable(value: &str) -> bool {
    !value.is_empty() && !value.contains(['"', '\\', '\n'])
}

/// Classify every test-identifier value and count its occurrences.
///
/// Counts come back in first-appearance order.
pub fn identifier_hints(doc: &Html, set: &mut SuggestionSet) -> Vec<IdentifierCount> {
    let mut counts: Vec<IdentifierCount> = Vec::new();
    let mut index: HashMap<(&'static str, String), usize> = HashMap::new();

    let scope = TEST_ID_ATTRS
        .iter()
        .map(|a| format!("[{a}]"))
        .collect::<Vec<_>>()
        .join(", ");
    let Some(sel) = selectors::parse(&scope) else {
        return counts;
    };

    for el in doc.select(&sel) {
        for &attr in TEST_ID_ATTRS {
            let Some(value) = el.value().attr(attr) else {
                continue;
            };
            if !quotable(value) {
                continue;
            }
            let key = (attr, value.to_string());
            match index.get(&key) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(key, counts.len());
                    counts.push(IdentifierCount {
                        attr,
                        value: value.to_string(),
                        count: 1,
                    });
                }
            }
            classify_identifier(attr, value, set);
        }
    }
    counts
}

fn classify_identifier(attr: &'static str, value: &str, set: &mut SuggestionSet) {
    let lower = value.to_lowercase();
    let source = attr;

    if lower.contains("title") || lower.contains("name") {
        set.text("name", &format!(r#"[{attr}="{value}"]"#), 0.85, source);
    }
    if lower.contains("price") {
        set.text("price", &format!(r#"[{attr}*="price"]"#), 0.8, source);
    }
    if lower.contains("review") || lower.contains("rating") || lower.contains("score") {
        set.text(
            "rating",
            &format!(r#"[{attr}*="review"], [{attr}*="rating"], [{attr}*="score"]"#),
            0.6,
            source,
        );
    }
    if lower.contains("link") || lower.contains("url") {
        set.attr("link", &format!(r#"[{attr}*="link"]"#), "href", 0.8, source);
    }
}

// ── List-container detection ─────────────────────────────────────────────────

fn samples<'a>(doc: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    selectors::parse(selector)
        .map(|s| doc.select(&s).take(SAMPLE_SIZE).collect())
        .unwrap_or_default()
}

/// Whether sample containers hold something that looks like a title or link.
fn looks_like_record(doc: &Html, candidate: &IdentifierCount) -> bool {
    let title = format!(r#"[{}*="title"]"#, candidate.attr);
    let name = format!(r#"[{}*="name"]"#, candidate.attr);
    let probes = [title.as_str(), name.as_str(), "a"];
    samples(doc, &candidate.selector())
        .into_iter()
        .any(|el| first_match_in(el, &probes).is_some())
}

/// One detection pass at a given repetition threshold.
pub fn detect_list(doc: &Html, counts: &[IdentifierCount], threshold: usize) -> Option<String> {
    let mut repeated: Vec<&IdentifierCount> =
        counts.iter().filter(|c| c.count >= threshold).collect();
    // Stable: ties keep first-appearance order.
    repeated.sort_by(|a, b| b.count.cmp(&a.count));

    if let Some(hit) = repeated.into_iter().find(|c| looks_like_record(doc, c)) {
        return Some(hit.selector());
    }

    selectors::first_satisfying(
        doc,
        CLASS_CANDIDATES.iter().copied(),
        selectors::Predicate::AtLeast(threshold),
    )
    .map(str::to_string)
}

/// Strict pass first, then the relaxed pass.
pub fn find_list_container(doc: &Html, counts: &[IdentifierCount]) -> Option<String> {
    detect_list(doc, counts, STRICT_THRESHOLD)
        .or_else(|| detect_list(doc, counts, RELAXED_THRESHOLD))
}

// ── Inner-field probes ───────────────────────────────────────────────────────

struct Probe {
    name: &'static str,
    attr: Option<&'static str>,
    /// `(selector, confidence)` in priority order.
    candidates: &'static [(&'static str, f32)],
}

const PROBES: &[Probe] = &[
    Probe {
        name: "name",
        attr: None,
        candidates: &[
            (r#"[data-testid="title"]"#, 0.9),
            (r#"[data-testid*="title"]"#, 0.9),
            (r#"[data-testid*="name"]"#, 0.9),
            ("h2", 0.85),
            ("h3", 0.85),
            (".title", 0.85),
            (".name", 0.8),
        ],
    },
    Probe {
        name: "link",
        attr: Some("href"),
        candidates: &[
            (r#"a[data-testid="title-link"]"#, 0.9),
            (r#"a[data-testid*="link"]"#, 0.9),
            ("a[href]", 0.8),
        ],
    },
    Probe {
        name: "price",
        attr: None,
        candidates: &[
            (r#"[data-testid*="price"]"#, 0.9),
            (".price", 0.85),
            (r#"[class*="price"]"#, 0.8),
        ],
    },
    Probe {
        name: "rating",
        attr: None,
        candidates: &[
            (r#"[data-testid*="review"] div"#, 0.9),
            (r#"[data-testid*="rating"]"#, 0.9),
            (".rating", 0.85),
            (r#"[class*="rating"]"#, 0.8),
        ],
    },
    Probe {
        name: "image",
        attr: Some("src"),
        candidates: &[("img[src]", 0.8)],
    },
    Probe {
        name: "supplier",
        attr: None,
        candidates: &[
            (r#"[data-testid*="supplier"]"#, 0.9),
            (".supplier", 0.85),
            (r#"[class*="supplier"]"#, 0.8),
            (r#"[class*="seller"]"#, 0.8),
            (r#"[class*="company"]"#, 0.8),
        ],
    },
    Probe {
        name: "description",
        attr: None,
        candidates: &[
            (r#"[data-testid*="description"]"#, 0.9),
            (".description", 0.85),
            ("p", 0.8),
        ],
    },
];

/// Whether `selector` yields a usable value inside `item`.
fn resolves_in(item: ElementRef<'_>, selector: &str, attr: Option<&str>) -> bool {
    let Some(sel) = selectors::parse(selector) else {
        return false;
    };
    item.select(&sel).any(|el| match attr {
        Some(a) => el.value().attr(a).map(|v| !v.trim().is_empty()).unwrap_or(false),
        None => !element_text(&el).is_empty(),
    })
}

/// Probe fixed inner candidates against sample items of the list.
///
/// For each field the first candidate that resolves in any sample wins.
pub fn inner_probes(doc: &Html, list_selector: &str, set: &mut SuggestionSet) {
    let items = samples(doc, list_selector);
    if items.is_empty() {
        return;
    }
    for probe in PROBES {
        let hit = probe
            .candidates
            .iter()
            .find(|(sel, _)| items.iter().any(|it| resolves_in(*it, sel, probe.attr)));
        if let Some((sel, confidence)) = hit {
            match probe.attr {
                Some(a) => set.attr(probe.name, sel, a, *confidence, "heuristic"),
                None => set.text(probe.name, sel, *confidence, "heuristic"),
            };
        }
    }
}
