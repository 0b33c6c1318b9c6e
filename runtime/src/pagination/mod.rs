// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Multi-page traversal.
//!
//! - [`resolver`] turns a requested strategy plus detected controls into an
//!   ordered pipeline of advance handlers.
//! - [`advance`] runs that pipeline once per page advance.
//! - [`controller`] drives list extraction page by page and decides when to
//!   stop.

pub mod advance;
pub mod controller;
pub mod resolver;

use crate::renderer::{pause, RenderContext};
use crate::selectors::{self, split_alternatives};
use scraper::Html;
use std::time::{Duration, Instant};

/// Characters of the first item's text kept in a snapshot.
const FIRST_TEXT_CHARS: usize = 80;

/// Cheap fingerprint of the list state, taken around pagination actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSnapshot {
    pub href: String,
    pub count: usize,
    pub first_text: String,
}

/// What counts as "the page changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeRule {
    /// Location, item count, or first item text differs.
    Any,
    /// Item count grew.
    Growth,
}

impl ListSnapshot {
    /// Build a snapshot from HTML. The first alternative of `selector` that
    /// matches anything is used.
    pub fn from_html(href: String, html: &str, selector: &str) -> Self {
        let doc = Html::parse_document(html);
        for alt in split_alternatives(selector) {
            let Some(sel) = selectors::parse(alt) else {
                continue;
            };
            let mut matches = doc.select(&sel);
            if let Some(first) = matches.next() {
                return Self {
                    href,
                    count: 1 + matches.count(),
                    first_text: first
                        .text()
                        .collect::<String>()
                        .chars()
                        .take(FIRST_TEXT_CHARS)
                        .collect(),
                };
            }
        }
        Self {
            href,
            ..Default::default()
        }
    }

    /// Snapshot the live page. `None` when the page could not be read.
    pub async fn take(ctx: &dyn RenderContext, selector: &str) -> Option<Self> {
        let href = ctx.get_url().await.ok()?;
        let html = ctx.get_html().await.ok()?;
        Some(Self::from_html(href, &html, selector))
    }

    pub fn changed(&self, after: &Self, rule: ChangeRule) -> bool {
        match rule {
            ChangeRule::Any => {
                self.href != after.href
                    || self.count != after.count
                    || self.first_text != after.first_text
            }
            ChangeRule::Growth => after.count > self.count,
        }
    }
}

/// Poll snapshots until `rule` reports a change or `timeout_ms` elapses.
/// Always checks at least once. An unreadable page counts as unchanged.
pub async fn wait_for_change(
    ctx: &dyn RenderContext,
    selector: &str,
    before: &ListSnapshot,
    rule: ChangeRule,
    timeout_ms: u64,
    poll_ms: u64,
) -> bool {
    let start = Instant::now();
    loop {
        if let Some(after) = ListSnapshot::take(ctx, selector).await {
            if before.changed(&after, rule) {
                return true;
            }
        }
        if start.elapsed() >= Duration::from_millis(timeout_ms) {
            return false;
        }
        pause(poll_ms).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_uses_first_matching_alternative() {
        let html = format!(
            r#"<ul><li class="r">First item {}</li><li class="r">2</li></ul>"#,
            "x".repeat(100)
        );
        let s = ListSnapshot::from_html("https://a.example/".into(), &html, ".none, .r");
        assert_eq!(s.count, 2);
        assert_eq!(s.first_text.chars().count(), 80);
        assert!(s.first_text.starts_with("First item"));
    }

    #[test]
    fn test_change_rules() {
        let a = ListSnapshot {
            href: "u1".into(),
            count: 10,
            first_text: "x".into(),
        };
        let moved = ListSnapshot {
            href: "u2".into(),
            ..a.clone()
        };
        let shrunk = ListSnapshot {
            count: 5,
            ..a.clone()
        };
        assert!(a.changed(&moved, ChangeRule::Any));
        assert!(!a.changed(&moved, ChangeRule::Growth));
        assert!(a.changed(&shrunk, ChangeRule::Any));
        assert!(!a.changed(&a.clone(), ChangeRule::Any));
        let grown = ListSnapshot {
            count: 11,
            ..a.clone()
        };
        assert!(a.changed(&grown, ChangeRule::Growth));
    }
}
