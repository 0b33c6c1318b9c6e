// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ordered, deduplicating collection of suggestions for one discovery run.

use crate::types::{FieldKind, Suggestion};
use std::collections::HashSet;

/// Suggestions in insertion order, unique by `name|selector|type|attr`.
#[derive(Debug, Default)]
pub struct SuggestionSet {
    seen: HashSet<String>,
    items: Vec<Suggestion>,
}

impl SuggestionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a suggestion unless its identity is already present or its
    /// selector is empty. Returns whether it was added.
    pub fn push(&mut self, suggestion: Suggestion) -> bool {
        if suggestion.selector.trim().is_empty() {
            return false;
        }
        if !self.seen.insert(suggestion.key()) {
            return false;
        }
        self.items.push(suggestion);
        true
    }

    /// Shorthand for a text suggestion.
    pub fn text(&mut self, name: &str, selector: &str, confidence: f32, source: &str) -> bool {
        self.push(Suggestion {
            name: name.to_string(),
            selector: selector.to_string(),
            kind: FieldKind::Text,
            attr: None,
            confidence,
            source: source.to_string(),
        })
    }

    /// Shorthand for an attribute suggestion.
    pub fn attr(
        &mut self,
        name: &str,
        selector: &str,
        attr: &str,
        confidence: f32,
        source: &str,
    ) -> bool {
        self.push(Suggestion {
            name: name.to_string(),
            selector: selector.to_string(),
            kind: FieldKind::Attr,
            attr: Some(attr.to_string()),
            confidence,
            source: source.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Suggestion> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_by_identity_keeps_first() {
        let mut set = SuggestionSet::new();
        assert!(set.text("name", "[data-testid=\"title\"]", 0.85, "data-testid"));
        assert!(!set.text("name", "[data-testid=\"title\"]", 0.9, "heuristic"));
        // Same selector under another type is a different identity.
        assert!(set.attr("name", "[data-testid=\"title\"]", "title", 0.5, "x"));
        assert!(!set.text("empty", "  ", 0.1, "x"));

        let v = set.into_vec();
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].confidence, 0.85);
    }
}
