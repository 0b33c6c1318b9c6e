// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Content-hash deduplication.
//!
//! The hash of an item is the trimmed value of every requested field, in
//! request order, joined with `|` and lowercased. Missing values contribute
//! an empty string, so an item with no values hashes to separators only and
//! is always dropped.

use crate::types::{Field, Item};
use std::collections::HashSet;

const SEPARATOR: &str = "|";

/// Normalized content hash of an item over `field_names`.
pub fn content_hash(item: &Item, field_names: &[String]) -> String {
    field_names
        .iter()
        .map(|n| item.get(n).unwrap_or("").trim())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
        .to_lowercase()
}

/// The hash of an item whose every field is empty.
pub fn degenerate_hash(field_count: usize) -> String {
    SEPARATOR.repeat(field_count.saturating_sub(1))
}

/// Set of hashes already admitted, scoped to a page or a whole request.
#[derive(Debug, Clone)]
pub struct SeenSet {
    field_names: Vec<String>,
    degenerate: String,
    seen: HashSet<String>,
}

impl SeenSet {
    pub fn new(fields: &[Field]) -> Self {
        Self {
            field_names: fields.iter().map(|f| f.name.clone()).collect(),
            degenerate: degenerate_hash(fields.len()),
            seen: HashSet::new(),
        }
    }

    /// Record an item. Returns `false` for repeats and empty items.
    pub fn admit(&mut self, item: &Item) -> bool {
        let hash = content_hash(item, &self.field_names);
        if hash == self.degenerate {
            return false;
        }
        self.seen.insert(hash)
    }

    /// Keep the items not seen before, in order.
    pub fn retain_new(&mut self, items: Vec<Item>) -> Vec<Item> {
        items.into_iter().filter(|i| self.admit(i)).collect()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(i: usize, title: Option<&str>, price: Option<&str>) -> Item {
        let mut it = Item::new(i);
        it.values.insert("title".into(), title.map(str::to_string));
        it.values.insert("price".into(), price.map(str::to_string));
        it
    }

    fn fields() -> Vec<Field> {
        vec![Field::text("title", "h2"), Field::text("price", ".p")]
    }

    #[test]
    fn test_hash_normalizes_case_and_whitespace() {
        let names = vec!["title".to_string(), "price".to_string()];
        assert_eq!(content_hash(&item(0, Some(" Lamp "), Some("$5")), &names), "lamp|$5");
        assert_eq!(content_hash(&item(0, None, None), &names), degenerate_hash(2));
        assert_eq!(degenerate_hash(1), "");
        assert_eq!(degenerate_hash(0), "");
    }

    #[test]
    fn test_retain_new_drops_repeats_and_empties() {
        let mut seen = SeenSet::new(&fields());
        let kept = seen.retain_new(vec![
            item(0, Some("Lamp"), Some("$5")),
            item(1, Some("LAMP"), Some("$5 ")),
            item(2, None, None),
            item(3, Some("Desk"), None),
        ]);
        let idx: Vec<_> = kept.iter().map(|i| i.index).collect();
        assert_eq!(idx, vec![0, 3]);

        // Running again over the same items admits nothing.
        let again = seen.retain_new(kept.clone());
        assert!(again.is_empty());
        assert_eq!(seen.len(), 2);
    }
}
