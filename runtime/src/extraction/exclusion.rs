// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Exclusion of items already known to the caller.

use crate::types::{ExclusionFilter, Item, MatchType};

fn normalize(v: &str) -> String {
    v.trim().to_lowercase()
}

impl MatchType {
    /// Compare normalized values. `Contains` holds in either direction.
    pub fn matches(self, value: &str, existing: &str) -> bool {
        match self {
            Self::Exact => value == existing,
            Self::Contains => value.contains(existing) || existing.contains(value),
            Self::StartsWith => value.starts_with(existing),
            Self::EndsWith => value.ends_with(existing),
        }
    }
}

impl ExclusionFilter {
    /// A filter with no field name or no existing items excludes nothing.
    pub fn is_active(&self) -> bool {
        !self.field_name.is_empty() && !self.existing_items.is_empty()
    }

    /// Normalized non-empty string values of the filtered field.
    fn existing_values(&self) -> Vec<String> {
        self.existing_items
            .iter()
            .filter_map(|rec| rec.get(&self.field_name)?.as_str().map(normalize))
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// Whether `item` matches any existing record.
    pub fn excludes(&self, item: &Item) -> bool {
        self.excluder().excludes(item)
    }

    /// Precompute the normalized existing values once.
    pub fn excluder(&self) -> Excluder<'_> {
        Excluder {
            filter: self,
            existing: self.existing_values(),
        }
    }
}

/// An exclusion filter with its existing values normalized.
pub struct Excluder<'a> {
    filter: &'a ExclusionFilter,
    existing: Vec<String>,
}

impl Excluder<'_> {
    pub fn excludes(&self, item: &Item) -> bool {
        if !self.filter.is_active() {
            return false;
        }
        let Some(value) = item.get(&self.filter.field_name).map(normalize) else {
            return false;
        };
        if value.is_empty() {
            return false;
        }
        self.existing
            .iter()
            .any(|e| self.filter.match_type.matches(&value, e))
    }
}

/// Drop excluded items, keeping order.
pub fn apply(filter: Option<&ExclusionFilter>, items: Vec<Item>) -> Vec<Item> {
    let Some(filter) = filter.filter(|f| f.is_active()) else {
        return items;
    };
    let excluder = filter.excluder();
    items.into_iter().filter(|i| !excluder.excludes(i)).collect()
}
