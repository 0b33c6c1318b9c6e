// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request, record, and descriptor types shared by every component.
//!
//! Wire names follow the JSON contract of the REST surface (camelCase keys,
//! snake_case enum values), so these types deserialize straight from request
//! bodies and serialize straight into responses.

use crate::selectors::split_alternatives;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Extraction mode of a request or a discovered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Single,
    List,
    /// Only produced by discovery when no signal was found.
    Unknown,
}

/// How a field reads its value from the matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Attr,
}

/// A named extraction rule.
///
/// `selector` is a comma-separated fallback chain; alternatives are tried
/// left to right and the first one that matches wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub selector: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

impl Field {
    /// A text field.
    pub fn text(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            kind: FieldKind::Text,
            attr: None,
        }
    }

    /// An attribute field.
    pub fn attr(name: &str, selector: &str, attr: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            kind: FieldKind::Attr,
            attr: Some(attr.to_string()),
        }
    }

    /// The selector alternatives in the order they are tried.
    pub fn alternatives(&self) -> Vec<&str> {
        split_alternatives(&self.selector)
    }
}

/// A field proposed by discovery, with the heuristic that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub selector: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Tag naming the heuristic (e.g. `"h1"`, `"meta"`, `"data-testid"`).
    pub source: String,
}

impl Suggestion {
    /// The identity used to deduplicate suggestions: `name|selector|type|attr`.
    pub fn key(&self) -> String {
        let kind = match self.kind {
            FieldKind::Text => "text",
            FieldKind::Attr => "attr",
        };
        format!(
            "{}|{}|{}|{}",
            self.name,
            self.selector,
            kind,
            self.attr.as_deref().unwrap_or("")
        )
    }

    /// Adopt this suggestion as a field.
    pub fn to_field(&self) -> Field {
        Field {
            name: self.name.clone(),
            selector: self.selector.clone(),
            kind: self.kind,
            attr: self.attr.clone(),
        }
    }
}

/// One extracted record.
///
/// Serializes flat: field values next to `_index` and, after enrichment,
/// `_detailUrl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Position within the source page at extraction time.
    #[serde(rename = "_index")]
    pub index: usize,
    #[serde(
        rename = "_detailUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub detail_url: Option<String>,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<String>>,
}

impl Item {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            detail_url: None,
            values: BTreeMap::new(),
        }
    }

    /// The value of a field, `None` when absent or null.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_deref())
    }
}

/// The mechanism used to reach the next batch of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationKind {
    LoadMoreButton,
    TraditionalPagination,
    InfiniteScroll,
    None,
}

/// Pagination controls detected on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDescriptor {
    #[serde(rename = "type")]
    pub kind: PaginationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_button_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_button_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_more_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_number_selectors: Vec<String>,
    #[serde(default)]
    pub has_numbered_pages: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages_selector: Option<String>,
}

impl Default for PaginationDescriptor {
    fn default() -> Self {
        Self {
            kind: PaginationKind::None,
            next_button_selector: None,
            prev_button_selector: None,
            load_more_selector: None,
            page_number_selectors: Vec::new(),
            has_numbered_pages: false,
            current_page_selector: None,
            total_pages_selector: None,
        }
    }
}

/// A requested pagination strategy; `Auto` lets the resolver decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStrategy {
    #[default]
    Auto,
    LoadMoreButton,
    TraditionalPagination,
    InfiniteScroll,
    None,
}

/// How an exclusion filter compares values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    #[default]
    Exact,
    Contains,
    StartsWith,
    EndsWith,
}

/// Drops newly extracted items that match caller-supplied prior records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionFilter {
    pub field_name: String,
    #[serde(default)]
    pub existing_items: Vec<Map<String, Value>>,
    #[serde(default)]
    pub match_type: MatchType,
}

/// Input of the extraction operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    #[serde(default)]
    pub url: String,
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item_selector: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(default)]
    pub pagination_strategy: PaginationStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_button_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_button_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_more_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number_selectors: Option<Vec<String>>,
    #[serde(default)]
    pub deep_search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url_field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion_filter: Option<ExclusionFilter>,
}

impl ExtractionRequest {
    /// A list-mode request with every optional knob unset.
    pub fn list(url: &str, list_item_selector: &str, fields: Vec<Field>) -> Self {
        Self {
            url: url.to_string(),
            mode: Mode::List,
            list_item_selector: Some(list_item_selector.to_string()),
            fields,
            wait_for_selector: None,
            timeout_ms: None,
            limit: None,
            min: None,
            offset: None,
            pages: None,
            pagination_strategy: PaginationStrategy::Auto,
            next_button_selector: None,
            prev_button_selector: None,
            load_more_selector: None,
            page_number_selectors: None,
            deep_search: false,
            detail_url_field_name: None,
            exclusion_filter: None,
        }
    }

    /// A single-mode request.
    pub fn single(url: &str, fields: Vec<Field>) -> Self {
        Self {
            mode: Mode::Single,
            list_item_selector: None,
            ..Self::list(url, "", fields)
        }
    }

    /// Zero means "unset" for the numeric knobs.
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|n| *n > 0)
    }

    pub fn effective_min(&self) -> Option<usize> {
        self.min.filter(|n| *n > 0)
    }

    pub fn effective_pages(&self) -> Option<usize> {
        self.pages.filter(|n| *n > 0)
    }

    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// Input of the discovery operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Output of the discovery operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item_selector: Option<String>,
    pub suggestions: Vec<Suggestion>,
    pub pagination: PaginationDescriptor,
}

/// Output of the extraction operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionOutput {
    List { count: usize, data: Vec<Item> },
    Single { data: BTreeMap<String, Option<String>> },
}

impl ExtractionOutput {
    pub fn mode(&self) -> Mode {
        match self {
            Self::List { .. } => Mode::List,
            Self::Single { .. } => Mode::Single,
        }
    }

    /// JSON object form with the mode alongside the payload.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("mode".into(), serde_json::json!(self.mode()));
        match self {
            Self::List { count, data } => {
                body.insert("count".into(), Value::from(*count));
                body.insert(
                    "data".into(),
                    serde_json::to_value(data).unwrap_or_else(|_| Value::Array(Vec::new())),
                );
            }
            Self::Single { data } => {
                body.insert("data".into(), serde_json::json!(data));
            }
        }
        Value::Object(body)
    }
}
