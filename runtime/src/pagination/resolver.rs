// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pagination strategy resolution.
//!
//! `auto` prefers a load-more control, then traditional pagination (page
//! numbers or a next control), then infinite scroll. Caller-supplied
//! selectors always win over detected ones.

use crate::types::{
    ExtractionRequest, PaginationDescriptor, PaginationKind, PaginationStrategy,
};
use serde::Serialize;

/// A concrete way of reaching the next batch of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    LoadMore,
    Traditional,
    InfiniteScroll,
    None,
}

/// Fallback order within one advance.
const PIPELINE: [Strategy; 3] = [
    Strategy::LoadMore,
    Strategy::Traditional,
    Strategy::InfiniteScroll,
];

/// Selectors supplied with a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub next_button_selector: Option<String>,
    pub prev_button_selector: Option<String>,
    pub load_more_selector: Option<String>,
    pub page_number_selectors: Option<Vec<String>>,
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Overrides {
    pub fn from_request(req: &ExtractionRequest) -> Self {
        Self {
            next_button_selector: non_empty(&req.next_button_selector),
            prev_button_selector: non_empty(&req.prev_button_selector),
            load_more_selector: non_empty(&req.load_more_selector),
            page_number_selectors: req
                .page_number_selectors
                .as_ref()
                .map(|v| {
                    v.iter()
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                })
                .filter(|v| !v.is_empty()),
        }
    }
}

/// The strategy to start from plus every selector the handlers may use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationPlan {
    pub strategy: Strategy,
    pub load_more_selector: Option<String>,
    pub next_button_selector: Option<String>,
    pub prev_button_selector: Option<String>,
    pub page_number_selectors: Vec<String>,
    pub current_page_selector: Option<String>,
}

impl PaginationPlan {
    /// Handlers to try in one advance: the resolved strategy and everything
    /// after it in the fallback order. Empty for [`Strategy::None`].
    pub fn pipeline(&self) -> Vec<Strategy> {
        match PIPELINE.iter().position(|s| *s == self.strategy) {
            Some(start) => PIPELINE[start..].to_vec(),
            None => Vec::new(),
        }
    }
}

/// Resolve a requested strategy against detected controls and overrides.
pub fn resolve(
    requested: PaginationStrategy,
    detected: &PaginationDescriptor,
    overrides: &Overrides,
) -> PaginationPlan {
    let load_more_selector = overrides
        .load_more_selector
        .clone()
        .or_else(|| detected.load_more_selector.clone());
    let next_button_selector = overrides
        .next_button_selector
        .clone()
        .or_else(|| detected.next_button_selector.clone());
    let prev_button_selector = overrides
        .prev_button_selector
        .clone()
        .or_else(|| detected.prev_button_selector.clone());
    let page_number_selectors = overrides
        .page_number_selectors
        .clone()
        .unwrap_or_else(|| detected.page_number_selectors.clone());

    let strategy = match requested {
        PaginationStrategy::Auto => {
            if load_more_selector.is_some() || detected.kind == PaginationKind::LoadMoreButton {
                Strategy::LoadMore
            } else if !page_number_selectors.is_empty() || next_button_selector.is_some() {
                Strategy::Traditional
            } else {
                Strategy::InfiniteScroll
            }
        }
        PaginationStrategy::LoadMoreButton => Strategy::LoadMore,
        PaginationStrategy::TraditionalPagination => Strategy::Traditional,
        PaginationStrategy::InfiniteScroll => Strategy::InfiniteScroll,
        PaginationStrategy::None => Strategy::None,
    };

    PaginationPlan {
        strategy,
        load_more_selector,
        next_button_selector,
        prev_button_selector,
        page_number_selectors,
        current_page_selector: detected.current_page_selector.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(kind: PaginationKind) -> PaginationDescriptor {
        PaginationDescriptor {
            kind,
            ..Default::default()
        }
    }

    #[test]
    fn test_auto_priority() {
        let none = Overrides::default();

        let mut d = descriptor(PaginationKind::TraditionalPagination);
        d.next_button_selector = Some("a.next".into());
        assert_eq!(resolve(PaginationStrategy::Auto, &d, &none).strategy, Strategy::Traditional);

        d.load_more_selector = Some(".load-more".into());
        assert_eq!(resolve(PaginationStrategy::Auto, &d, &none).strategy, Strategy::LoadMore);

        let plain = descriptor(PaginationKind::None);
        assert_eq!(
            resolve(PaginationStrategy::Auto, &plain, &none).strategy,
            Strategy::InfiniteScroll
        );

        // Load-more found by text only: no selector, still load-more.
        let by_text = descriptor(PaginationKind::LoadMoreButton);
        assert_eq!(resolve(PaginationStrategy::Auto, &by_text, &none).strategy, Strategy::LoadMore);
    }

    #[test]
    fn test_overrides_beat_detection() {
        let mut d = descriptor(PaginationKind::TraditionalPagination);
        d.next_button_selector = Some(r#"a[rel="next"]"#.into());
        d.page_number_selectors = vec![".pagination a".into()];
        let o = Overrides {
            next_button_selector: Some("button.go".into()),
            page_number_selectors: Some(vec![".pages a".into()]),
            ..Default::default()
        };
        let plan = resolve(PaginationStrategy::Auto, &d, &o);
        assert_eq!(plan.next_button_selector.as_deref(), Some("button.go"));
        assert_eq!(plan.page_number_selectors, vec![".pages a".to_string()]);

        let plain = descriptor(PaginationKind::None);
        let o = Overrides {
            load_more_selector: Some("#more".into()),
            ..Default::default()
        };
        assert_eq!(resolve(PaginationStrategy::Auto, &plain, &o).strategy, Strategy::LoadMore);
    }

    #[test]
    fn test_pipeline_never_loops_back() {
        let d = descriptor(PaginationKind::None);
        let o = Overrides::default();
        let plan = resolve(PaginationStrategy::TraditionalPagination, &d, &o);
        assert_eq!(plan.pipeline(), vec![Strategy::Traditional, Strategy::InfiniteScroll]);
        let plan = resolve(PaginationStrategy::LoadMoreButton, &d, &o);
        assert_eq!(plan.pipeline().len(), 3);
        let plan = resolve(PaginationStrategy::None, &d, &o);
        assert!(plan.pipeline().is_empty());
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let mut req = crate::types::ExtractionRequest::list("https://a.example", ".x", vec![]);
        req.next_button_selector = Some("  ".into());
        req.page_number_selectors = Some(vec![" ".into()]);
        let o = Overrides::from_request(&req);
        assert_eq!(o, Overrides::default());
    }
}
