// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page-by-page orchestration of list extraction.
//!
//! Per page: extract, drop items already seen anywhere in the request, skip
//! the pending offset, append. Then stop on the first of: limit reached,
//! min reached (only when no limit), page budget used, deadline passed,
//! advance failed.

use super::advance::{AdvanceOutcome, Paginator};
use super::resolver::PaginationPlan;
use crate::config::EngineConfig;
use crate::extraction::{ListExtractor, SeenSet};
use crate::types::{ExtractionRequest, Item};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Why the controller stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    LimitReached,
    MinReached,
    PageBudget,
    Stalled,
    Deadline,
}

/// Items collected plus a short run report.
#[derive(Debug, Clone)]
pub struct ControllerOutcome {
    pub items: Vec<Item>,
    pub pages_visited: usize,
    pub stop: StopReason,
}

/// Drop up to `*pending` leading items, decrementing the pending offset.
pub fn skip_offset(items: Vec<Item>, pending: &mut usize) -> Vec<Item> {
    if *pending == 0 {
        return items;
    }
    if items.len() <= *pending {
        *pending -= items.len();
        return Vec::new();
    }
    let rest = items.into_iter().skip(*pending).collect();
    *pending = 0;
    rest
}

/// The Pagination Controller.
pub struct Controller<'a> {
    config: &'a EngineConfig,
    request: &'a ExtractionRequest,
    plan: &'a PaginationPlan,
    deadline: Instant,
}

impl<'a> Controller<'a> {
    pub fn new(
        config: &'a EngineConfig,
        request: &'a ExtractionRequest,
        plan: &'a PaginationPlan,
        deadline: Instant,
    ) -> Self {
        Self {
            config,
            request,
            plan,
            deadline,
        }
    }

    /// Walk pages from the currently loaded one until a stop condition holds.
    pub async fn run(&self, ctx: &mut dyn crate::renderer::RenderContext) -> ControllerOutcome {
        let req = self.request;
        let list_selector = req.list_item_selector.as_deref().unwrap_or_default();
        let limit = req.effective_limit();
        let min = req.effective_min();
        let page_budget = req.effective_pages();
        let mut pending_offset = req.effective_offset();

        let extractor =
            ListExtractor::new(self.config, &req.fields, req.exclusion_filter.as_ref());
        let paginator = Paginator::new(self.plan, self.config);
        let mut global = SeenSet::new(&req.fields);
        let mut aggregate: Vec<Item> = Vec::new();
        let mut page = 1usize;
        let mut working = list_selector.to_string();

        let stop = loop {
            let target = limit.map(|l| l.saturating_sub(aggregate.len()) + pending_offset);
            let batch = extractor.extract(ctx, list_selector, target).await;
            if let Some(w) = batch.working_selector {
                working = w;
            }

            let extracted = batch.items.len();
            let fresh = global.retain_new(batch.items);
            if fresh.len() < extracted {
                debug!(page, skipped = extracted - fresh.len(), "cross-page duplicates skipped");
            }
            let before_offset = fresh.len();
            let kept = skip_offset(fresh, &mut pending_offset);
            if kept.len() < before_offset {
                debug!(page, skipped = before_offset - kept.len(), pending_offset, "offset applied");
            }
            aggregate.extend(kept);
            info!(page, matched = batch.matched, total = aggregate.len(), "page extracted");

            if limit.is_some_and(|l| aggregate.len() >= l) {
                break StopReason::LimitReached;
            }
            if limit.is_none() && min.is_some_and(|m| aggregate.len() >= m) {
                break StopReason::MinReached;
            }
            if page_budget.is_some_and(|p| page >= p) {
                break StopReason::PageBudget;
            }
            if Instant::now() >= self.deadline {
                break StopReason::Deadline;
            }

            match paginator.advance(ctx, &working).await {
                AdvanceOutcome::Stalled => break StopReason::Stalled,
                AdvanceOutcome::Advanced(_) => {
                    page += 1;
                    let wait_sel = req.wait_for_selector.as_deref().unwrap_or(&working);
                    if ctx
                        .wait_for(wait_sel, self.config.timings.selector_wait_ms)
                        .await
                        .is_err()
                    {
                        debug!(selector = wait_sel, "wait after advance timed out, continuing");
                    }
                }
            }
        };

        if let Some(l) = limit {
            aggregate.truncate(l);
        }
        info!(pages = page, items = aggregate.len(), stop = ?stop, "pagination finished");

        ControllerOutcome {
            items: aggregate,
            pages_visited: page,
            stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(range: std::ops::Range<usize>) -> Vec<Item> {
        range.map(Item::new).collect()
    }

    #[test]
    fn test_offset_spans_pages() {
        let mut pending = 7;
        assert!(skip_offset(items(0..5), &mut pending).is_empty());
        assert_eq!(pending, 2);
        let kept = skip_offset(items(0..5), &mut pending);
        assert_eq!(kept.iter().map(|i| i.index).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(pending, 0);
        assert_eq!(skip_offset(items(0..2), &mut pending).len(), 2);
    }
}
