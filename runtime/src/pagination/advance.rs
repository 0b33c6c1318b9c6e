// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page advance handlers.
//!
//! One advance runs the plan's pipeline left to right. Each handler reports
//! whether the list visibly changed; the first success ends the advance and
//! a handler that fails hands over to the next one. Nothing loops back.

use super::resolver::{PaginationPlan, Strategy};
use super::{wait_for_change, ChangeRule, ListSnapshot};
use crate::config::EngineConfig;
use crate::discovery::pagination::{
    CURRENT_PAGE_SELECTORS, LOAD_MORE_PHRASES, LOAD_MORE_TEXT_SCOPE,
};
use crate::extraction::list::load_more_by_text;
use crate::renderer::{pause, ClickTarget, PhraseMatch, RenderContext, Scroll};
use crate::selectors::{self, element_text};
use scraper::Html;
use tracing::{debug, info, warn};

/// Next controls tried when no next selector is known.
pub const DEFAULT_NEXT_SELECTORS: &[&str] = &[
    r#"a[rel="next"]:not([disabled])"#,
    r#"link[rel="next"]"#,
    r#"a[aria-label*="next" i]:not([disabled])"#,
    r#"button[aria-label*="next" i]:not([disabled])"#,
    "a.next:not([disabled])",
    "button.next:not([disabled])",
];

/// Result of one advance attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The list changed; the handler that achieved it.
    Advanced(Strategy),
    /// Every handler in the pipeline failed.
    Stalled,
}

/// Current page number read from a snapshot, 1 when unknown.
pub fn current_page(html: &str, selector: Option<&str>) -> u32 {
    let doc = Html::parse_document(html);
    let chain = selector
        .map(str::to_string)
        .unwrap_or_else(|| CURRENT_PAGE_SELECTORS.join(", "));
    selectors::parse(&chain)
        .and_then(|sel| doc.select(&sel).next())
        .and_then(|el| element_text(&el).parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// Runs a [`PaginationPlan`] against a live page.
pub struct Paginator<'a> {
    plan: &'a PaginationPlan,
    config: &'a EngineConfig,
}

impl<'a> Paginator<'a> {
    pub fn new(plan: &'a PaginationPlan, config: &'a EngineConfig) -> Self {
        Self { plan, config }
    }

    /// Try to reach the next batch of results.
    pub async fn advance(&self, ctx: &mut dyn RenderContext, list_selector: &str) -> AdvanceOutcome {
        let Some(before) = ListSnapshot::take(&*ctx, list_selector).await else {
            warn!("page snapshot failed before advancing");
            return AdvanceOutcome::Stalled;
        };
        for step in self.plan.pipeline() {
            let moved = match step {
                Strategy::LoadMore => self.load_more(ctx, list_selector, &before).await,
                Strategy::Traditional => self.traditional(ctx, list_selector, &before).await,
                Strategy::InfiniteScroll => self.infinite_scroll(ctx, list_selector, &before).await,
                Strategy::None => false,
            };
            if moved {
                info!(strategy = ?step, "advanced to next page");
                return AdvanceOutcome::Advanced(step);
            }
            debug!(strategy = ?step, "strategy did not change the page");
        }
        AdvanceOutcome::Stalled
    }

    async fn changed(
        &self,
        ctx: &dyn RenderContext,
        list_selector: &str,
        before: &ListSnapshot,
        rule: ChangeRule,
    ) -> bool {
        let t = &self.config.timings;
        wait_for_change(ctx, list_selector, before, rule, t.content_change_ms, t.change_poll_ms).await
    }

    async fn load_more(
        &self,
        ctx: &mut dyn RenderContext,
        list_selector: &str,
        before: &ListSnapshot,
    ) -> bool {
        let target = match &self.plan.load_more_selector {
            Some(sel) => ClickTarget::Selector(sel.clone()),
            None => ClickTarget::Text {
                scope: LOAD_MORE_TEXT_SCOPE.to_string(),
                phrases: LOAD_MORE_PHRASES.iter().map(|p| p.to_string()).collect(),
                matching: PhraseMatch::Contains,
            },
        };
        if !ctx.click(&target).await.unwrap_or(false) {
            return false;
        }
        pause(self.config.timings.post_click_ms).await;
        self.changed(&*ctx, list_selector, before, ChangeRule::Any).await
    }

    async fn traditional(
        &self,
        ctx: &mut dyn RenderContext,
        list_selector: &str,
        before: &ListSnapshot,
    ) -> bool {
        if !self.plan.page_number_selectors.is_empty() {
            let html = ctx.get_html().await.unwrap_or_default();
            let next = current_page(&html, self.plan.current_page_selector.as_deref()) + 1;
            for selector in &self.plan.page_number_selectors {
                let target = ClickTarget::PageNumber {
                    selector: selector.clone(),
                    number: next,
                };
                if ctx.click(&target).await.unwrap_or(false)
                    && self.changed(&*ctx, list_selector, before, ChangeRule::Any).await
                {
                    debug!(page = next, selector = %selector, "numbered page reached");
                    return true;
                }
            }
        }

        let candidates: Vec<String> = match &self.plan.next_button_selector {
            Some(sel) => vec![sel.clone()],
            None => DEFAULT_NEXT_SELECTORS.iter().map(|s| s.to_string()).collect(),
        };
        for selector in candidates {
            if ctx
                .click(&ClickTarget::Selector(selector.clone()))
                .await
                .unwrap_or(false)
                && self.changed(&*ctx, list_selector, before, ChangeRule::Any).await
            {
                debug!(selector = %selector, "next control followed");
                return true;
            }
        }
        false
    }

    async fn infinite_scroll(
        &self,
        ctx: &mut dyn RenderContext,
        list_selector: &str,
        before: &ListSnapshot,
    ) -> bool {
        let t = &self.config.timings;
        let _ = ctx
            .scroll(Scroll::ToBottom {
                step_px: t.scroll_step_px,
                tick_ms: t.scroll_tick_ms,
            })
            .await;
        if ctx.click(&load_more_by_text()).await.unwrap_or(false) {
            pause(t.post_click_ms).await;
        }
        self.changed(&*ctx, list_selector, before, ChangeRule::Growth).await
    }
}
