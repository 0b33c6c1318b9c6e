// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page access abstraction.
//!
//! Defines the `Renderer` and `RenderContext` traits the engine drives. The
//! engine never assumes a specific automation engine: Chromium (via
//! chromiumoxide) is one implementation, the in-memory [`fixture`] another.
//!
//! DOM queries run against HTML snapshots (`get_html`) parsed with scraper;
//! only counting, clicking, and scrolling touch the live page.

pub mod chromium;
pub mod fixture;
pub mod scripts;
pub mod stealth;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Page lifecycle event a navigation waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    /// Load plus a quiet network window.
    NetworkIdle,
    /// The document has been parsed.
    DomContentLoaded,
    /// The `load` event fired.
    Load,
}

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// How a text-matched click compares element text to phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseMatch {
    /// Normalized text contains the phrase anywhere.
    Contains,
    /// Normalized text is the phrase or starts with it followed by a space.
    Leading,
}

impl PhraseMatch {
    /// Whether lowercased, whitespace-collapsed `text` matches `phrase`.
    pub fn matches(self, text: &str, phrase: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self {
            Self::Contains => text.contains(phrase),
            Self::Leading => {
                text == phrase
                    || text
                        .strip_prefix(phrase)
                        .map(|rest| rest.starts_with(' '))
                        .unwrap_or(false)
            }
        }
    }
}

/// Something to click on the current page.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickTarget {
    /// The first element matching a CSS selector, unless it is disabled.
    Selector(String),
    /// The first visible element within `scope` whose text matches a phrase.
    Text {
        scope: String,
        phrases: Vec<String>,
        matching: PhraseMatch,
    },
    /// The element within `selector` whose text is exactly `number`.
    PageNumber { selector: String, number: u32 },
}

/// A scroll gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    /// Scroll down in steps until the bottom of the document.
    ToBottom { step_px: u32, tick_ms: u64 },
    /// Scroll by a relative offset.
    By(i64),
    /// Jump to the current document height.
    ToEnd,
}

/// A browser engine that can create page contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new page context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently open contexts.
    fn active_contexts(&self) -> usize;
}

/// A single page context. One per request, used sequentially.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL, waiting for `wait` up to `timeout_ms`.
    async fn navigate(
        &mut self,
        url: &str,
        wait: WaitUntil,
        timeout_ms: u64,
    ) -> Result<NavigationResult>;
    /// Evaluate JavaScript in the page and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Full HTML of the current document.
    async fn get_html(&self) -> Result<String>;
    /// The current URL.
    async fn get_url(&self) -> Result<String>;
    /// Number of elements currently matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize>;
    /// Click a target. `Ok(false)` when nothing clickable was found.
    async fn click(&mut self, target: &ClickTarget) -> Result<bool>;
    /// Perform a scroll gesture.
    async fn scroll(&mut self, scroll: Scroll) -> Result<()>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;

    /// Wait until `selector` matches at least one element.
    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let start = Instant::now();
        loop {
            if self.count(selector).await.unwrap_or(0) > 0 {
                return Ok(());
            }
            if start.elapsed() >= Duration::from_millis(timeout_ms) {
                bail!("timed out after {timeout_ms}ms waiting for {selector}");
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }
}

/// A renderer used when Chromium is unavailable. Every context request fails.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("Browser not available"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        0
    }
}

/// Pause for `ms` milliseconds; zero returns immediately.
pub async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
