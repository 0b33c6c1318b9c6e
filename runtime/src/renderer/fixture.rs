// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory renderer serving canned pages.
//!
//! A [`FixtureSite`] maps URLs to HTML. Pages can grow when scrolled or
//! clicked: queued chunks are inserted before a `<!--more-->` marker (or
//! appended when the page has none). Clicking an element whose `href`
//! resolves to another page of the site navigates there.
//!
//! Used for offline extraction from saved HTML and for exercising the
//! engine without a browser.

use super::{ClickTarget, NavigationResult, RenderContext, Renderer, Scroll, WaitUntil};
use crate::selectors::{self, is_disabled, normalized_text};
use anyhow::{bail, Result};
use async_trait::async_trait;
use scraper::Html;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// Marker before which grown content is inserted.
pub const MORE_MARKER: &str = "<!--more-->";

/// One canned page.
#[derive(Debug, Clone, Default)]
pub struct FixturePage {
    pub html: String,
    /// Chunks revealed, one per scroll to the bottom.
    pub on_scroll: VecDeque<String>,
    /// Chunks revealed, one per click that does not navigate.
    pub on_click: VecDeque<String>,
}

/// A set of canned pages addressed by URL.
#[derive(Debug, Clone, Default)]
pub struct FixtureSite {
    pages: HashMap<String, FixturePage>,
    failures: HashMap<String, usize>,
}

/// URL without fragment, in canonical form.
fn page_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut u) => {
            u.set_fragment(None);
            u.to_string()
        }
        Err(_) => url.to_string(),
    }
}

impl FixtureSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a page.
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(
            page_key(url),
            FixturePage {
                html: html.to_string(),
                ..Default::default()
            },
        );
        self
    }

    /// Queue a chunk revealed by scrolling `url` to the bottom.
    pub fn on_scroll(mut self, url: &str, chunk: &str) -> Self {
        self.pages
            .entry(page_key(url))
            .or_default()
            .on_scroll
            .push_back(chunk.to_string());
        self
    }

    /// Queue a chunk revealed by a click on `url`.
    pub fn on_click(mut self, url: &str, chunk: &str) -> Self {
        self.pages
            .entry(page_key(url))
            .or_default()
            .on_click
            .push_back(chunk.to_string());
        self
    }

    /// Make the next `times` navigations to `url` fail.
    pub fn fail_navigation(mut self, url: &str, times: usize) -> Self {
        self.failures.insert(page_key(url), times);
        self
    }

    fn get(&self, url: &str) -> Option<&FixturePage> {
        self.pages.get(&page_key(url))
    }
}

/// Renderer serving a [`FixtureSite`].
pub struct FixtureRenderer {
    site: Arc<FixtureSite>,
    failures: Arc<Mutex<HashMap<String, usize>>>,
    navigations: Arc<Mutex<Vec<String>>>,
    active_count: Arc<AtomicUsize>,
}

impl FixtureRenderer {
    pub fn new(site: FixtureSite) -> Self {
        let failures = site.failures.clone();
        Self {
            site: Arc::new(site),
            failures: Arc::new(Mutex::new(failures)),
            navigations: Arc::new(Mutex::new(Vec::new())),
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every URL navigated to so far, across all contexts, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Renderer for FixtureRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        self.active_count.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(FixtureContext {
            site: Arc::clone(&self.site),
            failures: Arc::clone(&self.failures),
            navigations: Arc::clone(&self.navigations),
            active_count: Arc::clone(&self.active_count),
            url: None,
            page: FixturePage::default(),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A page context over a [`FixtureSite`]. Holds its own copy of the page so
/// grown content is local to the context.
pub struct FixtureContext {
    site: Arc<FixtureSite>,
    failures: Arc<Mutex<HashMap<String, usize>>>,
    navigations: Arc<Mutex<Vec<String>>>,
    active_count: Arc<AtomicUsize>,
    url: Option<String>,
    page: FixturePage,
}

impl FixtureContext {
    fn load(&mut self, url: &str) -> Result<()> {
        let key = page_key(url);
        if let Ok(mut log) = self.navigations.lock() {
            log.push(key.clone());
        }
        if let Ok(mut failures) = self.failures.lock() {
            if let Some(left) = failures.get_mut(&key) {
                if *left > 0 {
                    *left -= 1;
                    bail!("net::ERR_CONNECTION_RESET at {key}");
                }
            }
        }
        let Some(page) = self.site.get(&key) else {
            bail!("net::ERR_NAME_NOT_RESOLVED at {key}");
        };
        self.page = page.clone();
        self.url = Some(key);
        Ok(())
    }

    fn reveal(&mut self, chunk: String) {
        match self.page.html.find(MORE_MARKER) {
            Some(pos) => self.page.html.insert_str(pos, &chunk),
            None => self.page.html.push_str(&chunk),
        }
    }

    /// Resolve a click target to `(href, enabled)` of the element it hits.
    fn locate(&self, target: &ClickTarget) -> Option<(Option<String>, bool)> {
        let doc = Html::parse_document(&self.page.html);
        let hit = match target {
            ClickTarget::Selector(sel) => {
                let sel = selectors::parse(sel)?;
                doc.select(&sel).next()
            }
            ClickTarget::Text {
                scope,
                phrases,
                matching,
            } => {
                let sel = selectors::parse(scope)?;
                doc.select(&sel).find(|el| {
                    let text = normalized_text(el);
                    phrases
                        .iter()
                        .any(|p| matching.matches(&text, &p.to_lowercase()))
                })
            }
            ClickTarget::PageNumber { selector, number } => {
                let sel = selectors::parse(selector)?;
                let wanted = number.to_string();
                doc.select(&sel)
                    .find(|el| selectors::element_text(el) == wanted)
            }
        }?;
        let href = hit.value().attr("href").map(str::to_string);
        Some((href, !is_disabled(&hit)))
    }
}

#[async_trait]
impl RenderContext for FixtureContext {
    async fn navigate(
        &mut self,
        url: &str,
        _wait: WaitUntil,
        _timeout_ms: u64,
    ) -> Result<NavigationResult> {
        self.load(url)?;
        Ok(NavigationResult {
            final_url: self.url.clone().unwrap_or_default(),
            load_time_ms: 0,
        })
    }

    async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn get_html(&self) -> Result<String> {
        Ok(self.page.html.clone())
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.url.clone().unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let doc = Html::parse_document(&self.page.html);
        Ok(selectors::count(&doc, selector))
    }

    async fn click(&mut self, target: &ClickTarget) -> Result<bool> {
        let Some((href, enabled)) = self.locate(target) else {
            return Ok(false);
        };
        if !enabled {
            return Ok(false);
        }

        let current = self.url.clone().unwrap_or_default();
        let destination = href.and_then(|h| {
            let base = Url::parse(&current).ok()?;
            let joined = page_key(base.join(&h).ok()?.as_str());
            (joined != current && self.site.get(&joined).is_some()).then_some(joined)
        });

        match destination {
            Some(next) => self.load(&next)?,
            None => {
                if let Some(chunk) = self.page.on_click.pop_front() {
                    self.reveal(chunk);
                }
            }
        }
        Ok(true)
    }

    async fn scroll(&mut self, scroll: Scroll) -> Result<()> {
        if matches!(scroll, Scroll::ToBottom { .. } | Scroll::ToEnd) {
            if let Some(chunk) = self.page.on_scroll.pop_front() {
                self.reveal(chunk);
            }
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::PhraseMatch;

    const BASE: &str = "https://shop.example/list";

    fn site() -> FixtureSite {
        FixtureSite::new()
            .page(
                BASE,
                r#"<ul><li>a</li><!--more--></ul>
                   <button class="more">Load more</button>
                   <a class="next" href="/list?page=2">Next</a>
                   <button class="off" disabled>Off</button>"#,
            )
            .page("https://shop.example/list?page=2", "<ul><li>c</li></ul>")
            .on_click(BASE, "<li>b</li>")
            .on_scroll(BASE, "<li>s</li>")
    }

    #[tokio::test]
    async fn test_click_reveals_chunk_then_stops_growing() {
        let r = FixtureRenderer::new(site());
        let mut ctx = r.new_context().await.unwrap();
        ctx.navigate(BASE, WaitUntil::NetworkIdle, 1000).await.unwrap();
        assert_eq!(ctx.count("li").await.unwrap(), 1);

        let target = ClickTarget::Text {
            scope: "button".into(),
            phrases: vec!["load more".into()],
            matching: PhraseMatch::Contains,
        };
        assert!(ctx.click(&target).await.unwrap());
        assert_eq!(ctx.count("li").await.unwrap(), 2);
        assert!(ctx.click(&target).await.unwrap());
        assert_eq!(ctx.count("li").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_link_click_navigates_and_disabled_refuses() {
        let r = FixtureRenderer::new(site());
        let mut ctx = r.new_context().await.unwrap();
        ctx.navigate(BASE, WaitUntil::Load, 1000).await.unwrap();

        assert!(!ctx.click(&ClickTarget::Selector(".off".into())).await.unwrap());
        assert!(!ctx.click(&ClickTarget::Selector(".absent".into())).await.unwrap());

        assert!(ctx.click(&ClickTarget::Selector("a.next".into())).await.unwrap());
        assert_eq!(ctx.get_url().await.unwrap(), "https://shop.example/list?page=2");
        assert!(ctx.get_html().await.unwrap().contains("<li>c</li>"));
    }

    #[tokio::test]
    async fn test_scroll_and_failures() {
        let r = FixtureRenderer::new(site().fail_navigation(BASE, 1));
        let mut ctx = r.new_context().await.unwrap();
        assert!(ctx.navigate(BASE, WaitUntil::NetworkIdle, 1000).await.is_err());
        ctx.navigate(BASE, WaitUntil::DomContentLoaded, 1000).await.unwrap();

        ctx.scroll(Scroll::By(-400)).await.unwrap();
        assert_eq!(ctx.count("li").await.unwrap(), 1);
        ctx.scroll(Scroll::ToEnd).await.unwrap();
        assert_eq!(ctx.count("li").await.unwrap(), 2);

        assert_eq!(r.active_contexts(), 1);
        ctx.close().await.unwrap();
        assert_eq!(r.active_contexts(), 0);
        assert_eq!(r.navigations().len(), 2);
    }
}
