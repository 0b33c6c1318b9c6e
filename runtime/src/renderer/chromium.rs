// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-based renderer using chromiumoxide.

use super::scripts::{click_script, count_script, scroll_script};
use super::stealth::{launch_args, STEALTH_SCRIPT};
use super::{ClickTarget, NavigationResult, RenderContext, Renderer, Scroll, WaitUntil};
use crate::config::BrowserSettings;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Quiet window used to approximate "network idle".
const IDLE_WINDOW_MS: u64 = 500;

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. Configured path (file, TRAWL_CHROMIUM_PATH, or --chromium)
    if let Some(p) = explicit {
        if p.exists() {
            return Some(p.to_path_buf());
        }
    }

    // 2. ~/.trawl/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".trawl/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".trawl/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".trawl/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".trawl/chromium/chrome-linux64/chrome"),
                home.join(".trawl/chromium/chrome"),
            ]
        };
        if let Some(c) = candidates.into_iter().find(|c| c.exists()) {
            return Some(c);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
    settings: BrowserSettings,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a Chromium instance with the given settings.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let chrome_path = find_chromium(settings.chromium_path.as_deref())
            .context("Chromium not found. Set TRAWL_CHROMIUM_PATH or install Chrome.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(settings.viewport_width, settings.viewport_height)
            .viewport(Viewport {
                width: settings.viewport_width,
                height: settings.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        builder = if settings.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        if settings.stealth {
            for arg in launch_args() {
                builder = builder.arg(arg);
            }
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            settings: settings.clone(),
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        page.set_user_agent(SetUserAgentOverrideParams::new(
            self.settings.user_agent.clone(),
        ))
        .await
        .context("failed to set user agent")?;

        if self.settings.stealth {
            page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                STEALTH_SCRIPT,
            ))
            .await
            .context("failed to install stealth script")?;
        }

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        // Browser is dropped when ChromiumRenderer is dropped
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumContext {
    async fn ready_state(&self) -> String {
        self.execute_js("document.readyState")
            .await
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    async fn resource_count(&self) -> u64 {
        self.execute_js("performance.getEntriesByType('resource').length")
            .await
            .ok()
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    /// Start a navigation, then poll until `wait` is satisfied.
    async fn navigate_inner(&self, url: &str, wait: WaitUntil) -> Result<()> {
        let response = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .context("navigation failed")?;
        if let Some(err) = response.result.error_text.as_deref() {
            bail!("navigation failed: {err}");
        }

        let target = match wait {
            WaitUntil::DomContentLoaded => ["interactive", "complete"].as_slice(),
            WaitUntil::Load | WaitUntil::NetworkIdle => ["complete"].as_slice(),
        };
        while !target.contains(&self.ready_state().await.as_str()) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        if wait == WaitUntil::NetworkIdle {
            let mut last = self.resource_count().await;
            loop {
                tokio::time::sleep(Duration::from_millis(IDLE_WINDOW_MS)).await;
                let now = self.resource_count().await;
                if now == last {
                    break;
                }
                last = now;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(
        &mut self,
        url: &str,
        wait: WaitUntil,
        timeout_ms: u64,
    ) -> Result<NavigationResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.navigate_inner(url, wait),
        )
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(())) => {
                let final_url = self.get_url().await.unwrap_or_else(|_| url.to_string());
                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn get_html(&self) -> Result<String> {
        self.page.content().await.context("failed to get HTML")
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let value = self.execute_js(&count_script(selector)).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn click(&mut self, target: &ClickTarget) -> Result<bool> {
        let value = self.execute_js(&click_script(target)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn scroll(&mut self, scroll: Scroll) -> Result<()> {
        self.execute_js(&scroll_script(scroll)).await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_chromium_ignores_missing_explicit_path() {
        let missing = Path::new("/definitely/not/a/chrome");
        if let Some(found) = find_chromium(Some(missing)) {
            assert_ne!(found, missing);
        }
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_count_click_and_html() {
        let renderer = ChromiumRenderer::launch(&BrowserSettings::default())
            .await
            .expect("failed to launch renderer");
        let mut ctx = renderer
            .new_context()
            .await
            .expect("failed to create context");

        ctx.navigate(
            "data:text/html,<ul><li>a</li><li>b</li></ul><button onclick=\"document.querySelector('ul').append(document.createElement('li'))\">Load more</button>",
            WaitUntil::DomContentLoaded,
            10_000,
        )
        .await
        .expect("navigation failed");

        assert_eq!(ctx.count("li").await.unwrap(), 2);
        let clicked = ctx
            .click(&ClickTarget::Selector("button".into()))
            .await
            .unwrap();
        assert!(clicked);
        assert_eq!(ctx.count("li").await.unwrap(), 3);

        let webdriver = ctx.execute_js("navigator.webdriver === undefined").await.unwrap();
        assert_eq!(webdriver, serde_json::Value::Bool(true));

        let agent = ctx.execute_js("navigator.userAgent").await.unwrap();
        assert_eq!(agent, serde_json::Value::String(BrowserSettings::default().user_agent));

        let html = ctx.get_html().await.expect("get_html failed");
        assert!(html.contains("<li>a</li>"));

        ctx.close().await.expect("close failed");
        assert_eq!(renderer.active_contexts(), 0);
    }
}
