// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Engine configuration.
//!
//! Resolution order: defaults, then an optional JSON file, then `TRAWL_*`
//! environment variables. CLI flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lower bound for a caller-supplied navigation timeout.
pub const MIN_NAV_TIMEOUT_MS: u64 = 10_000;

/// Upper bound for a caller-supplied navigation timeout.
pub const MAX_NAV_TIMEOUT_MS: u64 = 120_000;

/// Every wait and pause of the engine, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub nav_timeout_ms: u64,
    /// Pause after the first load so client-side rendering can start.
    pub settle_ms: u64,
    pub consent_pause_ms: u64,
    pub selector_wait_ms: u64,
    pub alt_selector_wait_ms: u64,
    /// Extra pause when no list selector appeared at all.
    pub missing_selector_pause_ms: u64,
    /// How long one lazy-load round waits for the item count to grow.
    pub growth_wait_ms: u64,
    pub poll_interval_ms: u64,
    pub load_more_pause_ms: u64,
    pub nudge_up_pause_ms: u64,
    pub nudge_down_pause_ms: u64,
    pub after_lazy_load_ms: u64,
    /// Pause after a pagination click before polling for changes.
    pub post_click_ms: u64,
    /// How long a pagination action may take to change the list.
    pub content_change_ms: u64,
    pub change_poll_ms: u64,
    pub scroll_step_px: u32,
    pub scroll_tick_ms: u64,
    /// Coarse ceiling on a whole request; checked between pages and items.
    pub max_duration_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            nav_timeout_ms: 60_000,
            settle_ms: 2_000,
            consent_pause_ms: 1_000,
            selector_wait_ms: 15_000,
            alt_selector_wait_ms: 5_000,
            missing_selector_pause_ms: 3_000,
            growth_wait_ms: 10_000,
            poll_interval_ms: 400,
            load_more_pause_ms: 1_500,
            nudge_up_pause_ms: 600,
            nudge_down_pause_ms: 1_000,
            after_lazy_load_ms: 300,
            post_click_ms: 2_000,
            content_change_ms: 10_000,
            change_poll_ms: 500,
            scroll_step_px: 600,
            scroll_tick_ms: 120,
            max_duration_ms: 120_000,
        }
    }
}

impl Timings {
    /// No pauses at all. Used against in-memory pages.
    pub fn instant() -> Self {
        Self {
            nav_timeout_ms: MIN_NAV_TIMEOUT_MS,
            settle_ms: 0,
            consent_pause_ms: 0,
            selector_wait_ms: 0,
            alt_selector_wait_ms: 0,
            missing_selector_pause_ms: 0,
            growth_wait_ms: 0,
            poll_interval_ms: 0,
            load_more_pause_ms: 0,
            nudge_up_pause_ms: 0,
            nudge_down_pause_ms: 0,
            after_lazy_load_ms: 0,
            post_click_ms: 0,
            content_change_ms: 0,
            change_poll_ms: 0,
            scroll_step_px: 600,
            scroll_tick_ms: 0,
            max_duration_ms: 60_000,
        }
    }

    /// Navigation timeout for a request, clamped to the allowed range.
    pub fn nav_timeout(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.nav_timeout_ms)
            .clamp(MIN_NAV_TIMEOUT_MS, MAX_NAV_TIMEOUT_MS)
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub chromium_path: Option<PathBuf>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    /// Apply the fingerprint-smoothing script to every page.
    pub stealth: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            viewport_width: 1366,
            viewport_height: 1000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            stealth: true,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub timings: Timings,
    /// Consecutive lazy-load rounds without growth before giving up.
    pub stagnation_limit: u32,
    pub browser: BrowserSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            stagnation_limit: 5,
            browser: BrowserSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration with no pauses, for in-memory pages.
    pub fn instant() -> Self {
        Self {
            timings: Timings::instant(),
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Resolve configuration from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os("TRAWL_CONFIG").map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `TRAWL_*` overrides from a variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let num = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(p) = lookup("TRAWL_CHROMIUM_PATH") {
            self.browser.chromium_path = Some(PathBuf::from(p));
        }
        if let Some(v) = lookup("TRAWL_HEADLESS") {
            self.browser.headless = !matches!(v.trim(), "0" | "false" | "no");
        }
        if let Some(v) = lookup("TRAWL_USER_AGENT") {
            self.browser.user_agent = v;
        }
        if let Some(ms) = num("TRAWL_NAV_TIMEOUT_MS") {
            self.timings.nav_timeout_ms = ms;
        }
        if let Some(ms) = num("TRAWL_MAX_DURATION_MS") {
            self.timings.max_duration_ms = ms;
        }
        if let Some(n) = num("TRAWL_STAGNATION_LIMIT") {
            self.stagnation_limit = n.max(1) as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let c = EngineConfig::default();
        assert_eq!(c.stagnation_limit, 5);
        assert_eq!(c.timings.growth_wait_ms, 10_000);
        assert_eq!(c.browser.viewport_width, 1366);
    }

    #[test]
    fn test_nav_timeout_clamped() {
        let t = Timings::default();
        assert_eq!(t.nav_timeout(None), 60_000);
        assert_eq!(t.nav_timeout(Some(1)), MIN_NAV_TIMEOUT_MS);
        assert_eq!(t.nav_timeout(Some(10_000_000)), MAX_NAV_TIMEOUT_MS);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"stagnation_limit": 2, "timings": {{"settle_ms": 10}}}}"#).unwrap();

        let c = EngineConfig::from_file(f.path()).unwrap();
        assert_eq!(c.stagnation_limit, 2);
        assert_eq!(c.timings.settle_ms, 10);
        assert_eq!(c.timings.poll_interval_ms, 400);
        assert!(c.browser.headless);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TRAWL_HEADLESS", "false"),
            ("TRAWL_STAGNATION_LIMIT", "0"),
            ("TRAWL_MAX_DURATION_MS", "5000"),
        ]);
        let mut c = EngineConfig::default();
        c.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert!(!c.browser.headless);
        assert_eq!(c.stagnation_limit, 1);
        assert_eq!(c.timings.max_duration_ms, 5000);
    }
}
