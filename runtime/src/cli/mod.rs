// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the `trawl` binary.

pub mod discover_cmd;
pub mod doctor;
pub mod extract_cmd;
pub mod output;
pub mod serve_cmd;

use crate::config::{EngineConfig, Timings};
use crate::engine::Engine;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::fixture::{FixtureRenderer, FixtureSite};
use crate::renderer::Renderer;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// An engine over a saved page, served as if it lived at `url`.
///
/// No pauses apply: the page never changes on its own.
pub fn offline_engine(url: &str, html_path: &Path, config: &EngineConfig) -> Result<Engine> {
    let html = std::fs::read_to_string(html_path)
        .with_context(|| format!("failed to read {}", html_path.display()))?;
    let renderer: Arc<dyn Renderer> =
        Arc::new(FixtureRenderer::new(FixtureSite::new().page(url, &html)));
    let config = EngineConfig {
        timings: Timings {
            max_duration_ms: config.timings.max_duration_ms,
            ..Timings::instant()
        },
        ..config.clone()
    };
    info!(path = %html_path.display(), "serving saved page offline");
    Ok(Engine::new(renderer, config))
}

/// Launch Chromium and wrap it in an engine.
pub async fn chromium_engine(config: &EngineConfig) -> Result<Engine> {
    let renderer = ChromiumRenderer::launch(&config.browser)
        .await
        .context("failed to launch Chromium (run `trawl doctor` to diagnose)")?;
    info!("Chromium renderer initialized");
    let renderer: Arc<dyn Renderer> = Arc::new(renderer);
    Ok(Engine::new(renderer, config.clone()))
}
