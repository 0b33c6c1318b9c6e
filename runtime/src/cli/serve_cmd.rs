// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! `trawl serve` — run the REST API.

use crate::cli::chromium_engine;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::renderer::{NoopRenderer, Renderer};
use crate::rest;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Start the server. Without Chromium every request answers with a browser
/// error, but `/health` stays up.
pub async fn run(host: &str, port: u16, config: EngineConfig) -> Result<()> {
    info!("starting trawl v{}", env!("CARGO_PKG_VERSION"));

    let engine = match chromium_engine(&config).await {
        Ok(engine) => engine,
        Err(e) => {
            warn!("{e:#}");
            warn!("serving without a browser; extraction requests will fail");
            let renderer: Arc<dyn Renderer> = Arc::new(NoopRenderer);
            Engine::new(renderer, config)
        }
    };
    let engine = Arc::new(engine);

    let result = rest::serve(host, port, Arc::clone(&engine)).await;
    if let Err(e) = engine.renderer().shutdown().await {
        warn!(error = %e, "browser shutdown failed");
    }
    result
}
