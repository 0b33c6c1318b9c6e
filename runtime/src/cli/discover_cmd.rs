// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! `trawl discover <url>` — propose fields and pagination for a page.

use crate::cli::{chromium_engine, offline_engine, output};
use crate::config::EngineConfig;
use crate::types::DiscoveryRequest;
use anyhow::Result;
use std::path::Path;

/// Run discovery and print the result. With `html`, the saved page is
/// analysed instead of a live one.
pub async fn run(
    url: &str,
    timeout_ms: Option<u64>,
    html: Option<&Path>,
    config: EngineConfig,
) -> Result<()> {
    let engine = match html {
        Some(path) => offline_engine(url, path, &config)?,
        None => chromium_engine(&config).await?,
    };
    let result = engine
        .discover(DiscoveryRequest {
            url: url.to_string(),
            timeout_ms,
        })
        .await;
    let _ = engine.renderer().shutdown().await;
    output::print_json(&result?)
}
