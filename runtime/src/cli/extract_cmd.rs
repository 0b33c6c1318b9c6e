// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! `trawl extract <request>` — run an extraction request from a JSON file.

use crate::cli::{chromium_engine, offline_engine, output};
use crate::config::EngineConfig;
use crate::engine;
use crate::types::ExtractionRequest;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Read a request from a file, or from stdin when `source` is `-`.
pub fn read_request(source: &str) -> Result<ExtractionRequest> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {source}"))?
    };
    serde_json::from_str(&raw).context("request is not a valid extraction request")
}

/// Run the extract command.
pub async fn run(source: &str, html: Option<&Path>, config: EngineConfig) -> Result<()> {
    let request = read_request(source)?;
    // Reject before launching anything.
    engine::validate(&request)?;

    let engine = match html {
        Some(path) => offline_engine(&request.url, path, &config)?,
        None => chromium_engine(&config).await?,
    };
    let result = engine.extract(request).await;
    let _ = engine.renderer().shutdown().await;
    output::print_json(&result?.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_request_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"url":"https://a.example","mode":"single","fields":[{{"name":"t","selector":"h1","type":"text"}}]}}"#
        )
        .unwrap();
        let req = read_request(f.path().to_str().unwrap()).unwrap();
        assert_eq!(req.fields.len(), 1);
        assert!(engine::validate(&req).is_ok());
    }

    #[test]
    fn test_read_request_rejects_garbage() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        assert!(read_request(f.path().to_str().unwrap()).is_err());
    }
}
