// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Stdout helpers. Logs go to stderr, so stdout carries only results.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// Print a value as pretty JSON followed by a newline.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
