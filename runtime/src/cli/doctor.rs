// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Environment readiness check.

use crate::config::EngineConfig;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::process::Command;

/// Report Chromium availability, effective settings, and available memory.
pub async fn run(config: &EngineConfig) -> Result<()> {
    println!("Trawl Doctor");
    println!("============");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let chromium = find_chromium(config.browser.chromium_path.as_deref());
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome or set TRAWL_CHROMIUM_PATH."
        ),
    }
    if let Some(configured) = &config.browser.chromium_path {
        if !configured.exists() {
            println!("[!!] Configured Chromium path does not exist: {}", configured.display());
        }
    }

    match available_memory_mb() {
        Some(mb) if mb >= 512 => println!("[OK] Available memory: {mb}MB (>= 512MB required)"),
        Some(mb) => println!("[!!] Available memory: {mb}MB (< 512MB, may be insufficient)"),
        None => println!("[??] Could not determine available memory"),
    }

    let t = &config.timings;
    println!();
    println!("Headless:           {}", config.browser.headless);
    println!("Navigation timeout: {}ms", t.nav_timeout(None));
    println!("Request ceiling:    {}ms", t.max_duration_ms);
    println!("Stagnation limit:   {} rounds", config.stagnation_limit);

    println!();
    if chromium.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
        println!("  Offline extraction still works: trawl extract <request> --html <page>");
    }
    Ok(())
}

/// Available memory in MB (platform-specific).
fn available_memory_mb() -> Option<u64> {
    #[cfg(target_os = "macos")]
    {
        let output = Command::new("sysctl")
            .args(["-n", "hw.memsize"])
            .output()
            .ok()?;
        let s = String::from_utf8_lossy(&output.stdout);
        let bytes: u64 = s.trim().parse().ok()?;
        Some(bytes / 1_048_576)
    }
    #[cfg(target_os = "linux")]
    {
        let output = Command::new("free").args(["-m"]).output().ok()?;
        let s = String::from_utf8_lossy(&output.stdout);
        s.lines()
            .find(|line| line.starts_with("Mem:"))
            .and_then(|line| line.split_whitespace().nth(6))
            .and_then(|v| v.parse().ok())
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}
