// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trawl_runtime::cli;
use trawl_runtime::config::EngineConfig;

#[derive(Parser)]
#[command(
    name = "trawl",
    about = "Trawl: structured record extraction from arbitrary web pages",
    version,
    after_help = "Run 'trawl <command> --help' for details on each command."
)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// JSON configuration file
    #[arg(long, global = true, env = "TRAWL_CONFIG")]
    config: Option<PathBuf>,

    /// Chromium executable to launch
    #[arg(long, global = true)]
    chromium: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headful: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the REST API
    Serve {
        /// Interface to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,
    },
    /// Propose fields, a list selector, and pagination for a page
    Discover {
        /// Page URL
        url: String,
        /// Navigation timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Analyse a saved HTML file as if it were served at URL
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Run an extraction request (JSON file, or '-' for stdin)
    Extract {
        /// Request file
        request: String,
        /// Extract from a saved HTML file served at the request URL
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("trawl_runtime={level},trawl={level}")));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.chromium {
        config.browser.chromium_path = Some(path.clone());
    }
    if cli.headful {
        config.browser.headless = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "trawl", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(&cli.log_level, cli.log_format);
    let config = load_config(&cli)?;

    let result = match &cli.command {
        Commands::Serve { host, port } => cli::serve_cmd::run(host, *port, config).await,
        Commands::Discover {
            url,
            timeout_ms,
            html,
        } => cli::discover_cmd::run(url, *timeout_ms, html.as_deref(), config).await,
        Commands::Extract { request, html } => {
            cli::extract_cmd::run(request, html.as_deref(), config).await
        }
        Commands::Doctor => cli::doctor::run(&config).await,
        Commands::Completions { .. } => Ok(()),
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }
    result
}
