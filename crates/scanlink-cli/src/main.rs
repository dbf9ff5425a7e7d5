//! scanlink-cli - Command-line control panel for the scanlink daemon
//!
//! Talks the JSON-over-WebSocket scanner protocol: enumerate attached
//! scanners and run acquisitions from the terminal.

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scanlink_client::{ClientConfig, ScannerClient};
use scanlink_core::ColorMode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "scanlink-cli")]
#[command(author, version, about = "Scanlink Scanner CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Daemon endpoint
    #[arg(
        short,
        long,
        env = "SCANLINK_SERVER",
        default_value = "ws://localhost:8765"
    )]
    server: String,

    /// Configuration file path
    #[arg(short, long, env = "SCANLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Per-request timeout in seconds (default: wait forever)
    #[arg(long)]
    timeout: Option<u64>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available scanners
    List,

    /// Run a scan on the given scanner
    Scan {
        /// Scanner ID (as reported by `list`)
        scanner: String,

        /// Scan resolution in DPI
        #[arg(long, default_value = "300")]
        resolution: u32,

        /// Color mode: color, grayscale, black_and_white
        #[arg(long, default_value = "color")]
        color_mode: ColorMode,

        /// Write the scanned image to this file
        #[arg(short = 'O', long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(Some(&cli.server), cli.timeout, cli.no_color);

    // Create output context
    let ctx = OutputContext::new(cli.output, merged.no_color, cli.quiet);

    let client = create_client(&merged)?;
    commands::connect(&client, &ctx).await?;

    let result = match &cli.command {
        Commands::List => commands::list(&client, &ctx).await,

        Commands::Scan {
            scanner,
            resolution,
            color_mode,
            out,
        } => commands::scan(&client, scanner, *resolution, *color_mode, out.as_deref(), &ctx).await,
    };

    client.disconnect().await;
    result
}

/// Create a scanner client for the merged configuration
fn create_client(merged: &config::MergedConfig) -> Result<ScannerClient> {
    let mut config = ClientConfig::new(&merged.server);
    config.request_timeout = merged.timeout_secs.map(Duration::from_secs);
    ScannerClient::new(config).context("Failed to create scanner client")
}
