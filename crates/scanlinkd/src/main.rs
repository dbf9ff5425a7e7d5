//! scanlinkd - Scanner-Control Daemon
//!
//! Serves the scanlink JSON-over-WebSocket protocol for local scanner
//! front-ends.
//!
//! Usage:
//!   scanlinkd [config.toml]
//!
//! With no config file the daemon binds 127.0.0.1:8765 and drives the
//! built-in demo scanner backend.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use scanlinkd::{create_router, AppState, DaemonConfig, DemoScanner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parsed command-line arguments
struct Args {
    /// Daemon config file (TOML)
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args { config_path: None };

    for arg in &args {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                result.config_path = Some(arg.to_string());
            }
            _ => {
                tracing::warn!("Unknown argument: {}", arg);
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"scanlinkd - Scanner-Control Daemon

Usage: scanlinkd [config.toml]

Options:
  -h, --help  Print this help message

Examples:
  # Run with defaults (127.0.0.1:8765, demo backend)
  scanlinkd

  # Run with a config file
  scanlinkd scanlinkd.toml
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scanlinkd=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting scanlinkd (Scanner-Control Daemon)");

    let args = parse_args();
    let config = if let Some(ref path) = args.config_path {
        tracing::info!("Loading config from: {}", path);
        DaemonConfig::load(Path::new(path))?
    } else {
        tracing::info!("No config file provided, using defaults");
        DaemonConfig::default()
    };

    let backend = Arc::new(DemoScanner::new(Duration::from_millis(
        config.demo.scan_latency_ms,
    )));
    let state = AppState::new(backend, config.clone());

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    tracing::info!("Listening on ws://{}/ws/{{client_id}}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
