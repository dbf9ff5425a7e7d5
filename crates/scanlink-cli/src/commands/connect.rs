//! Connection establishment with a retry spinner

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use scanlink_client::ScannerClient;
use std::time::Duration;

use crate::output::OutputContext;

/// Connect to the daemon, showing retry progress on the terminal.
///
/// The client retries forever at a fixed delay; Ctrl-C is the way out when
/// the daemon never shows up.
pub async fn connect(client: &ScannerClient, ctx: &OutputContext) -> Result<()> {
    let spinner = if ctx.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .context("invalid spinner template")?,
        );
        pb.set_message("Connecting to scanner service...");
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    };

    // Feed reconnect attempts into the spinner message
    let watcher = spinner.clone().map(|pb| {
        let mut events = client.events();
        tokio::spawn(async move {
            let mut attempts = 0u32;
            while events.recv().await.is_ok() {
                attempts += 1;
                pb.set_message(format!(
                    "Connecting to scanner service... (attempt {} failed, retrying)",
                    attempts
                ));
            }
        })
    });

    let result = client.connect().await;

    if let Some(watcher) = watcher {
        watcher.abort();
    }
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    result.context("Failed to connect to scanner service")
}
