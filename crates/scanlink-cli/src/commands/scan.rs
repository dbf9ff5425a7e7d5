//! Scan command - run an acquisition and save the result

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use indicatif::{ProgressBar, ProgressStyle};
use scanlink_client::ScannerClient;
use scanlink_core::{ColorMode, ScanSettings};

use crate::output::OutputContext;

/// Run a scan and write or summarize the resulting image
pub async fn scan(
    client: &ScannerClient,
    scanner: &str,
    resolution: u32,
    color_mode: ColorMode,
    out: Option<&Path>,
    ctx: &OutputContext,
) -> Result<()> {
    let settings = ScanSettings::new(scanner)
        .with_resolution(resolution)
        .with_color_mode(color_mode);

    let spinner = if ctx.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .context("invalid spinner template")?,
        );
        pb.set_message(format!("Scanning on {}...", scanner));
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    };

    let result = client.scan(settings).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let outcome = result.context("Scan request failed")?;

    if !outcome.is_success() {
        anyhow::bail!(
            "Scan failed: {}",
            outcome
                .message
                .unwrap_or_else(|| "no error message".to_string())
        );
    }

    if outcome.demo == Some(true) {
        ctx.warn("Note: demo backend, image is synthetic sample data");
    }

    let Some(image_data) = outcome.image_data else {
        ctx.warn("Scan succeeded but returned no image data");
        return Ok(());
    };

    let bytes = BASE64
        .decode(image_data.as_bytes())
        .context("Scan result contained invalid base64 image data")?;
    let format = outcome.format.unwrap_or_else(|| "png".to_string());

    match out {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write image to {}", path.display()))?;
            ctx.success(&format!(
                "Saved {} bytes ({}) to {}",
                bytes.len(),
                format,
                path.display()
            ));
        }
        None => {
            ctx.print_kv(&[
                ("Status", outcome.status),
                ("Format", format),
                ("Size", format!("{} bytes", bytes.len())),
            ]);
            ctx.info("Pass --out <FILE> to save the image");
        }
    }

    Ok(())
}
