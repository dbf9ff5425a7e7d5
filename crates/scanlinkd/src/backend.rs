//! Built-in demo scanner backend
//!
//! Real hardware stacks (SANE, TWAIN) sit behind the [`ScannerBackend`]
//! trait; this backend synthesizes sample data so the daemon is usable on
//! machines with no scanner attached. Results carry the `demo` flag so
//! front-ends can tell sample output from a real acquisition.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::info;

use scanlink_core::{
    BackendError, BackendResult, ScanOutcome, ScanSettings, ScannerBackend, ScannerInfo,
};

/// Minimal valid 1x1 white PNG returned for every demo acquisition
const DEMO_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0b, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0xf8,
    0x0f, 0x04, 0x00, 0x09, 0xfb, 0x03, 0xfd, 0xfb, 0x5e, 0x6b, 0x2b, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Identifier of the single device the demo backend exposes
pub const DEMO_SCANNER_ID: &str = "demo_flatbed_0";

/// A backend that reports one virtual flatbed and returns synthetic scans.
#[derive(Debug, Clone)]
pub struct DemoScanner {
    scan_latency: Duration,
}

impl DemoScanner {
    pub fn new(scan_latency: Duration) -> Self {
        Self { scan_latency }
    }
}

impl Default for DemoScanner {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[async_trait]
impl ScannerBackend for DemoScanner {
    async fn list_scanners(&self) -> BackendResult<Vec<ScannerInfo>> {
        Ok(vec![ScannerInfo {
            id: DEMO_SCANNER_ID.to_string(),
            name: "Demo Flatbed Scanner".to_string(),
            manufacturer: Some("Scanlink".to_string()),
            model: Some("Virtual 1000".to_string()),
            kind: Some("demo".to_string()),
        }])
    }

    async fn scan(&self, settings: &ScanSettings) -> BackendResult<ScanOutcome> {
        if settings.scanner_id != DEMO_SCANNER_ID {
            return Err(BackendError::ScannerNotFound(settings.scanner_id.clone()));
        }

        info!(
            scanner_id = %settings.scanner_id,
            resolution = settings.resolution,
            color_mode = %settings.color_mode,
            "starting demo acquisition"
        );
        tokio::time::sleep(self.scan_latency).await;

        Ok(ScanOutcome::success(BASE64.encode(DEMO_PNG), "png").with_demo())
    }
}
