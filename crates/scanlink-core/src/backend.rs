//! Backend trait implemented by daemon-side scanner drivers

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::models::{ScanOutcome, ScanSettings, ScannerInfo};

/// A scanner driver the daemon can enumerate and acquire from.
///
/// Implementations wrap a device stack (SANE, TWAIN, ...) or synthesize
/// sample data for demo installs. Enumeration failures surface as errors
/// here; the daemon maps them to an empty device list so a bad driver never
/// takes the reply down with it.
#[async_trait]
pub trait ScannerBackend: Send + Sync {
    /// Enumerate the devices this backend can drive
    async fn list_scanners(&self) -> BackendResult<Vec<ScannerInfo>>;

    /// Acquire an image from the device named in `settings`
    async fn scan(&self, settings: &ScanSettings) -> BackendResult<ScanOutcome>;
}
