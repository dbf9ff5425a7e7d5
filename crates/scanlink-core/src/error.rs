//! Common error types for scanner backends

use thiserror::Error;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur in scanner backends
#[derive(Debug, Error)]
pub enum BackendError {
    /// Requested scanner device does not exist
    #[error("Scanner not found: {0}")]
    ScannerNotFound(String),

    /// Device-level failure while enumerating or acquiring
    #[error("Device error: {0}")]
    Device(String),

    /// Backend does not support the requested operation
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
