//! Error types for scanner client operations

use thiserror::Error;

/// Result type alias for scanner client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during scanner client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// An operation was invoked with no active connection
    #[error("Not connected to the scanner service")]
    NotConnected,

    /// The configured endpoint is not a valid URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Socket-level open/send/receive failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// An inbound frame was not valid JSON, or a matching reply had an
    /// unexpected shape
    #[error("Failed to parse server message: {0}")]
    Parse(String),

    /// The connection errored or closed before a reply arrived
    #[error("Connection closed before a reply arrived")]
    ConnectionClosed,

    /// A configured request timeout elapsed with no matching reply
    #[error("Request timed out")]
    Timeout,

    /// `connect()` was cancelled by an explicit `disconnect()`
    #[error("Connect cancelled")]
    Cancelled,
}
