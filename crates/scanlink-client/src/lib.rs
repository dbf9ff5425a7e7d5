//! Scanlink Client Library
//!
//! Provides the scanner-connection manager: a persistent JSON-over-WebSocket
//! client for a local scanner-control daemon. The manager owns exactly one
//! duplex connection, retries failed connects forever at a fixed delay, and
//! multiplexes the two request/response operations (`list_scanners`, `scan`)
//! over the shared message stream by action tag.
//!
//! # Example
//!
//! ```rust,no_run
//! use scanlink_client::{ClientConfig, ScannerClient};
//! use scanlink_core::ScanSettings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ScannerClient::new(ClientConfig::default())?;
//!
//!     // Suspends until the daemon accepts a connection, retrying forever.
//!     client.connect().await?;
//!
//!     let scanners = client.list_scanners().await?;
//!     if let Some(scanner) = scanners.first() {
//!         let outcome = client.scan(ScanSettings::new(&scanner.id)).await?;
//!         println!("scan status: {}", outcome.status);
//!     }
//!
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! # Correlation contract
//!
//! Responses are matched to requests purely by their `action` tag, first
//! match wins. Issue at most one `list_scanners` and one `scan` at a time;
//! two outstanding requests of the same action type may have their replies
//! swapped. This mirrors the wire protocol, which carries no per-request
//! identifiers.

mod client;
mod error;
pub mod testing;

pub use client::{ClientConfig, ClientEvent, ConnectionState, ScannerClient};
pub use error::{ClientError, Result};

// Re-export core types for convenience
pub use scanlink_core::{ColorMode, ScanOutcome, ScanSettings, ScannerInfo};
