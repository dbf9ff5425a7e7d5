//! scanlink-core - Core types for the scanlink scanner-control protocol
//!
//! This crate provides the wire protocol envelopes exchanged between the
//! scanner-connection client and the scanner-control daemon, the scanner
//! data models, and the backend trait that daemon-side scanner drivers
//! implement.

pub mod backend;
pub mod error;
pub mod models;
pub mod protocol;

pub use backend::ScannerBackend;
pub use error::{BackendError, BackendResult};
pub use models::{ColorMode, ScanOutcome, ScanSettings, ScannerInfo};
pub use protocol::{ClientRequest, ListScannersReply, ServerMessage};
