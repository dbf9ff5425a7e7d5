//! scanlinkd - scanner-control daemon library
//!
//! The daemon serves the scanlink JSON-over-WebSocket protocol on
//! `/ws/{client_id}`: clients send `list_scanners` and `scan` requests and
//! receive action-tagged replies, with unsolicited `ping` status frames
//! during long acquisitions. The binary in `main.rs` wires this up behind a
//! TOML config; the router is exposed here so tests can run the daemon
//! in-process.

pub mod backend;
pub mod config;
pub mod server;

pub use backend::{DemoScanner, DEMO_SCANNER_ID};
pub use config::DaemonConfig;
pub use server::{create_router, AppState};
