//! Integration tests for the scanlink scanner service
//!
//! This crate contains end-to-end tests that exercise the full stack:
//! - scanlinkd WebSocket endpoint (run in-process on an ephemeral port)
//! - scanlink-client connection manager
//! - the JSON wire protocol between them
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p scanlink-tests
//! ```
//!
//! # Test Structure
//!
//! - `e2e_test.rs` - Full client-against-daemon tests with the demo backend

// This crate only contains tests, no library code
