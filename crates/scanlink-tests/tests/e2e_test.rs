//! End-to-end tests for the scanlink scanner service
//!
//! These tests run the full stack:
//! 1. Start scanlinkd's router in-process on an ephemeral port
//! 2. Connect a ScannerClient to it
//! 3. Exercise the wire protocol (list_scanners, scan)
//! 4. Verify replies carry real demo-backend data

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pretty_assertions::assert_eq;
use serial_test::serial;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use scanlink_client::{ClientConfig, ClientEvent, ScannerClient};
use scanlink_core::{ColorMode, ScanSettings};
use scanlinkd::{AppState, DaemonConfig, DemoScanner, DEMO_SCANNER_ID};

/// Retry delay short enough to keep reconnect tests fast
const TEST_RETRY_DELAY: Duration = Duration::from_millis(50);

/// In-process scanlinkd instance bound to an ephemeral port
struct TestDaemon {
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl TestDaemon {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(listener).await
    }

    /// Start on a specific address, for tests that reserve one up front
    async fn start_on(addr: SocketAddr) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        Self::serve(listener).await
    }

    async fn serve(listener: TcpListener) -> Self {
        let backend = Arc::new(DemoScanner::new(Duration::ZERO));
        let state = AppState::new(backend, DaemonConfig::default());
        let app = scanlinkd::create_router(state);

        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, server }
    }

    fn endpoint(&self) -> String {
        format!("ws://{}", self.addr)
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint(),
            retry_delay: TEST_RETRY_DELAY,
            request_timeout: Some(Duration::from_secs(5)),
        }
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Bind and immediately release an ephemeral port so a later daemon can
/// claim the address while a client is already retrying against it.
fn reserve_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn list_scanners_returns_demo_flatbed() {
    let daemon = TestDaemon::start().await;
    let client = ScannerClient::new(daemon.client_config()).unwrap();
    client.connect().await.unwrap();

    let scanners = client.list_scanners().await.unwrap();

    assert_eq!(scanners.len(), 1);
    assert_eq!(scanners[0].id, DEMO_SCANNER_ID);
    assert_eq!(scanners[0].name, "Demo Flatbed Scanner");
    assert_eq!(scanners[0].kind.as_deref(), Some("demo"));

    client.disconnect().await;
}

#[tokio::test]
async fn scan_returns_demo_png_past_status_pings() {
    let daemon = TestDaemon::start().await;
    let client = ScannerClient::new(daemon.client_config()).unwrap();
    client.connect().await.unwrap();

    // The daemon sends a `ping` status frame before the scan reply; the
    // client must skip it and resolve with the tagged scan outcome.
    let settings = ScanSettings::new(DEMO_SCANNER_ID)
        .with_resolution(600)
        .with_color_mode(ColorMode::Grayscale);
    let outcome = client.scan(settings).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.demo, Some(true));
    assert_eq!(outcome.format.as_deref(), Some("png"));

    let bytes = BASE64.decode(outcome.image_data.unwrap()).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    client.disconnect().await;
}

#[tokio::test]
async fn scan_on_unknown_scanner_reports_failure_outcome() {
    let daemon = TestDaemon::start().await;
    let client = ScannerClient::new(daemon.client_config()).unwrap();
    client.connect().await.unwrap();

    // Backend errors surface as a failed outcome, not a transport error.
    let outcome = client.scan(ScanSettings::new("no_such_device")).await.unwrap();

    assert!(!outcome.is_success());
    let message = outcome.message.unwrap();
    assert!(message.contains("no_such_device"), "message: {message}");

    client.disconnect().await;
}

#[tokio::test]
async fn sequential_requests_share_one_connection() {
    let daemon = TestDaemon::start().await;
    let client = ScannerClient::new(daemon.client_config()).unwrap();
    client.connect().await.unwrap();

    for _ in 0..3 {
        let scanners = client.list_scanners().await.unwrap();
        assert_eq!(scanners[0].id, DEMO_SCANNER_ID);

        let outcome = client.scan(ScanSettings::new(DEMO_SCANNER_ID)).await.unwrap();
        assert!(outcome.is_success());
    }

    // Still the first and only connection
    assert_eq!(client.connection_attempts(), 0);
    client.disconnect().await;
}

#[tokio::test]
#[serial]
async fn connect_retries_until_daemon_comes_up() {
    let addr = reserve_addr();

    let config = ClientConfig {
        endpoint: format!("ws://{}", addr),
        retry_delay: TEST_RETRY_DELAY,
        request_timeout: Some(Duration::from_secs(5)),
    };
    let client = ScannerClient::new(config).unwrap();
    let mut events = client.events();

    // Bring the daemon up only after the client has had time to fail a
    // few attempts.
    let daemon = tokio::spawn(async move {
        tokio::time::sleep(TEST_RETRY_DELAY * 3).await;
        TestDaemon::start_on(addr).await
    });

    client.connect().await.unwrap();
    let daemon = daemon.await.unwrap();

    // At least one retry notification was published before success
    let mut attempts = 0u32;
    while let Ok(event) = events.try_recv() {
        assert_eq!(event, ClientEvent::ReconnectAttempt);
        attempts += 1;
    }
    assert!(attempts >= 1, "expected retry notifications, got none");

    // The counter resets once a connection is established
    assert_eq!(client.connection_attempts(), 0);

    let scanners = client.list_scanners().await.unwrap();
    assert_eq!(scanners[0].id, DEMO_SCANNER_ID);

    client.disconnect().await;
    drop(daemon);
}

#[tokio::test]
#[serial]
async fn client_survives_daemon_restart() {
    let daemon = TestDaemon::start().await;
    let addr = daemon.addr;
    let client = ScannerClient::new(daemon.client_config()).unwrap();
    client.connect().await.unwrap();
    assert!(client.is_connected().await);

    client.disconnect().await;
    assert!(!client.is_connected().await);
    drop(daemon);

    // A fresh daemon on the same port, a fresh connect call on the same
    // client instance.
    let daemon = TestDaemon::start_on(addr).await;
    client.connect().await.unwrap();

    let scanners = client.list_scanners().await.unwrap();
    assert_eq!(scanners[0].id, DEMO_SCANNER_ID);

    client.disconnect().await;
    drop(daemon);
}
