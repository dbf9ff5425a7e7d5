//! Behavioral tests for the scanner connection manager, driven against
//! scripted WebSocket servers.

use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use scanlink_client::testing::ScriptedServer;
use scanlink_client::{ClientConfig, ClientError, ClientEvent, ConnectionState, ScannerClient};
use scanlink_core::{ColorMode, ScanSettings};

const TEST_RETRY_DELAY: Duration = Duration::from_millis(50);

fn test_config(endpoint: String) -> ClientConfig {
    ClientConfig {
        endpoint,
        retry_delay: TEST_RETRY_DELAY,
        request_timeout: None,
    }
}

/// Reserve an ephemeral port, then free it so connects to it are refused
/// until a scripted server claims it.
async fn reserve_dead_addr() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn connected_client(server: &ScriptedServer) -> ScannerClient {
    let client = ScannerClient::new(test_config(server.endpoint())).unwrap();
    client.connect().await.unwrap();
    client
}

/// Keep the daemon side open without ever replying.
async fn silent_handler(mut ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) {
    while let Some(msg) = ws.next().await {
        if msg.is_err() {
            break;
        }
    }
}

#[tokio::test]
async fn connect_retries_until_server_appears() {
    let addr = reserve_dead_addr().await;

    let client = ScannerClient::new(test_config(format!("ws://{addr}"))).unwrap();
    let mut events = client.events();

    let started = Instant::now();
    let connect_task = tokio::spawn({
        let client = client.clone();
        async move { client.connect().await }
    });

    // Let a few attempts fail before the server comes up.
    tokio::time::sleep(TEST_RETRY_DELAY * 4).await;
    let _server = ScriptedServer::start_on(addr, silent_handler).await.unwrap();

    connect_task.await.unwrap().unwrap();

    let mut attempts = 0u32;
    while let Ok(event) = events.try_recv() {
        assert_eq!(event, ClientEvent::ReconnectAttempt);
        attempts += 1;
    }
    assert!(attempts >= 2, "expected several failed attempts, got {attempts}");
    // Consecutive attempts are spaced by the fixed retry delay.
    assert!(started.elapsed() >= TEST_RETRY_DELAY * (attempts - 1));

    // Counter resets on a successful open.
    assert_eq!(client.connection_attempts(), 0);
    assert_eq!(client.state().await, ConnectionState::Connected);

    client.disconnect().await;
}

#[tokio::test]
async fn disconnect_cancels_connect_retry_loop() {
    let addr = reserve_dead_addr().await;
    let client = ScannerClient::new(test_config(format!("ws://{addr}"))).unwrap();

    let connect_task = tokio::spawn({
        let client = client.clone();
        async move { client.connect().await }
    });

    tokio::time::sleep(TEST_RETRY_DELAY).await;
    client.disconnect().await;

    let result = connect_task.await.unwrap();
    assert!(matches!(result, Err(ClientError::Cancelled)));
    assert_eq!(client.state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn list_scanners_without_connection_rejects_immediately() {
    let client = ScannerClient::new(ClientConfig::default()).unwrap();

    let result = client.list_scanners().await;
    assert!(matches!(result, Err(ClientError::NotConnected)));
}

#[tokio::test]
async fn scan_without_connection_rejects_immediately() {
    let client = ScannerClient::new(ClientConfig::default()).unwrap();

    let result = client.scan(ScanSettings::new("s1")).await;
    assert!(matches!(result, Err(ClientError::NotConnected)));
}

#[tokio::test]
async fn list_scanners_resolves_entries() {
    let server = ScriptedServer::start(|mut ws| async move {
        let _request = ws.next().await;
        let reply = json!({
            "action": "list_scanners",
            "status": "success",
            "scanners": [
                {"id": "s1", "name": "Front desk", "manufacturer": "Acme", "model": "FD-1"},
                {"id": "s2", "name": "Archive"},
            ],
        });
        let _ = ws.send(Message::text(reply.to_string())).await;
        silent_handler(ws).await;
    })
    .await
    .unwrap();

    let client = connected_client(&server).await;
    let scanners = client.list_scanners().await.unwrap();

    assert_eq!(scanners.len(), 2);
    assert_eq!(scanners[0].id, "s1");
    assert_eq!(scanners[0].manufacturer.as_deref(), Some("Acme"));
    assert_eq!(scanners[1].model, None);

    client.disconnect().await;
}

#[tokio::test]
async fn list_scanners_coerces_malformed_field_to_empty() {
    let server = ScriptedServer::start(|mut ws| async move {
        let _request = ws.next().await;
        let reply = json!({"action": "list_scanners", "scanners": "not-an-array"});
        let _ = ws.send(Message::text(reply.to_string())).await;
        silent_handler(ws).await;
    })
    .await
    .unwrap();

    let client = connected_client(&server).await;
    assert_eq!(client.list_scanners().await.unwrap(), Vec::new());

    client.disconnect().await;
}

#[tokio::test]
async fn malformed_json_frame_rejects_pending_call() {
    let server = ScriptedServer::start(|mut ws| async move {
        let _request = ws.next().await;
        let _ = ws.send(Message::text("{not json")).await;
        silent_handler(ws).await;
    })
    .await
    .unwrap();

    let client = connected_client(&server).await;
    let result = client.list_scanners().await;
    assert!(matches!(result, Err(ClientError::Parse(_))));

    client.disconnect().await;
}

#[tokio::test]
async fn scan_skips_pings_and_resolves_with_first_scan_reply() {
    let server = ScriptedServer::start(|mut ws| async move {
        let _request = ws.next().await;
        for _ in 0..3 {
            let ping = json!({"action": "ping", "status": "Scanning in progress..."});
            let _ = ws.send(Message::text(ping.to_string())).await;
        }
        let reply = json!({
            "action": "scan",
            "status": "success",
            "image_data": "aGVsbG8=",
            "format": "png",
            "demo": true,
        });
        let _ = ws.send(Message::text(reply.to_string())).await;
        silent_handler(ws).await;
    })
    .await
    .unwrap();

    let client = connected_client(&server).await;
    let outcome = client.scan(ScanSettings::new("s1")).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.image_data.as_deref(), Some("aGVsbG8="));
    assert_eq!(outcome.format.as_deref(), Some("png"));
    assert_eq!(outcome.demo, Some(true));

    client.disconnect().await;
}

#[tokio::test]
async fn scan_rejects_when_connection_closes_before_reply() {
    let server = ScriptedServer::start(|mut ws| async move {
        let _request = ws.next().await;
        let _ = ws.close(None).await;
    })
    .await
    .unwrap();

    let client = connected_client(&server).await;
    let result = client.scan(ScanSettings::new("s1")).await;
    assert!(matches!(result, Err(ClientError::ConnectionClosed)));
}

#[tokio::test]
async fn scan_request_frame_carries_settings_and_client_id() {
    // The server echoes the raw request frame back inside the reply's
    // message field so the test can inspect what actually went out.
    let server = ScriptedServer::start(|mut ws| async move {
        if let Some(Ok(Message::Text(request))) = ws.next().await {
            let reply = json!({
                "action": "scan",
                "status": "success",
                "message": request.as_str(),
            });
            let _ = ws.send(Message::text(reply.to_string())).await;
        }
        silent_handler(ws).await;
    })
    .await
    .unwrap();

    let client = connected_client(&server).await;
    let settings = ScanSettings::new("s1")
        .with_resolution(300)
        .with_color_mode(ColorMode::Color);
    let outcome = client.scan(settings).await.unwrap();

    let sent: serde_json::Value = serde_json::from_str(&outcome.message.unwrap()).unwrap();
    assert_eq!(
        sent,
        json!({
            "action": "scan",
            "data": {
                "scanner_id": "s1",
                "resolution": 300,
                "color_mode": "color",
                "client_id": client.client_id(),
            }
        })
    );

    client.disconnect().await;
}

#[tokio::test]
async fn call_stays_pending_when_server_never_replies() {
    let server = ScriptedServer::start(silent_handler).await.unwrap();

    let client = connected_client(&server).await;
    let pending = client.list_scanners();

    // Documented hang: with no request timeout configured the call must
    // not settle within a bounded window.
    let bounded = tokio::time::timeout(Duration::from_millis(300), pending).await;
    assert!(bounded.is_err(), "call settled but should still be pending");

    client.disconnect().await;
}

#[tokio::test]
async fn configured_request_timeout_rejects_pending_call() {
    let server = ScriptedServer::start(silent_handler).await.unwrap();

    let mut config = test_config(server.endpoint());
    config.request_timeout = Some(Duration::from_millis(100));
    let client = ScannerClient::new(config).unwrap();
    client.connect().await.unwrap();

    let result = client.list_scanners().await;
    assert!(matches!(result, Err(ClientError::Timeout)));

    client.disconnect().await;
}

#[tokio::test]
async fn disconnect_without_connection_is_a_noop() {
    let client = ScannerClient::new(ClientConfig::default()).unwrap();
    client.disconnect().await;
    assert_eq!(client.state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn operations_after_disconnect_reject_with_not_connected() {
    let server = ScriptedServer::start(silent_handler).await.unwrap();

    let client = connected_client(&server).await;
    client.disconnect().await;

    let result = client.list_scanners().await;
    assert!(matches!(result, Err(ClientError::NotConnected)));
}
