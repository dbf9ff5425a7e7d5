//! WebSocket endpoint and request dispatch

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use scanlink_core::protocol::{ClientRequest, ListScannersReply, ServerMessage};
use scanlink_core::{ScanOutcome, ScannerBackend};

use crate::config::DaemonConfig;

/// Shared daemon state handed to every connection
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ScannerBackend>,
    pub config: DaemonConfig,
}

impl AppState {
    pub fn new(backend: Arc<dyn ScannerBackend>, config: DaemonConfig) -> Self {
        Self { backend, config }
    }
}

/// Build the daemon router.
///
/// The browser control panel connects cross-origin, so CORS stays
/// permissive.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ws/{client_id}", any(ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Service metadata for a plain HTTP probe
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Scanlink Scanner Service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_client(socket, client_id, state))
}

/// Per-connection message loop.
///
/// Requests are handled one at a time in arrival order; replies and status
/// pings go out on the same socket tagged by action.
async fn handle_client(mut socket: WebSocket, client_id: String, state: AppState) {
    info!(client_id = %client_id, "client connected");

    while let Some(next) = socket.recv().await {
        let msg = match next {
            Ok(msg) => msg,
            Err(err) => {
                debug!(client_id = %client_id, error = %err, "websocket receive failed");
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ClientRequest>(text.as_str()) {
            Ok(ClientRequest::ListScanners(data)) => {
                debug!(client_id = %data.client_id, "list_scanners request");
                let scanners = match state.backend.list_scanners().await {
                    Ok(scanners) => scanners,
                    Err(err) => {
                        // Enumeration failures degrade to an empty list;
                        // the reply itself still succeeds.
                        warn!(error = %err, "scanner enumeration failed");
                        Vec::new()
                    }
                };
                let reply = ServerMessage::ListScanners(ListScannersReply::new(scanners));
                if send(&mut socket, &reply).await.is_err() {
                    break;
                }
            }
            Ok(ClientRequest::Scan(data)) => {
                info!(
                    client_id = %data.client_id,
                    scanner_id = %data.settings.scanner_id,
                    "scan request"
                );

                let ping = ServerMessage::Ping {
                    status: state.config.demo.ping_status.clone(),
                };
                if send(&mut socket, &ping).await.is_err() {
                    break;
                }

                let outcome = match state.backend.scan(&data.settings).await {
                    Ok(outcome) => outcome,
                    Err(err) => ScanOutcome::failure(err.to_string()),
                };
                if send(&mut socket, &ServerMessage::Scan(outcome)).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                debug!(client_id = %client_id, error = %err, "unrecognized request");
                let reply = ServerMessage::Error {
                    status: "error".to_string(),
                    message: "Unknown action".to_string(),
                };
                if send(&mut socket, &reply).await.is_err() {
                    break;
                }
            }
        }
    }

    info!(client_id = %client_id, "client disconnected");
}

async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let frame = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(frame.into())).await
}
