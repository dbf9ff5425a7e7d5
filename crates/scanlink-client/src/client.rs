//! Scanner connection manager implementation

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use scanlink_core::protocol::{action, ClientRequest, ListScannersReply};
use scanlink_core::{ScanOutcome, ScanSettings, ScannerInfo};

use crate::error::{ClientError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default fixed delay between failed connect attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Default endpoint of the local scanner-control daemon
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8765";

/// Configuration for a [`ScannerClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Daemon endpoint, e.g. `ws://localhost:8765`. The client appends
    /// `/ws/<client_id>` to form the connection URL.
    pub endpoint: String,
    /// Fixed delay between failed connect attempts
    pub retry_delay: Duration,
    /// Per-request reply timeout. With `None` a request whose reply never
    /// arrives stays pending forever; the wire protocol carries no deadline
    /// of its own.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Config pointing at the given endpoint, defaults otherwise
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }
}

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Event published by the manager for external observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// A connect attempt failed and will be retried. Carries no payload;
    /// observers keep their own attempt counters.
    ReconnectAttempt,
}

/// The scanner-connection manager.
///
/// Owns at most one live WebSocket connection to the scanner-control daemon
/// and multiplexes `list_scanners`/`scan` request/response pairs over it by
/// action tag. Construct one instance per daemon and pass it to whoever
/// needs it; cloning is cheap and clones share the same connection.
#[derive(Clone)]
pub struct ScannerClient {
    client_id: Arc<str>,
    connect_url: Url,
    config: ClientConfig,
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<ClientEvent>,
    shutdown: Arc<Notify>,
    attempts: Arc<AtomicU32>,
}

struct Inner {
    state: ConnectionState,
    conn: Option<Connection>,
}

/// One live connection: a writer task owning the sink, a reader task fanning
/// inbound text frames out to pending operations.
struct Connection {
    outbound: mpsc::UnboundedSender<Message>,
    frames: broadcast::Sender<Arc<str>>,
    closed: watch::Receiver<bool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    fn is_open(&self) -> bool {
        self.closed.has_changed().is_ok() && !*self.closed.borrow()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

impl ScannerClient {
    /// Create a manager with a fresh process-lifetime client identifier.
    ///
    /// The identifier is embedded in every outbound request and in the
    /// connection URL; the daemon uses it to correlate client state across
    /// reconnects.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let token = Uuid::new_v4().simple().to_string();
        let client_id = format!("client_{}", &token[..9]);

        let base = Url::parse(&config.endpoint)?;
        let connect_url = base.join(&format!("/ws/{client_id}"))?;

        let (events, _) = broadcast::channel(16);

        debug!(client_id = %client_id, endpoint = %config.endpoint, "scanner client created");

        Ok(Self {
            client_id: client_id.into(),
            connect_url,
            config,
            inner: Arc::new(Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                conn: None,
            })),
            events,
            shutdown: Arc::new(Notify::new()),
            attempts: Arc::new(AtomicU32::new(0)),
        })
    }

    /// The identifier this client presents to the daemon
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Subscribe to manager events (reconnect attempts)
    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Failed connect attempts since the last successful open
    pub fn connection_attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Current lifecycle state
    pub async fn state(&self) -> ConnectionState {
        let inner = self.inner.lock().await;
        match inner.state {
            ConnectionState::Connected => {
                if inner.conn.as_ref().is_some_and(Connection::is_open) {
                    ConnectionState::Connected
                } else {
                    ConnectionState::Disconnected
                }
            }
            state => state,
        }
    }

    /// Whether a usable connection is currently open
    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    /// Establish a connection, retrying forever at the configured delay.
    ///
    /// Any prior connection is replaced at the start of each attempt. The
    /// call suspends until an attempt succeeds; every failed attempt
    /// publishes [`ClientEvent::ReconnectAttempt`] and waits out the retry
    /// delay. The only failure path is cancellation: an explicit
    /// [`disconnect`](Self::disconnect) while this call is retrying makes it
    /// return [`ClientError::Cancelled`].
    pub async fn connect(&self) -> Result<()> {
        info!(client_id = %self.client_id, url = %self.connect_url, "connecting to scanner service");
        loop {
            {
                let mut inner = self.inner.lock().await;
                // Replace (and close) any prior connection.
                inner.conn = None;
                inner.state = ConnectionState::Connecting;
            }

            let attempt = async { self.open_connection().await };
            let outcome = tokio::select! {
                _ = self.shutdown.notified() => {
                    self.set_disconnected().await;
                    return Err(ClientError::Cancelled);
                }
                outcome = attempt => outcome,
            };

            match outcome {
                Ok(conn) => {
                    let mut inner = self.inner.lock().await;
                    inner.conn = Some(conn);
                    inner.state = ConnectionState::Connected;
                    self.attempts.store(0, Ordering::Relaxed);
                    info!(client_id = %self.client_id, "connected to scanner service");
                    return Ok(());
                }
                Err(err) => {
                    let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                    let _ = self.events.send(ClientEvent::ReconnectAttempt);
                    warn!(
                        attempt,
                        error = %err,
                        retry_in_ms = self.config.retry_delay.as_millis() as u64,
                        "connect attempt failed, retrying"
                    );
                    tokio::select! {
                        _ = self.shutdown.notified() => {
                            self.set_disconnected().await;
                            return Err(ClientError::Cancelled);
                        }
                        _ = tokio::time::sleep(self.config.retry_delay) => {}
                    }
                }
            }
        }
    }

    /// Close the active connection, if any.
    ///
    /// Also cancels an in-progress [`connect`](Self::connect) retry loop.
    /// Pending `list_scanners`/`scan` calls observe the teardown as
    /// [`ClientError::ConnectionClosed`].
    pub async fn disconnect(&self) {
        self.shutdown.notify_waiters();
        let mut inner = self.inner.lock().await;
        if let Some(conn) = inner.conn.take() {
            // Best-effort close frame; dropping the connection tears the
            // socket down regardless.
            let _ = conn.outbound.send(Message::Close(None));
            info!(client_id = %self.client_id, "disconnected from scanner service");
        }
        inner.state = ConnectionState::Disconnected;
    }

    /// Request the list of available scanner devices.
    ///
    /// Fails immediately with [`ClientError::NotConnected`] when no
    /// connection is open; this call never connects on its own. The first
    /// inbound `list_scanners` frame is taken as the reply; a malformed or
    /// missing `scanners` field resolves as an empty list.
    pub async fn list_scanners(&self) -> Result<Vec<ScannerInfo>> {
        let request = ClientRequest::list_scanners(self.client_id.as_ref());
        let waiter = self.send_request(&request).await?;
        let reply: ListScannersReply = self.await_reply(waiter, action::LIST_SCANNERS).await?;
        Ok(reply.scanners)
    }

    /// Run a scan with the given settings.
    ///
    /// Fails immediately with [`ClientError::NotConnected`] when no
    /// connection is open. Unsolicited `ping` frames received while waiting
    /// are logged as status updates and skipped; the first `scan` frame
    /// settles the call. A connection error or close before that frame
    /// arrives rejects the call exactly once with
    /// [`ClientError::ConnectionClosed`].
    pub async fn scan(&self, settings: ScanSettings) -> Result<ScanOutcome> {
        let request = ClientRequest::scan(settings, self.client_id.as_ref());
        let waiter = self.send_request(&request).await?;
        self.await_reply(waiter, action::SCAN).await
    }

    async fn set_disconnected(&self) {
        let mut inner = self.inner.lock().await;
        inner.conn = None;
        inner.state = ConnectionState::Disconnected;
    }

    /// Open the socket and spawn the reader/writer tasks for it.
    async fn open_connection(&self) -> Result<Connection> {
        let (stream, _response) = connect_async(self.connect_url.as_str())
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let (sink, source) = stream.split();

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (frames, _) = broadcast::channel(64);
        let (closed_tx, closed) = watch::channel(false);

        let writer = tokio::spawn(write_loop(sink, outbound_rx));
        let reader = tokio::spawn(read_loop(source, frames.clone(), closed_tx));

        Ok(Connection {
            outbound,
            frames,
            closed,
            reader,
            writer,
        })
    }

    /// Register a reply listener and send the request frame.
    ///
    /// The listener subscribes before the frame goes out so a fast reply
    /// cannot slip past it.
    async fn send_request(&self, request: &ClientRequest) -> Result<ReplyWaiter> {
        let inner = self.inner.lock().await;
        let conn = match inner.conn.as_ref() {
            Some(conn) if conn.is_open() => conn,
            _ => return Err(ClientError::NotConnected),
        };

        let waiter = ReplyWaiter {
            frames: conn.frames.subscribe(),
            closed: conn.closed.clone(),
        };

        let frame = serde_json::to_string(request).map_err(|e| ClientError::Parse(e.to_string()))?;
        debug!(action = request.action(), "sending request");
        conn.outbound
            .send(Message::text(frame))
            .map_err(|_| ClientError::ConnectionClosed)?;

        Ok(waiter)
    }

    /// Wait for the first inbound frame tagged `expected`.
    ///
    /// `ping` frames are skipped; frames with other tags are left for their
    /// own listeners. Any frame that is not valid JSON rejects the call, as
    /// does a connection error/close before a match. With a configured
    /// request timeout the wait rejects with [`ClientError::Timeout`] once
    /// the deadline passes; without one it is unbounded.
    async fn await_reply<T: DeserializeOwned>(
        &self,
        mut waiter: ReplyWaiter,
        expected: &str,
    ) -> Result<T> {
        let wait = async {
            loop {
                tokio::select! {
                    frame = waiter.frames.recv() => {
                        let frame = match frame {
                            Ok(frame) => frame,
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!(skipped, "reply listener lagged behind the message stream");
                                continue;
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                return Err(ClientError::ConnectionClosed);
                            }
                        };

                        let value: serde_json::Value = serde_json::from_str(&frame)
                            .map_err(|e| ClientError::Parse(e.to_string()))?;
                        match value.get("action").and_then(|a| a.as_str()) {
                            Some(action::PING) => {
                                let status = value
                                    .get("status")
                                    .and_then(|s| s.as_str())
                                    .unwrap_or_default();
                                debug!(status, "scanner status update");
                            }
                            Some(tag) if tag == expected => {
                                return serde_json::from_value(value)
                                    .map_err(|e| ClientError::Parse(e.to_string()));
                            }
                            _ => {}
                        }
                    }
                    changed = waiter.closed.changed() => {
                        match changed {
                            Ok(()) if *waiter.closed.borrow() => {
                                return Err(ClientError::ConnectionClosed);
                            }
                            Ok(()) => {}
                            Err(_) => return Err(ClientError::ConnectionClosed),
                        }
                    }
                }
            }
        };

        match self.config.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, wait)
                .await
                .map_err(|_| ClientError::Timeout)?,
            None => wait.await,
        }
    }
}

impl std::fmt::Debug for ScannerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerClient")
            .field("client_id", &self.client_id)
            .field("endpoint", &self.config.endpoint)
            .finish_non_exhaustive()
    }
}

/// Handle a pending operation holds while waiting for its reply
struct ReplyWaiter {
    frames: broadcast::Receiver<Arc<str>>,
    closed: watch::Receiver<bool>,
}

async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = outbound.recv().await {
        let is_close = matches!(msg, Message::Close(_));
        if let Err(err) = sink.send(msg).await {
            warn!(error = %err, "websocket send failed");
            break;
        }
        if is_close {
            break;
        }
    }
    let _ = sink.close().await;
}

async fn read_loop(
    mut source: SplitStream<WsStream>,
    frames: broadcast::Sender<Arc<str>>,
    closed: watch::Sender<bool>,
) {
    while let Some(next) = source.next().await {
        match next {
            Ok(Message::Text(text)) => {
                // No receivers just means no operation is waiting right now.
                let _ = frames.send(Arc::from(text.as_str()));
            }
            Ok(Message::Close(frame)) => {
                debug!(?frame, "server closed the connection");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "websocket read failed");
                break;
            }
        }
    }
    let _ = closed.send(true);
}
