//! Test utilities for scanlink-client
//!
//! Provides a scripted WebSocket server for exercising the connection
//! manager without a real daemon: each accepted connection is handed to a
//! caller-supplied handler that plays the daemon's side of the protocol.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;

/// A lightweight scripted server that shuts down when dropped.
///
/// # Example
///
/// ```ignore
/// use futures_util::{SinkExt, StreamExt};
/// use scanlink_client::testing::ScriptedServer;
/// use tokio_tungstenite::tungstenite::Message;
///
/// let server = ScriptedServer::start(|mut ws| async move {
///     // Consume the request, answer with a canned reply.
///     let _ = ws.next().await;
///     let _ = ws
///         .send(Message::text(r#"{"action":"list_scanners","scanners":[]}"#))
///         .await;
/// })
/// .await?;
///
/// let config = ClientConfig::new(server.endpoint());
/// ```
pub struct ScriptedServer {
    addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

impl ScriptedServer {
    /// Bind to an ephemeral local port and serve connections with `handler`
    pub async fn start<H, Fut>(handler: H) -> std::io::Result<Self>
    where
        H: Fn(WebSocketStream<TcpStream>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Self::serve(listener, handler)
    }

    /// Serve connections on a specific address.
    ///
    /// Useful for reconnect tests that need a known address to be dead
    /// first and listening later.
    pub async fn start_on<H, Fut>(addr: SocketAddr, handler: H) -> std::io::Result<Self>
    where
        H: Fn(WebSocketStream<TcpStream>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        Self::serve(listener, handler)
    }

    fn serve<H, Fut>(listener: TcpListener, handler: H) -> std::io::Result<Self>
    where
        H: Fn(WebSocketStream<TcpStream>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;

        let accept_task = tokio::spawn(async move {
            loop {
                let Ok((stream, _peer)) = listener.accept().await else {
                    break;
                };
                match tokio_tungstenite::accept_async(stream).await {
                    Ok(ws) => {
                        tokio::spawn(handler(ws));
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "handshake with test client failed");
                    }
                }
            }
        });

        Ok(Self { addr, accept_task })
    }

    /// Address the server is listening on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Endpoint URL for a [`crate::ClientConfig`]
    pub fn endpoint(&self) -> String {
        format!("ws://{}", self.addr)
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}
