//! Minimal WebSocket server used as a test harness.
//!
//! Accepts any number of clients, optionally greets and echoes them, and
//! lets the caller broadcast text or close every client from the server
//! side. Messages received from clients are queued for inspection.
//!
//! # Example
//!
//! ```ignore
//! use std::net::{IpAddr, Ipv4Addr};
//! use tradeagent_ws::transport::{ServerOptions, TestServer};
//!
//! let server = TestServer::bind(
//!     IpAddr::V4(Ipv4Addr::LOCALHOST),
//!     0,
//!     ServerOptions::new().with_greeting(r#"{"msg":"hi"}"#),
//! )
//! .await?;
//!
//! let url = server.ws_url();
//! // Connect a client to url...
//!
//! server.broadcast("hello");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Greeting sent by the TradeAgent server on connect.
pub const DEFAULT_GREETING: &str = r#"{"msg":"Connected to TradeAgent WebSocket Server."}"#;

/// Poll interval for [`TestServer::wait_for_clients`].
const CLIENT_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Types
// ============================================================================

/// Per-client outbound commands.
enum ClientCommand {
    /// Write a message to the client.
    Send(Message),
    /// Send a Close frame and drop the client.
    Close,
}

/// Outbound channels keyed by client ID.
type ClientMap = FxHashMap<u64, mpsc::UnboundedSender<ClientCommand>>;

// ============================================================================
// ServerOptions
// ============================================================================

/// Behavior of a [`TestServer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerOptions {
    /// Text sent to each client right after the handshake.
    pub greeting: Option<String>,
    /// Echo every text message back to its sender.
    pub echo: bool,
}

impl ServerOptions {
    /// Creates options with no greeting and no echo.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the greeting sent on connect.
    #[inline]
    #[must_use]
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Enables echoing.
    #[inline]
    #[must_use]
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }
}

// ============================================================================
// TestServer
// ============================================================================

/// WebSocket server harness.
///
/// The accept loop runs until [`TestServer::shutdown`] or drop.
pub struct TestServer {
    /// Bound socket address.
    addr: SocketAddr,
    /// Connected clients.
    clients: Arc<Mutex<ClientMap>>,
    /// Text received from any client, in arrival order.
    incoming: AsyncMutex<mpsc::UnboundedReceiver<String>>,
    /// Accept loop task.
    accept_task: JoinHandle<()>,
}

impl TestServer {
    /// Binds the server and starts accepting clients.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if binding fails.
    pub async fn bind(ip: IpAddr, port: u16, options: ServerOptions) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let addr = listener.local_addr()?;

        let clients: Arc<Mutex<ClientMap>> = Arc::new(Mutex::new(FxHashMap::default()));
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        let accept_task = tokio::spawn(Self::accept_loop(
            listener,
            options,
            Arc::clone(&clients),
            incoming_tx,
        ));

        info!(%addr, "Test server listening");

        Ok(Self {
            addr,
            clients,
            incoming: AsyncMutex::new(incoming_rx),
            accept_task,
        })
    }

    /// Returns the bound socket address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the WebSocket URL for this server.
    ///
    /// Format: `ws://{ip}:{port}/`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    /// Returns the number of connected clients.
    #[inline]
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Waits until exactly `count` clients are connected.
    ///
    /// Returns `false` if `wait` elapses first.
    pub async fn wait_for_clients(&self, count: usize, wait: Duration) -> bool {
        timeout(wait, async {
            while self.client_count() != count {
                sleep(CLIENT_POLL_INTERVAL).await;
            }
        })
        .await
        .is_ok()
    }

    /// Sends `text` to every connected client.
    ///
    /// Returns the number of clients the message was queued for.
    pub fn broadcast(&self, text: &str) -> usize {
        let clients = self.clients.lock();
        clients
            .values()
            .filter(|tx| {
                tx.send(ClientCommand::Send(Message::text(text.to_owned())))
                    .is_ok()
            })
            .count()
    }

    /// Closes every client connection from the server side.
    pub fn close_all(&self) {
        let clients: Vec<_> = self.clients.lock().drain().collect();
        for (id, tx) in clients {
            let _ = tx.send(ClientCommand::Close);
            debug!(client = id, "Closing client");
        }
    }

    /// Waits for the next text message received from any client.
    ///
    /// Returns `None` if `wait` elapses first.
    pub async fn next_message(&self, wait: Duration) -> Option<String> {
        let mut incoming = self.incoming.lock().await;
        timeout(wait, incoming.recv()).await.ok().flatten()
    }

    /// Stops accepting and closes all clients.
    pub fn shutdown(&self) {
        self.accept_task.abort();
        self.close_all();
    }

    /// Accepts clients until aborted.
    async fn accept_loop(
        listener: TcpListener,
        options: ServerOptions,
        clients: Arc<Mutex<ClientMap>>,
        incoming_tx: mpsc::UnboundedSender<String>,
    ) {
        let mut next_id = 1u64;

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let id = next_id;
                    next_id += 1;
                    debug!(client = id, %peer, "TCP connection accepted");

                    tokio::spawn(Self::serve_client(
                        id,
                        stream,
                        options.clone(),
                        Arc::clone(&clients),
                        incoming_tx.clone(),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                }
            }
        }
    }

    /// Runs one client session.
    async fn serve_client(
        id: u64,
        stream: TcpStream,
        options: ServerOptions,
        clients: Arc<Mutex<ClientMap>>,
        incoming_tx: mpsc::UnboundedSender<String>,
    ) {
        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!(client = id, error = %e, "WebSocket upgrade failed");
                return;
            }
        };

        let (mut ws_write, mut ws_read) = ws_stream.split();
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();

        if let Some(ref greeting) = options.greeting
            && let Err(e) = ws_write.send(Message::text(greeting.clone())).await
        {
            warn!(client = id, error = %e, "Failed to send greeting");
            return;
        }

        clients.lock().insert(id, command_tx);
        info!(client = id, "New client connected");

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            debug!(client = id, text = text.as_str(), "Message received");
                            let _ = incoming_tx.send(text.as_str().to_owned());

                            if options.echo
                                && let Err(e) = ws_write.send(Message::Text(text)).await
                            {
                                warn!(client = id, error = %e, "Echo failed");
                                break;
                            }
                        }

                        Some(Ok(Message::Close(_))) | None => break,

                        Some(Err(e)) => {
                            debug!(client = id, error = %e, "Client read error");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(ClientCommand::Send(message)) => {
                            if let Err(e) = ws_write.send(message).await {
                                warn!(client = id, error = %e, "Send failed");
                                break;
                            }
                        }

                        Some(ClientCommand::Close) | None => {
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        clients.lock().remove(&id);
        info!(client = id, "Client disconnected");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;

    use tokio_tungstenite::connect_async;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    async fn bind(options: ServerOptions) -> TestServer {
        TestServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, options)
            .await
            .expect("bind should succeed")
    }

    #[tokio::test]
    async fn test_server_bind_random_port() {
        let server = bind(ServerOptions::new()).await;

        assert!(server.local_addr().port() > 0);
        assert!(server.ws_url().starts_with("ws://127.0.0.1:"));
        assert_eq!(server.client_count(), 0);
    }

    #[tokio::test]
    async fn test_greeting_and_echo() {
        let server = bind(ServerOptions::new().with_greeting("hi").with_echo()).await;

        let (mut ws, _) = connect_async(server.ws_url())
            .await
            .expect("connect should succeed");

        let greeting = ws.next().await.unwrap().unwrap();
        assert_eq!(greeting.to_text().unwrap(), "hi");

        ws.send(Message::text("ping")).await.unwrap();
        let echoed = ws.next().await.unwrap().unwrap();
        assert_eq!(echoed.to_text().unwrap(), "ping");

        assert_eq!(server.next_message(TEST_TIMEOUT).await.as_deref(), Some("ping"));
    }

    #[tokio::test]
    async fn test_broadcast_and_close_all() {
        let server = bind(ServerOptions::new()).await;

        let (mut ws, _) = connect_async(server.ws_url())
            .await
            .expect("connect should succeed");
        assert!(server.wait_for_clients(1, TEST_TIMEOUT).await);

        assert_eq!(server.broadcast("news"), 1);
        let message = ws.next().await.unwrap().unwrap();
        assert_eq!(message.to_text().unwrap(), "news");

        server.close_all();
        let message = ws.next().await.unwrap().unwrap();
        assert!(message.is_close());
    }

    #[tokio::test]
    async fn test_next_message_times_out() {
        let server = bind(ServerOptions::new()).await;
        assert!(server.next_message(Duration::from_millis(20)).await.is_none());
    }

    #[test]
    fn test_default_greeting_is_json_object() {
        let value: serde_json::Value = serde_json::from_str(DEFAULT_GREETING).unwrap();
        assert!(value.is_object());
    }
}
