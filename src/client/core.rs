//! Client lifecycle and sending.
//!
//! [`WebsocketClient`] owns at most one [`Connection`] at a time. Connecting
//! spawns a receiver loop task bound to that connection; stopping or any
//! loop failure releases the connection exactly once.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};

use crate::diagnostics::{DiagnosticBuffer, DiagnosticSnapshot};
use crate::error::{Error, Result};
use crate::protocol::Packet;
use crate::report::ErrorReport;
use crate::transport::Connection;

use super::builder::{ClientBuilder, ClientConfig};
use super::callbacks::{ConnectionCallbacks, LoggingCallbacks};
use super::receiver;
use super::signal;
use super::state::{ClientState, Session};

// ============================================================================
// ClientInner
// ============================================================================

/// State shared between the client handle and its receiver loop.
pub(crate) struct ClientInner {
    /// Validated configuration.
    config: ClientConfig,
    /// Injected hooks.
    callbacks: Arc<dyn ConnectionCallbacks>,
    /// State and live handle.
    session: Mutex<Session<Connection>>,
    /// Last sent/received text.
    diagnostics: DiagnosticBuffer,
    /// Receiver loop of the most recent connection.
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl ClientInner {
    /// Returns `true` while `connection` is the live handle.
    pub(crate) fn is_current(&self, connection: &Arc<Connection>) -> bool {
        self.session.lock().is_current(connection)
    }

    /// Records inbound text for error reports.
    pub(crate) fn record_received(&self, text: &str) {
        self.diagnostics.record_received(text);
    }

    /// Copies the last sent/received text.
    pub(crate) fn diagnostics_snapshot(&self) -> DiagnosticSnapshot {
        self.diagnostics.snapshot()
    }

    /// Releases whatever connection is live.
    async fn disconnect(&self) -> bool {
        let taken = self.session.lock().take();
        self.release(taken).await
    }

    /// Releases `connection` if it is still the live handle.
    ///
    /// A receiver loop uses this so it never tears down a newer session.
    pub(crate) async fn disconnect_connection(&self, connection: &Arc<Connection>) -> bool {
        let taken = self.session.lock().take_if_current(connection);
        self.release(taken).await
    }

    /// Closes a connection already removed from the session.
    async fn release(&self, taken: Option<Arc<Connection>>) -> bool {
        let Some(connection) = taken else {
            return false;
        };

        connection.close().await;
        info!(address = connection.address(), "Disconnected");

        self.guarded("on_disconnected", || self.callbacks.on_disconnected());
        true
    }

    /// Passes one packet to the callback, converting failures and panics.
    pub(crate) fn dispatch(&self, packet: Packet) -> Result<()> {
        match catch_unwind(AssertUnwindSafe(|| self.callbacks.on_packet(packet))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e @ Error::Callback { .. })) => Err(e),
            Ok(Err(e)) => Err(Error::callback(e.to_string())),
            Err(payload) => Err(Error::callback(format!(
                "packet callback panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }

    /// Builds an error report and hands it to the error callback.
    pub(crate) fn report(&self, error: &Error) {
        let report = ErrorReport::capture(error, &self.diagnostics);
        error!(kind = report.kind, cause = %report.cause, "Receiver loop error");
        self.guarded("on_error", || self.callbacks.on_error(&report));
    }

    /// Runs a hook, logging and swallowing a panic.
    fn guarded(&self, hook: &'static str, f: impl FnOnce()) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
            warn!(
                hook,
                panic = panic_message(payload.as_ref()),
                "Callback panicked"
            );
        }
    }
}

/// Extracts the message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic>"
    }
}

// ============================================================================
// WebsocketClient
// ============================================================================

/// Resilient websocket client.
///
/// Cloning yields another handle to the same client.
///
/// # Example
///
/// ```no_run
/// use serde_json::json;
/// use tradeagent_ws::WebsocketClient;
///
/// # async fn example() -> tradeagent_ws::Result<()> {
/// let client = WebsocketClient::builder().build()?;
///
/// if client.connect("ws://127.0.0.1:9443/ws/").await? {
///     client.send_json(&json!({"msg": "test"})).await?;
/// }
///
/// client.stop().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WebsocketClient {
    /// Shared inner state.
    pub(crate) inner: Arc<ClientInner>,
}

// ============================================================================
// WebsocketClient - Display
// ============================================================================

impl fmt::Debug for WebsocketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebsocketClient")
            .field("state", &self.state())
            .field("address", &self.address())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Default for WebsocketClient {
    fn default() -> Self {
        Self::new(ClientConfig::default(), Arc::new(LoggingCallbacks))
    }
}

// ============================================================================
// WebsocketClient - Constructor
// ============================================================================

impl WebsocketClient {
    /// Creates a client from validated configuration.
    pub(crate) fn new(config: ClientConfig, callbacks: Arc<dyn ConnectionCallbacks>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                callbacks,
                session: Mutex::new(Session::default()),
                diagnostics: DiagnosticBuffer::new(config.diagnostic_limit),
                receiver: Mutex::new(None),
            }),
        }
    }

    /// Creates a new client builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

// ============================================================================
// WebsocketClient - Accessors
// ============================================================================

impl WebsocketClient {
    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ClientState {
        self.inner.session.lock().state()
    }

    /// Returns `true` if a connection is live.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ClientState::Connected
    }

    /// Returns the address of the live connection.
    #[must_use]
    pub fn address(&self) -> Option<String> {
        self.inner
            .session
            .lock()
            .handle()
            .map(|connection| connection.address().to_owned())
    }

    /// Returns the last sent/received text.
    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticSnapshot {
        self.inner.diagnostics_snapshot()
    }

    /// Returns the client configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

// ============================================================================
// WebsocketClient - Lifecycle
// ============================================================================

impl WebsocketClient {
    /// Connects to `address` and starts the receiver loop.
    ///
    /// Makes a single attempt. On success `on_connected` fires, then the
    /// receiver loop is spawned.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if a new connection was established, `Ok(false)` if one
    /// was already active or `stop` was called while connecting.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddress`] if `address` is not a `ws://` URL
    /// - [`Error::ConnectionTimeout`] if the attempt does not finish in time
    /// - [`Error::Connect`] if the connection is refused or the handshake fails
    pub async fn connect(&self, address: &str) -> Result<bool> {
        {
            let mut session = self.inner.session.lock();
            if !session.begin_connect() {
                debug!(state = %session.state(), "Connect ignored, already active");
                return Ok(false);
            }
        }

        debug!(address, "Connecting");

        let (connection, frames) =
            match Connection::open(address, self.inner.config.connect_timeout).await {
                Ok(opened) => opened,
                Err(e) => {
                    self.inner.session.lock().abort_connect();
                    warn!(address, error = %e, "Connection failed");
                    return Err(e);
                }
            };

        let connection = Arc::new(connection);

        if !self.inner.session.lock().install(Arc::clone(&connection)) {
            debug!(address, "Stopped while connecting, discarding connection");
            connection.close().await;
            return Ok(false);
        }

        info!(address, "WebSocket connection established");
        self.inner
            .guarded("on_connected", || self.inner.callbacks.on_connected());

        let task = tokio::spawn(receiver::run(
            Arc::clone(&self.inner),
            connection,
            frames,
        ));
        if let Some(previous) = self.inner.receiver.lock().replace(task) {
            // Bound to a released connection, exits on its own
            drop(previous);
        }

        Ok(true)
    }

    /// Stops the client and releases the connection.
    ///
    /// Safe to call any number of times and from a signal handler task.
    pub async fn stop(&self) {
        let taken = self.inner.session.lock().begin_stop();
        debug!(had_connection = taken.is_some(), "Stopping client");
        self.inner.release(taken).await;
    }

    /// Releases the live connection, if any.
    ///
    /// Returns `true` if a connection was released by this call. Unlike
    /// [`stop`](Self::stop), the client is left `Disconnected`.
    pub async fn disconnect(&self) -> bool {
        self.inner.disconnect().await
    }

    /// Waits for the current receiver loop to finish.
    pub async fn wait_closed(&self) {
        let task = self.inner.receiver.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!(error = %e, "Receiver loop task failed");
        }
    }

    /// Spawns a task that stops the client on Ctrl+C or SIGTERM.
    ///
    /// Await the returned handle to exit only after the client is stopped.
    pub fn stop_on_signal(&self) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            signal::wait_for_exit_signal().await;
            info!("Exit signal received");
            client.stop().await;
        })
    }
}

// ============================================================================
// WebsocketClient - Sending
// ============================================================================

impl WebsocketClient {
    /// Sends a packet as a text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the packet cannot be serialized
    /// - [`Error::NotConnected`] if no connection is live
    /// - [`Error::WebSocket`] if the write fails
    pub async fn send(&self, packet: &Packet) -> Result<()> {
        let text = packet.encode()?;
        self.send_text(&text).await
    }

    /// Serializes `value` to JSON and sends it as a text frame.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.send_text(&text).await
    }

    /// Sends raw text.
    ///
    /// The text is recorded for error reports before transmission, even if
    /// the send then fails.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no connection is live
    /// - [`Error::WebSocket`] if the write fails
    pub async fn send_text(&self, text: &str) -> Result<()> {
        self.inner.diagnostics.record_sent(text);

        let connection = self.live_connection()?;
        connection.send(Message::text(text.to_owned())).await?;

        trace!(len = text.len(), "Text frame sent");
        Ok(())
    }

    /// Sends a binary frame.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no connection is live
    /// - [`Error::WebSocket`] if the write fails
    pub async fn send_binary(&self, data: Vec<u8>) -> Result<()> {
        let connection = self.live_connection()?;
        let len = data.len();
        connection.send(Message::binary(data)).await?;

        trace!(len, "Binary frame sent");
        Ok(())
    }

    /// Returns the live connection or [`Error::NotConnected`].
    fn live_connection(&self) -> Result<Arc<Connection>> {
        self.inner
            .session
            .lock()
            .handle()
            .ok_or(Error::NotConnected)
    }
}

// ============================================================================
// Tests
// ============================================================================
