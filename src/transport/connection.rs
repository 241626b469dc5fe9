//! WebSocket connection handle.
//!
//! A [`Connection`] owns the write half of one websocket session. The read
//! half is returned separately as a [`FrameStream`] and consumed by the
//! receiver loop.
//!
//! # Close Semantics
//!
//! [`Connection::close`] is idempotent. The first call sends a Close frame
//! and wakes any task waiting in [`Connection::closed`], which lets the
//! receiver loop observe the close instead of being interrupted.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on flushing the Close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Types
// ============================================================================

/// Client-side websocket stream.
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Read half of a connection, consumed by the receiver loop.
pub type FrameStream = SplitStream<WsStream>;

// ============================================================================
// Connection
// ============================================================================

/// Live handle to an open websocket connection.
///
/// At most one handle exists per client; the client drops its reference
/// before closing it.
pub struct Connection {
    /// Address the connection was opened with.
    address: String,
    /// Write half, serialized across concurrent senders.
    writer: AsyncMutex<SplitSink<WsStream, Message>>,
    /// Set once by the first `close`.
    closed: AtomicBool,
    /// Wakes the receiver loop on close.
    close_signal: Notify,
}

impl Connection {
    /// Opens a websocket connection with a single attempt.
    ///
    /// No retry is performed; the caller decides whether to try again.
    ///
    /// # Arguments
    ///
    /// * `address` - `ws://host:port/path`
    /// * `connect_timeout` - Maximum time for TCP connect plus handshake
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddress`] if the address is not a `ws://` URL
    /// - [`Error::ConnectionTimeout`] if the handshake does not complete in time
    /// - [`Error::Connect`] if the socket or handshake fails
    pub async fn open(address: &str, connect_timeout: Duration) -> Result<(Self, FrameStream)> {
        validate_address(address)?;

        let (ws_stream, response) = timeout(connect_timeout, connect_async(address))
            .await
            .map_err(|_| Error::connection_timeout(saturating_millis(connect_timeout)))?
            .map_err(|e| Error::connect(address, e))?;

        debug!(address, status = %response.status(), "WebSocket handshake completed");

        let (writer, frames) = ws_stream.split();

        let connection = Self {
            address: address.to_owned(),
            writer: AsyncMutex::new(writer),
            closed: AtomicBool::new(false),
            close_signal: Notify::new(),
        };

        Ok((connection, frames))
    }

    /// Returns the address this connection was opened with.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns `true` once `close` has been called.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Writes one message to the socket.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is closed
    /// - [`Error::WebSocket`] if the write fails
    pub async fn send(&self, message: Message) -> Result<()> {
        if self.is_closed() {
            return Err(Error::NotConnected);
        }

        let mut writer = self.writer.lock().await;
        writer.send(message).await?;
        Ok(())
    }

    /// Closes the connection.
    ///
    /// Calling this on an already closed connection is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            trace!(address = %self.address, "Connection already closed");
            return;
        }

        self.close_signal.notify_one();

        let mut writer = self.writer.lock().await;
        match timeout(CLOSE_TIMEOUT, writer.close()).await {
            Ok(Ok(())) => debug!(address = %self.address, "Connection closed"),
            Ok(Err(e)) => debug!(address = %self.address, error = %e, "Close frame not delivered"),
            Err(_) => debug!(address = %self.address, "Close frame flush timed out"),
        }
    }

    /// Resolves once `close` has been called.
    pub async fn closed(&self) {
        if self.is_closed() {
            return;
        }
        self.close_signal.notified().await;
    }
}

// ============================================================================
// Address Validation
// ============================================================================

/// Checks that `address` is a usable websocket URL.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] for unparsable URLs, non-`ws` schemes,
/// or URLs without a host.
pub fn validate_address(address: &str) -> Result<Url> {
    let url = Url::parse(address).map_err(|e| Error::invalid_address(address, e.to_string()))?;

    if url.scheme() != "ws" {
        return Err(Error::invalid_address(
            address,
            format!("unsupported scheme '{}', expected 'ws'", url.scheme()),
        ));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_address(address, "missing host"));
    }

    Ok(url)
}

/// Milliseconds in `duration`, saturating at `u64::MAX`.
fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================
