//! Error types for the TradeAgent WebSocket client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use tradeagent_ws::{Result, WebsocketClient};
//!
//! async fn example(client: &WebsocketClient) -> Result<()> {
//!     client.connect("ws://127.0.0.1:9443/ws/").await?;
//!     client.send_text("ping").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidAddress`] |
//! | Connection | [`Error::Connect`], [`Error::ConnectionTimeout`], [`Error::NotConnected`] |
//! | Receiver loop | [`Error::Decode`], [`Error::Callback`], [`Error::TransportClosed`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client or settings configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Transport address could not be used.
    #[error("Invalid address {address}: {message}")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// Why it was rejected.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Initial connection attempt failed.
    ///
    /// Surfaced to the caller of `connect`; never retried internally.
    #[error("Connection to {address} failed: {source}")]
    Connect {
        /// Address that was dialed.
        address: String,
        /// Underlying handshake or socket failure.
        #[source]
        source: WsError,
    },

    /// Connection attempt did not complete in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Send attempted without an active connection.
    #[error("Not connected")]
    NotConnected,

    // ========================================================================
    // Receiver Loop Errors
    // ========================================================================
    /// A JSON-shaped inbound frame failed to parse.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the parse failure.
        message: String,
    },

    /// The packet callback failed or panicked.
    #[error("Callback error: {message}")]
    Callback {
        /// Error or panic message from the callback.
        message: String,
    },

    /// Peer closed the connection or the socket failed.
    ///
    /// A normal end of session, not a fault.
    #[error("Transport closed: {reason}")]
    TransportClosed {
        /// What ended the session.
        reason: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid address error.
    #[inline]
    pub fn invalid_address(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Creates a connect error.
    #[inline]
    pub fn connect(address: impl Into<String>, source: WsError) -> Self {
        Self::Connect {
            address: address.into(),
            source,
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a callback error.
    ///
    /// Packet callbacks use this to report their own failures:
    ///
    /// ```ignore
    /// handle(packet).map_err(|e| Error::callback(e.to_string()))
    /// ```
    #[inline]
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            message: message.into(),
        }
    }

    /// Creates a transport closed error.
    #[inline]
    pub fn transport_closed(reason: impl Into<String>) -> Self {
        Self::TransportClosed {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Short label naming the variant, used in error reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "ConfigError",
            Self::InvalidAddress { .. } => "InvalidAddressError",
            Self::Connect { .. } => "ConnectError",
            Self::ConnectionTimeout { .. } => "ConnectionTimeoutError",
            Self::NotConnected => "NotConnectedError",
            Self::Decode { .. } => "DecodeError",
            Self::Callback { .. } => "CallbackError",
            Self::TransportClosed { .. } => "TransportClosedError",
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
            Self::WebSocket(_) => "WebSocketError",
        }
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::ConnectionTimeout { .. }
                | Self::NotConnected
                | Self::TransportClosed { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error can only arise inside the receiver loop.
    ///
    /// Such errors never reach the caller; they are reported and end the session.
    #[inline]
    #[must_use]
    pub fn is_loop_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Callback { .. } | Self::TransportClosed { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::decode("expected value at line 1 column 2");
        assert_eq!(
            err.to_string(),
            "Decode error: expected value at line 1 column 2"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("diagnostic limit must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: diagnostic limit must be positive"
        );
    }

    #[test]
    fn test_connect_error_keeps_source() {
        let err = Error::connect("ws://127.0.0.1:1/", WsError::ConnectionClosed);
        assert!(err.to_string().contains("ws://127.0.0.1:1/"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.kind(), "ConnectError");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::connection_timeout(100).is_connection_error());
        assert!(Error::transport_closed("eof").is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_is_loop_error() {
        assert!(Error::decode("bad").is_loop_error());
        assert!(Error::callback("boom").is_loop_error());
        assert!(!Error::NotConnected.is_loop_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::ConnectionReset, "reset");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), "IoError");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
