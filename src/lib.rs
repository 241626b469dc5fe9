//! TradeAgent WebSocket - resilient client for the exchange gateway.
//!
//! This library connects a trading platform to the TradeAgent exchange's
//! websocket endpoint. It keeps one long-lived connection, runs an
//! independent receive loop, and reports failures with enough context to
//! diagnose them after the fact.
//!
//! # Architecture
//!
//! Key design principles:
//!
//! - Each [`WebsocketClient`] owns at most one connection and one receiver loop
//! - Sends and receives run independently
//! - All receiver loop failures are contained: reported, then disconnected
//! - Closing is close-then-observe; the loop is never forcibly cancelled
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use tradeagent_ws::{ConnectionCallbacks, Packet, Result, WebsocketClient};
//!
//! struct Gateway;
//!
//! impl ConnectionCallbacks for Gateway {
//!     fn on_packet(&self, packet: Packet) -> Result<()> {
//!         println!("Received: {packet}");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = WebsocketClient::builder()
//!         .callbacks(Arc::new(Gateway))
//!         .build()?;
//!
//!     client.connect("ws://127.0.0.1:9443/ws/").await?;
//!     client.send_json(&json!({"msg": "test"})).await?;
//!
//!     client.stop_on_signal().await.ok();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`WebsocketClient`], builder, callbacks, state |
//! | [`diagnostics`] | Bounded last sent/received text |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | [`Packet`] decoding |
//! | [`report`] | [`ErrorReport`] for loop failures |
//! | [`settings`] | Process settings loaded at startup |
//! | [`transport`] | Connection handle and test server |

// ============================================================================
// Modules
// ============================================================================

/// WebSocket client: lifecycle, sending, receiver loop.
pub mod client;

/// Bounded diagnostics for error reports.
pub mod diagnostics;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Payload decoding.
pub mod protocol;

/// Error reports.
pub mod report;

/// Process settings.
pub mod settings;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    ClientBuilder, ClientConfig, ClientState, ConnectionCallbacks, LoggingCallbacks,
    WebsocketClient,
};

// Diagnostics and reports
pub use diagnostics::{DEFAULT_DIAGNOSTIC_LIMIT, DiagnosticBuffer, DiagnosticSnapshot};
pub use report::ErrorReport;

// Error types
pub use error::{Error, Result};

// Payload types
pub use protocol::Packet;

// Settings
pub use settings::{LogLevel, Settings};
