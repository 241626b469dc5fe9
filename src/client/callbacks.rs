//! Callback interface injected into the client.
//!
//! Every method has a default, so implementors override only what they need:
//!
//! ```ignore
//! use tradeagent_ws::{ConnectionCallbacks, Packet, Result};
//!
//! struct Gateway;
//!
//! impl ConnectionCallbacks for Gateway {
//!     fn on_packet(&self, packet: Packet) -> Result<()> {
//!         println!("{packet}");
//!         Ok(())
//!     }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use tracing::info;

use crate::error::Result;
use crate::protocol::Packet;
use crate::report::ErrorReport;

// ============================================================================
// ConnectionCallbacks
// ============================================================================

/// Hooks invoked by the client at lifecycle transitions and for each packet.
///
/// Called from the receiver loop task, so implementations must not block.
pub trait ConnectionCallbacks: Send + Sync + 'static {
    /// Called once after a connection is established.
    fn on_connected(&self) {
        info!("Connected");
    }

    /// Called once per connection when it is torn down.
    fn on_disconnected(&self) {
        info!("Disconnected");
    }

    /// Called for each decoded inbound frame, in arrival order.
    ///
    /// Returning an error (or panicking) ends the session: the error is
    /// reported through [`on_error`](Self::on_error) and the client
    /// disconnects.
    fn on_packet(&self, packet: Packet) -> Result<()> {
        info!(%packet, "Packet received");
        Ok(())
    }

    /// Receives error reports from the receiver loop.
    ///
    /// Defaults to writing the report to stderr.
    fn on_error(&self, report: &ErrorReport) {
        report.write_stderr();
    }
}

// ============================================================================
// LoggingCallbacks
// ============================================================================

/// Callbacks that only log. Used when none are supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCallbacks;

impl ConnectionCallbacks for LoggingCallbacks {}

// ============================================================================
// Tests
// ============================================================================
