//! WebSocket transport layer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                         ┌─────────────────┐
//! │  WebsocketClient     │        WebSocket        │  TradeAgent     │
//! │                      │◄───────────────────────►│  server         │
//! │  Connection (write)  │   ws://host:port/ws/    │                 │
//! │  FrameStream (read)  │                         │                 │
//! └──────────────────────┘                         └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Connection handle, open and idempotent close |
//! | `server` | Test harness server |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection handle.
pub mod connection;

/// Test harness server.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, FrameStream, validate_address};
pub use server::{DEFAULT_GREETING, ServerOptions, TestServer};
