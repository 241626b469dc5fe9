//! WebSocket client module.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`WebsocketClient`] | Connect, send, stop |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ConnectionCallbacks`] | Hooks for connect, disconnect, packets, errors |
//! | [`ClientState`] | Lifecycle state |
//!
//! # Lifecycle
//!
//! 1. `connect` opens one connection and fires `on_connected`
//! 2. A receiver loop task dispatches inbound packets to `on_packet`
//! 3. Peer close, read errors, decode or callback failures disconnect
//! 4. `stop` releases the connection; `connect` may be called again

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Callback interface.
pub mod callbacks;

/// Client lifecycle and sending.
pub mod core;

/// Receiver loop task.
mod receiver;

/// Exit signal handling.
mod signal;

/// Client state machine.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{ClientBuilder, ClientConfig};
pub use callbacks::{ConnectionCallbacks, LoggingCallbacks};
pub use self::core::WebsocketClient;
pub use state::ClientState;
