//! WebSocket payload types.
//!
//! The client does not interpret payloads beyond JSON/text discrimination.
//!
//! | Frame text | Packet |
//! |------------|--------|
//! | `{"a":1}` | [`Packet::Json`] |
//! | `hello` | [`Packet::Text`] |
//! | `[1,2]` | [`Packet::Text`] |

// ============================================================================
// Submodules
// ============================================================================

/// Packet decoding and encoding.
pub mod packet;

// ============================================================================
// Re-exports
// ============================================================================

pub use packet::Packet;
