//! Receiver loop.
//!
//! One task per connection. Each iteration reads a frame, decodes it and
//! dispatches it to the packet callback. The loop ends once its connection
//! is no longer the client's live handle, which happens after any
//! disconnect, whether triggered here, by `stop`, or by the peer.
//!
//! # Frame Handling
//!
//! | Frame | Outcome |
//! |-------|---------|
//! | Text / Binary (UTF-8) | decode, dispatch |
//! | Empty Text / Binary | peer close |
//! | Close, end of stream, read error | transport closed |
//! | Ping / Pong | ignored |
//! | JSON-shaped but unparsable | decode error, reported |
//! | Callback error or panic | callback error, reported |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::protocol::Packet;
use crate::transport::{Connection, FrameStream};

use super::core::ClientInner;

// ============================================================================
// Outcome
// ============================================================================

/// Result of handling one read.
#[derive(Debug)]
enum Outcome {
    /// Packet delivered to the callback.
    Dispatched,
    /// Control frame, nothing to do.
    Ignored,
    /// Session ended normally.
    Closed(Error),
    /// Session ended by a fault that must be reported.
    Failed(Error),
}

// ============================================================================
// Loop
// ============================================================================

/// Runs until `connection` stops being the live handle.
pub(crate) async fn run(
    inner: Arc<ClientInner>,
    connection: Arc<Connection>,
    mut frames: FrameStream,
) {
    debug!(address = connection.address(), "Receiver loop started");

    while inner.is_current(&connection) {
        let frame = tokio::select! {
            frame = frames.next() => frame,

            () = connection.closed() => {
                debug!(address = connection.address(), "Connection closed locally");
                inner.disconnect_connection(&connection).await;
                continue;
            }
        };

        match handle_frame(&inner, frame) {
            Outcome::Dispatched | Outcome::Ignored => {}

            Outcome::Closed(reason) => {
                info!(address = connection.address(), %reason, "Connection closed");
                inner.disconnect_connection(&connection).await;
            }

            Outcome::Failed(error) => {
                inner.report(&error);
                inner.disconnect_connection(&connection).await;
            }
        }
    }

    inner.disconnect_connection(&connection).await;
    debug!(address = connection.address(), "Receiver loop terminated");
}

/// Classifies one read and processes data frames.
fn handle_frame(
    inner: &ClientInner,
    frame: Option<std::result::Result<Message, WsError>>,
) -> Outcome {
    let message = match frame {
        Some(Ok(message)) => message,
        Some(Err(e)) => return Outcome::Closed(Error::transport_closed(e.to_string())),
        None => return Outcome::Closed(Error::transport_closed("stream ended")),
    };

    match message {
        Message::Text(text) => process_text(inner, text.as_str()),

        Message::Binary(data) => match std::str::from_utf8(&data) {
            Ok(text) => process_text(inner, text),
            Err(e) => Outcome::Failed(Error::decode(format!(
                "binary frame is not UTF-8: {e}"
            ))),
        },

        Message::Close(frame) => {
            let reason = frame
                .map(|f| {
                    format!("close frame {}: {}", u16::from(f.code), f.reason.as_str())
                })
                .unwrap_or_else(|| "close frame".to_owned());
            Outcome::Closed(Error::transport_closed(reason))
        }

        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
            trace!("Control frame ignored");
            Outcome::Ignored
        }
    }
}

/// Records, decodes and dispatches one text payload.
fn process_text(inner: &ClientInner, text: &str) -> Outcome {
    if text.is_empty() {
        return Outcome::Closed(Error::transport_closed("empty frame"));
    }

    inner.record_received(text);

    match decode_and_dispatch(inner, text) {
        Ok(()) => Outcome::Dispatched,
        Err(e) => Outcome::Failed(e),
    }
}

/// Decodes `text` and passes the packet to the callback.
fn decode_and_dispatch(inner: &ClientInner, text: &str) -> Result<()> {
    let packet = Packet::decode(text)?;
    inner.dispatch(packet)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::client::WebsocketClient;

    fn inner() -> Arc<ClientInner> {
        Arc::clone(&WebsocketClient::default().inner)
    }

    #[test]
    fn test_end_of_stream_is_closed() {
        let outcome = handle_frame(&inner(), None);
        assert!(matches!(outcome, Outcome::Closed(Error::TransportClosed { .. })));
    }

    #[test]
    fn test_read_error_is_closed() {
        let outcome = handle_frame(&inner(), Some(Err(WsError::ConnectionClosed)));
        assert!(matches!(outcome, Outcome::Closed(_)));
    }

    #[test]
    fn test_close_frame_is_closed() {
        let outcome = handle_frame(&inner(), Some(Ok(Message::Close(None))));
        assert!(matches!(outcome, Outcome::Closed(_)));
    }

    #[test]
    fn test_ping_is_ignored() {
        let outcome = handle_frame(&inner(), Some(Ok(Message::Ping(Vec::new().into()))));
        assert!(matches!(outcome, Outcome::Ignored));
    }

    #[test]
    fn test_empty_text_is_peer_close() {
        let inner = inner();
        let outcome = handle_frame(&inner, Some(Ok(Message::text(""))));
        assert!(matches!(outcome, Outcome::Closed(_)));
        assert!(inner.diagnostics_snapshot().received.is_none());
    }

    #[test]
    fn test_text_is_recorded_and_dispatched() {
        let inner = inner();
        let outcome = handle_frame(&inner, Some(Ok(Message::text("hello"))));
        assert!(matches!(outcome, Outcome::Dispatched));
        assert_eq!(inner.diagnostics_snapshot().received.as_deref(), Some("hello"));
    }

    #[test]
    fn test_malformed_json_fails() {
        let inner = inner();
        let outcome = handle_frame(&inner, Some(Ok(Message::text("{oops}"))));
        assert!(matches!(outcome, Outcome::Failed(Error::Decode { .. })));
        assert_eq!(inner.diagnostics_snapshot().received.as_deref(), Some("{oops}"));
    }

    #[test]
    fn test_utf8_binary_is_text() {
        let frame = Message::binary(br#"{"a":1}"#.to_vec());
        let outcome = handle_frame(&inner(), Some(Ok(frame)));
        assert!(matches!(outcome, Outcome::Dispatched));
    }

    #[test]
    fn test_invalid_binary_fails() {
        let frame = Message::binary(vec![0xff, 0xfe]);
        let outcome = handle_frame(&inner(), Some(Ok(frame)));
        assert!(matches!(outcome, Outcome::Failed(Error::Decode { .. })));
    }
}
