//! Bounded record of the most recent sent and received text.
//!
//! Used only to enrich error reports. Each field is truncated to a fixed
//! number of characters on every write.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;

// ============================================================================
// Constants
// ============================================================================

/// Default number of characters kept per field.
pub const DEFAULT_DIAGNOSTIC_LIMIT: usize = 1000;

// ============================================================================
// DiagnosticSnapshot
// ============================================================================

/// Point-in-time copy of a [`DiagnosticBuffer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSnapshot {
    /// Last sent text, truncated.
    pub sent: Option<String>,
    /// Last received text, truncated.
    pub received: Option<String>,
}

// ============================================================================
// DiagnosticBuffer
// ============================================================================

/// Last sent/received payloads, each bounded to `limit` characters.
///
/// The sender writes `sent`, the receiver loop writes `received`.
#[derive(Debug)]
pub struct DiagnosticBuffer {
    limit: usize,
    sent: Mutex<Option<String>>,
    received: Mutex<Option<String>>,
}

impl DiagnosticBuffer {
    /// Creates an empty buffer with the given per-field limit.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            sent: Mutex::new(None),
            received: Mutex::new(None),
        }
    }

    /// Per-field character limit.
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Records outbound text.
    pub fn record_sent(&self, text: &str) {
        *self.sent.lock() = Some(truncate(text, self.limit).to_owned());
    }

    /// Records inbound text.
    pub fn record_received(&self, text: &str) {
        *self.received.lock() = Some(truncate(text, self.limit).to_owned());
    }

    /// Last recorded outbound text.
    #[must_use]
    pub fn last_sent(&self) -> Option<String> {
        self.sent.lock().clone()
    }

    /// Last recorded inbound text.
    #[must_use]
    pub fn last_received(&self) -> Option<String> {
        self.received.lock().clone()
    }

    /// Copies both fields.
    #[must_use]
    pub fn snapshot(&self) -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            sent: self.last_sent(),
            received: self.last_received(),
        }
    }
}

impl Default for DiagnosticBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSTIC_LIMIT)
    }
}

/// Returns the prefix of `text` holding at most `limit` characters.
#[must_use]
pub fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_empty_by_default() {
        let buffer = DiagnosticBuffer::default();
        assert_eq!(buffer.limit(), DEFAULT_DIAGNOSTIC_LIMIT);
        assert_eq!(buffer.snapshot(), DiagnosticSnapshot::default());
    }

    #[test]
    fn test_short_text_kept_whole() {
        let buffer = DiagnosticBuffer::new(16);
        buffer.record_sent(r#"{"msg":"test"}"#);
        assert_eq!(buffer.last_sent().as_deref(), Some(r#"{"msg":"test"}"#));
        assert!(buffer.last_received().is_none());
    }

    #[test]
    fn test_long_text_truncated() {
        let buffer = DiagnosticBuffer::new(4);
        buffer.record_received("abcdefgh");
        assert_eq!(buffer.last_received().as_deref(), Some("abcd"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("日本語テキスト", 3), "日本語");
        assert_eq!(truncate("ab", 0), "");
    }

    #[test]
    fn test_later_write_replaces_earlier() {
        let buffer = DiagnosticBuffer::new(10);
        buffer.record_sent("first");
        buffer.record_sent("second");
        assert_eq!(buffer.last_sent().as_deref(), Some("second"));
    }

    proptest! {
        #[test]
        fn prop_fields_never_exceed_limit(
            limit in 0usize..64,
            sent in ".{0,200}",
            received in ".{0,200}",
        ) {
            let buffer = DiagnosticBuffer::new(limit);
            buffer.record_sent(&sent);
            buffer.record_received(&received);

            let snapshot = buffer.snapshot();
            let sent_len = snapshot.sent.map(|s| s.chars().count()).unwrap_or(0);
            let received_len = snapshot.received.map(|s| s.chars().count()).unwrap_or(0);
            prop_assert!(sent_len <= limit);
            prop_assert!(received_len <= limit);
        }

        #[test]
        fn prop_truncate_is_prefix(text in ".{0,100}", limit in 0usize..120) {
            let prefix = truncate(&text, limit);
            prop_assert!(text.starts_with(prefix));
        }
    }
}
