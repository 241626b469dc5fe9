//! Error reports for failures inside the receiver loop.
//!
//! A report bundles the error with the last sent/received text and a
//! backtrace, so a failure can be diagnosed after the session is gone.
//!
//! # Format
//!
//! ```text
//! [2026-10-18T09:30:00.000+00:00]: Unhandled WebSocket Error: DecodeError
//! Cause: Decode error: unable to parse data: ...
//! LastSentText:
//! {"msg":"test"}
//! LastReceivedText:
//! {broken}
//! Exception trace:
//! ...
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::backtrace::Backtrace;
use std::fmt;
use std::io::Write;

use chrono::{DateTime, Local, SecondsFormat};

use crate::diagnostics::DiagnosticBuffer;
use crate::error::Error;

// ============================================================================
// ErrorReport
// ============================================================================

/// Diagnostic record for one loop failure.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    /// When the report was captured.
    pub timestamp: DateTime<Local>,
    /// Error kind label, see [`Error::kind`].
    pub kind: &'static str,
    /// Rendered error message.
    pub cause: String,
    /// Last sent text at capture time.
    pub last_sent: Option<String>,
    /// Last received text at capture time.
    pub last_received: Option<String>,
    /// Backtrace of the thread that built the report.
    ///
    /// This is the receiver loop's stack at capture time. For a callback
    /// panic the panic site is not included; the panic message is carried
    /// in [`ErrorReport::cause`] instead.
    pub trace: String,
}

impl ErrorReport {
    /// Captures a report for `error` with the current diagnostics.
    ///
    /// The backtrace is taken here, in the receiver loop, not where `error`
    /// was raised.
    #[must_use]
    pub fn capture(error: &Error, diagnostics: &DiagnosticBuffer) -> Self {
        let snapshot = diagnostics.snapshot();
        Self {
            timestamp: Local::now(),
            kind: error.kind(),
            cause: error.to_string(),
            last_sent: snapshot.sent,
            last_received: snapshot.received,
            trace: Backtrace::force_capture().to_string(),
        }
    }

    /// Writes the rendered report to stderr.
    ///
    /// Write failures are ignored.
    pub fn write_stderr(&self) {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        let _ = write!(handle, "{self}");
        let _ = handle.flush();
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[{}]: Unhandled WebSocket Error: {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
            self.kind
        )?;
        writeln!(f, "Cause: {}", self.cause)?;
        writeln!(f, "LastSentText:\n{}", self.last_sent.as_deref().unwrap_or("None"))?;
        writeln!(
            f,
            "LastReceivedText:\n{}",
            self.last_received.as_deref().unwrap_or("None")
        )?;
        writeln!(f, "Exception trace:\n{}", self.trace)
    }
}

// ============================================================================
// Tests
// ============================================================================
