//! Client state machine.
//!
//! The state and the connection handle are stored together in a [`Session`]
//! and only change together, so the handle is present exactly when the state
//! is [`ClientState::Connected`].
//!
//! ```text
//! Disconnected ──connect──► Connecting ──opened──► Connected
//!      ▲                        │                     │
//!      └────────failed──────────┘◄───closed / error───┘
//!
//! any ──stop──► Stopping ──connect──► Connecting
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

// ============================================================================
// ClientState
// ============================================================================

/// Lifecycle state of a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// No connection.
    #[default]
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Connection open, receiver loop running.
    Connected,
    /// Stop requested; stays here until the next connect.
    Stopping,
}

impl ClientState {
    /// Returns `true` for `Connecting` and `Connected`.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Session
// ============================================================================

/// State plus the live handle, mutated under one lock.
#[derive(Debug)]
pub(crate) struct Session<H> {
    state: ClientState,
    handle: Option<Arc<H>>,
}

impl<H> Default for Session<H> {
    fn default() -> Self {
        Self {
            state: ClientState::Disconnected,
            handle: None,
        }
    }
}

impl<H> Session<H> {
    /// Current state.
    #[inline]
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Clone of the live handle, if connected.
    #[inline]
    pub fn handle(&self) -> Option<Arc<H>> {
        self.handle.clone()
    }

    /// Returns `true` if `handle` is the live handle.
    pub fn is_current(&self, handle: &Arc<H>) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, handle))
    }

    /// Enters `Connecting` unless a connection is already active.
    ///
    /// Returns `false` when already `Connecting` or `Connected`.
    pub fn begin_connect(&mut self) -> bool {
        if self.state.is_active() {
            return false;
        }
        self.state = ClientState::Connecting;
        true
    }

    /// Installs a freshly opened handle.
    ///
    /// Returns `false` if the attempt was superseded (for example by `stop`),
    /// in which case the handle is not stored.
    pub fn install(&mut self, handle: Arc<H>) -> bool {
        if self.state != ClientState::Connecting {
            return false;
        }
        self.handle = Some(handle);
        self.state = ClientState::Connected;
        true
    }

    /// Reverts a failed connection attempt.
    pub fn abort_connect(&mut self) {
        if self.state == ClientState::Connecting {
            self.state = ClientState::Disconnected;
        }
    }

    /// Takes the live handle, leaving the session disconnected.
    ///
    /// `Stopping` is preserved.
    pub fn take(&mut self) -> Option<Arc<H>> {
        let handle = self.handle.take();
        if self.state == ClientState::Connected {
            self.state = ClientState::Disconnected;
        }
        handle
    }

    /// Takes the live handle only if it is `handle`.
    pub fn take_if_current(&mut self, handle: &Arc<H>) -> Option<Arc<H>> {
        if self.is_current(handle) {
            self.take()
        } else {
            None
        }
    }

    /// Enters `Stopping` and takes the live handle.
    pub fn begin_stop(&mut self) -> Option<Arc<H>> {
        self.state = ClientState::Stopping;
        self.handle.take()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_coupled(session: &Session<u8>) {
        assert_eq!(
            session.handle().is_some(),
            session.state() == ClientState::Connected,
            "handle presence must match Connected in state {}",
            session.state()
        );
    }

    #[test]
    fn test_default_is_disconnected() {
        let session = Session::<u8>::default();
        assert_eq!(session.state(), ClientState::Disconnected);
        assert_coupled(&session);
    }

    #[test]
    fn test_connect_then_install() {
        let mut session = Session::default();
        assert!(session.begin_connect());
        assert_eq!(session.state(), ClientState::Connecting);
        assert_coupled(&session);

        assert!(session.install(Arc::new(1u8)));
        assert_eq!(session.state(), ClientState::Connected);
        assert_coupled(&session);
    }

    #[test]
    fn test_second_connect_is_rejected() {
        let mut session = Session::<u8>::default();
        assert!(session.begin_connect());
        assert!(!session.begin_connect());

        session.install(Arc::new(1));
        assert!(!session.begin_connect());
    }

    #[test]
    fn test_failed_connect_reverts() {
        let mut session = Session::<u8>::default();
        session.begin_connect();
        session.abort_connect();
        assert_eq!(session.state(), ClientState::Disconnected);
        assert_coupled(&session);
    }

    #[test]
    fn test_take_is_idempotent() {
        let mut session = Session::default();
        session.begin_connect();
        session.install(Arc::new(1u8));

        assert!(session.take().is_some());
        assert!(session.take().is_none());
        assert_eq!(session.state(), ClientState::Disconnected);
        assert_coupled(&session);
    }

    #[test]
    fn test_take_if_current_ignores_stale_handle() {
        let mut session = Session::default();
        let stale = Arc::new(1u8);
        let live = Arc::new(2u8);

        session.begin_connect();
        session.install(Arc::clone(&live));

        assert!(session.take_if_current(&stale).is_none());
        assert_eq!(session.state(), ClientState::Connected);

        assert!(session.take_if_current(&live).is_some());
        assert_coupled(&session);
    }

    #[test]
    fn test_stop_wins_over_pending_connect() {
        let mut session = Session::default();
        session.begin_connect();

        assert!(session.begin_stop().is_none());
        assert!(!session.install(Arc::new(1u8)));
        assert_eq!(session.state(), ClientState::Stopping);
        assert_coupled(&session);

        session.abort_connect();
        assert_eq!(session.state(), ClientState::Stopping);
    }

    #[test]
    fn test_stop_then_reconnect() {
        let mut session = Session::default();
        session.begin_connect();
        session.install(Arc::new(1u8));

        assert!(session.begin_stop().is_some());
        assert_eq!(session.state(), ClientState::Stopping);
        assert!(session.take().is_none());
        assert_eq!(session.state(), ClientState::Stopping);

        assert!(session.begin_connect());
        assert!(session.install(Arc::new(2u8)));
        assert_coupled(&session);
    }

    #[test]
    fn test_is_active() {
        assert!(ClientState::Connecting.is_active());
        assert!(ClientState::Connected.is_active());
        assert!(!ClientState::Disconnected.is_active());
        assert!(!ClientState::Stopping.is_active());
    }
}
