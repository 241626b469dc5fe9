//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tradeagent_ws::{LoggingCallbacks, WebsocketClient};
//!
//! # fn example() -> tradeagent_ws::Result<()> {
//! let client = WebsocketClient::builder()
//!     .connect_timeout(Duration::from_secs(5))
//!     .diagnostic_limit(500)
//!     .callbacks(Arc::new(LoggingCallbacks))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::diagnostics::DEFAULT_DIAGNOSTIC_LIMIT;
use crate::error::{Error, Result};
use crate::settings::{DEFAULT_CONNECT_TIMEOUT_MS, Settings};

use super::callbacks::{ConnectionCallbacks, LoggingCallbacks};
use super::core::WebsocketClient;

// ============================================================================
// ClientConfig
// ============================================================================

/// Validated client configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Maximum time for one connection attempt.
    pub connect_timeout: Duration,
    /// Characters kept for last sent/received diagnostics.
    pub diagnostic_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            diagnostic_limit: DEFAULT_DIAGNOSTIC_LIMIT,
        }
    }
}

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`WebsocketClient`].
///
/// Use [`WebsocketClient::builder()`] to create a new builder.
#[derive(Clone, Default)]
pub struct ClientBuilder {
    /// Configuration under construction.
    config: ClientConfig,
    /// Callbacks, defaults to [`LoggingCallbacks`].
    callbacks: Option<Arc<dyn ConnectionCallbacks>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("has_callbacks", &self.callbacks.is_some())
            .finish()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded from process settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .connect_timeout(settings.connect_timeout())
            .diagnostic_limit(settings.diagnostic_limit)
    }

    /// Sets the maximum time for one connection attempt.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets how many characters of sent/received text are kept for reports.
    #[inline]
    #[must_use]
    pub fn diagnostic_limit(mut self, limit: usize) -> Self {
        self.config.diagnostic_limit = limit;
        self
    }

    /// Sets the callbacks.
    #[inline]
    #[must_use]
    pub fn callbacks<C: ConnectionCallbacks>(mut self, callbacks: Arc<C>) -> Self {
        let callbacks: Arc<dyn ConnectionCallbacks> = callbacks;
        self.callbacks = Some(callbacks);
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the timeout or diagnostic limit is zero.
    pub fn build(self) -> Result<WebsocketClient> {
        self.validate()?;

        let callbacks = self
            .callbacks
            .unwrap_or_else(|| Arc::new(LoggingCallbacks));

        Ok(WebsocketClient::new(self.config, callbacks))
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<()> {
        if self.config.connect_timeout.is_zero() {
            return Err(Error::config("connect timeout must be greater than zero"));
        }
        if self.config.diagnostic_limit == 0 {
            return Err(Error::config("diagnostic limit must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
