//! Process-wide settings.
//!
//! Settings are loaded once at startup and passed to the components that
//! need them. Keys are flat and dotted, matching the platform's
//! `vt_setting.json` file:
//!
//! ```json
//! {
//!   "server_host": "ws://127.0.0.1:9443/ws/",
//!   "account_id": "A-1001",
//!   "log.active": true,
//!   "log.level": "info",
//!   "log.console": true,
//!   "log.file": true,
//!   "websocket.diagnostic_limit": 1000,
//!   "websocket.connect_timeout_ms": 10000
//! }
//! ```
//!
//! Missing keys keep their defaults. `log.level` also accepts the numeric
//! levels written by older tools (`10` debug through `50` critical). Keys
//! this crate does not know are kept in [`Settings::extra`] and can be read
//! back by prefix with [`Settings::with_prefix`].

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::diagnostics::DEFAULT_DIAGNOSTIC_LIMIT;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default settings file name.
pub const SETTING_FILENAME: &str = "vt_setting.json";

/// Default TradeAgent websocket endpoint.
pub const DEFAULT_SERVER_HOST: &str = "ws://127.0.0.1:9443/ws/";

/// Default connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// LogLevel
// ============================================================================

/// Logging verbosity.
///
/// Deserializes from a name (`"info"`) or a numeric level (`20`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Debug and above.
    Debug,
    /// Info and above.
    #[default]
    Info,
    /// Warnings and errors.
    Warn,
    /// Errors only.
    Error,
    /// Alias for `error`.
    Critical,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error | Self::Critical => "error",
        }
    }

    /// Maps a numeric level onto the nearest level at or below it.
    ///
    /// `10` debug, `20` info, `30` warn, `40` error, `50` critical.
    /// Anything below `10` enables everything.
    #[must_use]
    pub const fn from_number(level: u64) -> Self {
        match level {
            0..10 => Self::Trace,
            10..20 => Self::Debug,
            20..30 => Self::Info,
            30..40 => Self::Warn,
            40..50 => Self::Error,
            _ => Self::Critical,
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "critical" | "fatal" => Ok(Self::Critical),
            other => Err(Error::config(format!("unknown log level '{other}'"))),
        }
    }
}

/// Wire forms accepted for `log.level`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Number(u64),
    Name(String),
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match LevelRepr::deserialize(deserializer)? {
            LevelRepr::Number(level) => Ok(Self::from_number(level)),
            LevelRepr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Gateway and client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Websocket endpoint to connect to.
    pub server_host: String,

    /// Trading account identifier.
    pub account_id: String,

    /// Master logging switch.
    #[serde(rename = "log.active")]
    pub log_active: bool,

    /// Logging verbosity.
    #[serde(rename = "log.level")]
    pub log_level: LogLevel,

    /// Log to the console.
    #[serde(rename = "log.console")]
    pub log_console: bool,

    /// Log to a file. Read by the host application; this crate only logs to
    /// the console.
    #[serde(rename = "log.file")]
    pub log_file: bool,

    /// Characters kept for last sent/received diagnostics.
    #[serde(rename = "websocket.diagnostic_limit")]
    pub diagnostic_limit: usize,

    /// Connect timeout in milliseconds.
    #[serde(rename = "websocket.connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Keys owned by other components, e.g. `font.family`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_SERVER_HOST.to_owned(),
            account_id: String::new(),
            log_active: true,
            log_level: LogLevel::Info,
            log_console: true,
            log_file: true,
            diagnostic_limit: DEFAULT_DIAGNOSTIC_LIMIT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Parses settings from JSON text, filling defaults for missing keys.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not valid JSON for these settings
    /// - [`Error::Config`] if a value is out of range
    pub fn from_json_str(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - see [`Settings::from_json_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let settings = Self::from_json_str(&text)?;
        debug!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Loads settings from a JSON file, or returns defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::load`], except a missing file is not an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.server_host.trim().is_empty() {
            return Err(Error::config("server_host must not be empty"));
        }
        if self.diagnostic_limit == 0 {
            return Err(Error::config(
                "websocket.diagnostic_limit must be greater than 0",
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(Error::config(
                "websocket.connect_timeout_ms must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Connect timeout as a [`Duration`].
    #[inline]
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Tracing filter for `target`, or `None` when console logging is off.
    ///
    /// Example: `tradeagent_ws=info`
    #[must_use]
    pub fn log_filter(&self, target: &str) -> Option<String> {
        if !self.log_active || !self.log_console {
            return None;
        }
        Some(format!("{target}={}", self.log_level.as_directive()))
    }

    /// All settings whose key starts with `prefix`, with the prefix removed.
    ///
    /// Example: `with_prefix("log.")` yields `active`, `level`, `console`
    /// and `file`. An empty prefix returns every key.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Map<String, Value> {
        let Ok(Value::Object(all)) = serde_json::to_value(self) else {
            return Map::new();
        };
        all.into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .map(|rest| (rest.to_owned(), value))
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
