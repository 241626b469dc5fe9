//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Settings loading
//! - Logging initialization

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tradeagent_ws::Settings;
use tradeagent_ws::settings::SETTING_FILENAME;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub settings: PathBuf,
}

impl Args {
    /// Parse command-line arguments.
    ///
    /// `--debug` forces debug logging, `--settings <path>` picks the settings file.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let settings = args
            .iter()
            .position(|a| a == "--settings")
            .and_then(|i| args.get(i + 1))
            .map_or_else(|| PathBuf::from(SETTING_FILENAME), PathBuf::from);

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            settings,
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Load settings, falling back to defaults when the file is absent.
pub fn load_settings(args: &Args) -> tradeagent_ws::Result<Settings> {
    Settings::load_or_default(&args.settings)
}

/// Initialize tracing/logging from settings.
pub fn init_logging(settings: &Settings, debug: bool) {
    let filter = if debug {
        Some("tradeagent_ws=debug".to_owned())
    } else {
        settings.log_filter("tradeagent_ws")
    };

    let Some(filter) = filter else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
