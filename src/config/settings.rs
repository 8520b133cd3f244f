//! Application settings loaded from config.toml
//!
//! Every field has a default, so an empty or missing file gives a working configuration.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database used when `DATABASE_URL` is not set
    pub database_url: String,
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
    /// Create missing tables on startup
    pub create_schema: bool,
    /// Recompute every order balance on startup
    pub resync_on_startup: bool,
    /// Number of outstanding orders listed on startup
    pub outstanding_limit: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_level: "info".to_string(),
            create_schema: true,
            resync_on_startup: true,
            outstanding_limit: 10,
        }
    }
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is invalid or a field has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading configuration");
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads settings from `path`, or the defaults when the file does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        debug!(path = %path.display(), "No config file, using defaults");
        Ok(AppConfig::default())
    }
}
