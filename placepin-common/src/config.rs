//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is a single TOML file. Every field has a built-in
//! default, so a missing file or a partial file is never an error.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PLACEPIN_CONFIG`)
//! 3. Platform config directory (`<config_dir>/placepin/config.toml`)
//! 4. Built-in defaults (no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PLACEPIN_CONFIG";

/// Environment variable carrying the provider API key
pub const API_KEY_ENV_VAR: &str = "PLACEPIN_API_KEY";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Quiet interval before a typed query is searched
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Places search scoping
    #[serde(default)]
    pub search: SearchConfig,

    /// Timeout applied to every provider HTTP request
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Minimum spacing between geocode requests
    ///
    /// Default: 20ms (50 requests/second)
    #[serde(default = "default_geocode_min_interval_ms")]
    pub geocode_min_interval_ms: u64,

    /// EventBus channel capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Provider API key (overridden by `PLACEPIN_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Places search scoping applied to every suggestion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Place type filter passed to the provider
    #[serde(default = "default_category")]
    pub category: String,

    /// Origin used by the provider to rank results
    #[serde(default)]
    pub origin: OriginConfig,
}

/// Geographic origin bias
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginConfig {
    pub lat: f64,
    pub lng: f64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_geocode_min_interval_ms() -> u64 {
    20
}

fn default_event_capacity() -> usize {
    100
}

fn default_category() -> String {
    "establishment".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            search: SearchConfig::default(),
            http_timeout_secs: default_http_timeout_secs(),
            geocode_min_interval_ms: default_geocode_min_interval_ms(),
            event_capacity: default_event_capacity(),
            api_key: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            category: default_category(),
            origin: OriginConfig::default(),
        }
    }
}

impl Default for OriginConfig {
    /// Central London
    fn default() -> Self {
        Self {
            lat: 51.51753,
            lng: -0.11213,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Debounce interval as Duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// HTTP request timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Geocode request spacing as Duration
    pub fn geocode_min_interval(&self) -> Duration {
        Duration::from_millis(self.geocode_min_interval_ms)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be at least 1".to_string()));
        }
        if self.search.category.trim().is_empty() {
            return Err(Error::Config("search.category must not be empty".to_string()));
        }
        let OriginConfig { lat, lng } = self.search.origin;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(Error::Config(format!(
                "search.origin out of range: ({}, {})",
                lat, lng
            )));
        }
        Ok(())
    }
}

/// Resolve which config file to read, if any
///
/// Returns `None` when neither an explicit path nor a platform config file
/// exists; callers fall back to built-in defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir()
        .map(|d| d.join("placepin").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

    config.validate()?;
    info!("Loaded TOML configuration from {:?}", path);
    Ok(config)
}

/// Load configuration following the config file priority
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => load_toml_config(&path),
        None => {
            debug!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Resolve the provider API key
///
/// **Priority:** ENV → TOML. Blank values are treated as absent.
pub fn resolve_api_key(config: &TomlConfig) -> Option<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV_VAR) {
        if is_valid_key(&key) {
            debug!("API key loaded from environment variable");
            return Some(key);
        }
    }

    config
        .api_key
        .as_ref()
        .filter(|key| is_valid_key(key))
        .cloned()
}

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Write config to `path`, replacing any existing file
///
/// The file is written to a sibling temp file first and renamed into place.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
