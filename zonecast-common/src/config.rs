//! Bootstrap configuration loading
//!
//! The TOML file holds bootstrap concerns only (port, backend location,
//! logging, playback defaults). Resolution priority:
//! 1. Explicit path (command-line argument)
//! 2. `ZONECAST_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/zonecast/config.toml`)
//! 4. Compiled defaults
//!
//! A missing file is never fatal: a warning is logged and defaults are used.
//! A file that exists but cannot be read or parsed is a configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ZONECAST_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP control surface port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Backend playback API
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Initial controller settings (validated by the player)
    #[serde(default)]
    pub playback: PlaybackDefaults,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            remote: RemoteConfig::default(),
            logging: LoggingConfig::default(),
            playback: PlaybackDefaults::default(),
        }
    }
}

/// Backend API location and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL including the API prefix, e.g. `http://localhost:8000/api/v1`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Raw playback defaults as written in the file (not yet range-checked)
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackDefaults {
    #[serde(default = "default_interval_seconds")]
    pub announcement_interval_seconds: i64,

    #[serde(default = "default_fade_seconds")]
    pub fade_duration_seconds: f64,

    #[serde(default = "default_background_volume")]
    pub background_volume_percent: i64,

    #[serde(default = "default_announcement_volume")]
    pub announcement_volume_percent: i64,
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            announcement_interval_seconds: default_interval_seconds(),
            fade_duration_seconds: default_fade_seconds(),
            background_volume_percent: default_background_volume(),
            announcement_volume_percent: default_announcement_volume(),
        }
    }
}

fn default_port() -> u16 {
    5780
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_interval_seconds() -> i64 {
    300
}

fn default_fade_seconds() -> f64 {
    3.0
}

fn default_background_volume() -> i64 {
    20
}

fn default_announcement_volume() -> i64 {
    100
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load configuration following the priority order above
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("No config directory available, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Determine which config file path applies
///
/// Returns None only when no explicit path is given and the platform has no
/// config directory.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("zonecast").join("config.toml"))
}
