//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Environment variables (`FLOATCHAT_*`)
//! 2. Config file (`~/.floatchat/config.toml`)
//! 3. Defaults

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,

    /// Chat service configuration.
    pub api: ApiConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding persisted chat state.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_floatchat_home(),
        }
    }
}

/// Chat service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the service; `/api/chat` is appended.
    pub base_url: String,

    /// Request timeout in seconds. Unset means wait for completion.
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_seconds: None,
        }
    }
}

impl ApiConfig {
    /// Timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Get the default floatchat home directory.
fn default_floatchat_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".floatchat"), |h| h.join(".floatchat"))
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let config_path = get_config_path();
    if config_path.exists() {
        let contents = fs::read_to_string(&config_path).map_err(Error::Storage)?;
        config = parse_config(&contents)?;
    }

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Parse a TOML config document.
///
/// # Errors
///
/// Returns [`Error::Config`] if the document is not valid TOML for `Config`.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
}

/// Get the path to the config file.
fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("FLOATCHAT_CONFIG") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("FLOATCHAT_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    default_floatchat_home().join("config.toml")
}

/// Apply environment variable overrides to config.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(path) = env::var("FLOATCHAT_STORAGE_PATH") {
        config.storage.path = PathBuf::from(path);
    } else if let Ok(home) = env::var("FLOATCHAT_HOME") {
        config.storage.path = PathBuf::from(home);
    }

    if let Ok(url) = env::var("FLOATCHAT_API_URL") {
        config.api.base_url = url;
    }

    if let Ok(val) = env::var("FLOATCHAT_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.api.timeout_seconds = Some(secs);
        }
    }
}
