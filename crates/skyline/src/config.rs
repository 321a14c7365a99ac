//! Configuration management for skyline.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "skyline";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "skyline.db";

/// Default directory for persisted scan results: a `scanresults` sibling of
/// the service root, which is the working directory of the process.
const SCAN_RESULTS_DIR: &str = "../scanresults";

/// Default upstream flight-data API.
pub const AERODATABOX_BASE_URL: &str = "https://aerodatabox.p.rapidapi.com";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. `PORT` and `AERODATABOX_API_KEY` environment variables
/// 2. Environment variables prefixed with `SKYLINE_` (`__` separates sections)
/// 3. TOML config file at `~/.config/skyline/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP service configuration.
    pub server: ServerConfig,
    /// Scan result persistence configuration.
    pub scans: ScansConfig,
    /// Upstream flight-data API configuration.
    pub flight_api: FlightApiConfig,
    /// Local key-value storage configuration.
    pub storage: StorageConfig,
}

/// HTTP service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

/// Scan result persistence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScansConfig {
    /// Directory that receives `flugtickets-*.json` files.
    pub output_dir: PathBuf,
}

/// Upstream flight-data API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightApiConfig {
    /// Base URL of the API.
    pub base_url: String,
    /// `RapidAPI` key. Lookups fail closed when unset.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/skyline/skyline.db`
    pub database_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for ScansConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(SCAN_RESULTS_DIR),
        }
    }
}

impl Default for FlightApiConfig {
    fn default() -> Self {
        Self {
            base_url: AERODATABOX_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("SKYLINE_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
            .merge(
                Env::raw()
                    .only(&["AERODATABOX_API_KEY"])
                    .map(|_| "flight_api.api_key".into()),
            );

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::ConfigValidation {
                message: "server.port must be greater than 0".to_string(),
            });
        }

        if self.server.max_body_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "server.max_body_bytes must be greater than 0".to_string(),
            });
        }

        if self.flight_api.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "flight_api.timeout_secs must be greater than 0".to_string(),
            });
        }

        let base_url = &self.flight_api.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::ConfigValidation {
                message: format!("flight_api.base_url must be an http(s) URL: {base_url}"),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the socket address string the service binds to.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl FlightApiConfig {
    /// Upstream request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
