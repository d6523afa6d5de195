//! Configuration management for eduapi.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "eduapi";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "session.db";

/// Environment variable that overrides the API base URL.
pub const API_URL_ENV: &str = "EDUAPI_API_URL";

/// Base URL used when nothing overrides it.
pub const DEFAULT_BASE_URL: &str = "/api/";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. `EDUAPI_API_URL` for the base URL
/// 2. Environment variables (prefixed with `EDUAPI_`, nested with `__`)
/// 3. TOML config file at `~/.config/eduapi/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API configuration.
    pub api: ApiConfig,
    /// Session storage configuration.
    pub storage: StorageConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every request path resolves against.
    /// May be relative (`/api/`), in which case it is joined onto `origin`.
    pub base_url: String,
    /// Origin that relative base URLs and the login path are resolved against.
    pub origin: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Client path to navigate to when the session is rejected.
    pub login_path: String,
}

/// Session storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the session database.
    /// Defaults to `~/.local/share/eduapi/session.db`
    pub database_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            origin: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
            login_path: "/login".to_string(),
        }
    }
}

impl ApiConfig {
    /// Resolve the base URL to an absolute URL ending in `/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin or base URL cannot be parsed.
    pub fn resolved_base_url(&self) -> Result<Url> {
        let mut url = match Url::parse(&self.base_url) {
            Ok(url) => url,
            Err(_) => self
                .origin_url()?
                .join(&self.base_url)
                .map_err(|e| Error::invalid_url(&self.base_url, e))?,
        };

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Parse the configured origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url> {
        Url::parse(&self.origin).map_err(|e| Error::invalid_url(&self.origin, e))
    }

    /// Absolute URL of the login entry point.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin or login path cannot be parsed.
    pub fn login_url(&self) -> Result<Url> {
        self.origin_url()?
            .join(&self.login_path)
            .map_err(|e| Error::invalid_url(&self.login_path, e))
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
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
            .merge(Env::prefixed("EDUAPI_").split("__"))
            .merge(
                Env::raw()
                    .only(&[API_URL_ENV])
                    .map(|_| "api.base_url".into()),
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
        if self.api.timeout_secs == 0 {
            return Err(Error::config_validation(
                "timeout_secs must be greater than 0",
            ));
        }

        if !self.api.login_path.starts_with('/') {
            return Err(Error::config_validation(format!(
                "login_path must start with '/': {}",
                self.api.login_path
            )));
        }

        if let Err(e) = self.api.origin_url() {
            return Err(Error::config_validation(format!("origin: {e}")));
        }

        if let Err(e) = self.api.resolved_base_url() {
            return Err(Error::config_validation(format!("base_url: {e}")));
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
}
