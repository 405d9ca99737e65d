#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for pkhost
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/pkhost/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

use pk_errors::{ConfigError, Error};
use pk_types::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
}

/// Worker thread configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Upper bound between cancellation polls, and the built-in backend's
    /// delay per progress step
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
}

/// Offline package cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    pub path: Option<PathBuf>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Plain,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            thread_name_prefix: "pk-worker".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Longest poll interval a worker accepts (one minute)
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

impl WorkerConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Plain
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_thread_name_prefix() -> String {
    "pk-worker".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // PK_OUTPUT
        if let Ok(output) = std::env::var("PK_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PK_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // PK_POLL_INTERVAL_MS
        if let Ok(interval) = std::env::var("PK_POLL_INTERVAL_MS") {
            self.worker.poll_interval_ms =
                interval.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "PK_POLL_INTERVAL_MS".to_string(),
                    value: interval,
                })?;
        }

        // PK_CACHE_ENABLED
        if let Ok(enabled) = std::env::var("PK_CACHE_ENABLED") {
            self.cache.enabled = match enabled.as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PK_CACHE_ENABLED".to_string(),
                        value: enabled,
                    }
                    .into())
                }
            };
        }

        // PK_CACHE_PATH
        if let Ok(path) = std::env::var("PK_CACHE_PATH") {
            self.cache.path = Some(PathBuf::from(path));
        }

        self.validate()
    }

    /// Reject values the worker cannot run with
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a poll interval outside
    /// `1..=MAX_POLL_INTERVAL_MS` or an empty thread name prefix.
    pub fn validate(&self) -> Result<(), Error> {
        if !(1..=MAX_POLL_INTERVAL_MS).contains(&self.worker.poll_interval_ms) {
            return Err(ConfigError::InvalidValue {
                field: "worker.poll_interval_ms".to_string(),
                value: self.worker.poll_interval_ms.to_string(),
            }
            .into());
        }
        if self.worker.thread_name_prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "worker.thread_name_prefix".to_string(),
                value: String::new(),
            }
            .into());
        }
        Ok(())
    }

    /// Get the package cache path (with default)
    ///
    /// # Errors
    ///
    /// Returns an error if no path is configured and the system config
    /// directory cannot be determined.
    pub fn cache_path(&self) -> Result<PathBuf, Error> {
        match &self.cache.path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("package-cache.txt")),
        }
    }
}

fn config_dir() -> Result<PathBuf, Error> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join("pkhost"))
}
