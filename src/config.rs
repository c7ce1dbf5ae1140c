//! Configuration management for Flux Nova
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{FluxNovaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Shortest snap duration a sender may pick, in seconds
pub const MIN_SNAP_DURATION_SECS: u32 = 1;

/// Longest snap duration a sender may pick, in seconds
pub const MAX_SNAP_DURATION_SECS: u32 = 10;

/// Main configuration structure for Flux Nova
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Snap viewer behavior
    #[serde(default)]
    pub viewer: ViewerConfig,
    /// Defaults for outgoing snaps
    #[serde(default)]
    pub send: SendConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, without trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static API key sent as `x-api-key` on every request
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout (seconds)
    ///
    /// Applies to every backend call, including the viewer's poll, open and
    /// mark-seen requests. Failed requests are never retried.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://snapchat.epihub.eu".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Snap viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Interval between feed polls (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl ViewerConfig {
    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Outgoing snap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendConfig {
    /// Display duration used when `--duration` is not given (seconds)
    #[serde(default = "default_snap_duration")]
    pub default_duration_secs: u32,
}

fn default_snap_duration() -> u32 {
    5
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_snap_duration(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FluxNovaError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| FluxNovaError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("FLUXNOVA_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(api_key) = std::env::var("FLUXNOVA_API_KEY") {
            self.api.api_key = api_key;
        }

        if let Ok(timeout) = std::env::var("FLUXNOVA_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid FLUXNOVA_REQUEST_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(interval) = std::env::var("FLUXNOVA_POLL_INTERVAL_MS") {
            if let Ok(value) = interval.parse() {
                self.viewer.poll_interval_ms = value;
            } else {
                tracing::warn!("Invalid FLUXNOVA_POLL_INTERVAL_MS: {}", interval);
            }
        }

        if let Ok(duration) = std::env::var("FLUXNOVA_DEFAULT_DURATION") {
            if let Ok(value) = duration.parse() {
                self.send.default_duration_secs = value;
            } else {
                tracing::warn!("Invalid FLUXNOVA_DEFAULT_DURATION: {}", duration);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            tracing::debug!(base_url = %base_url, "CLI override: base URL");
            self.api.base_url = base_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            FluxNovaError::Config(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FluxNovaError::Config(format!(
                "api.base_url must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }

        if self.api.api_key.trim().is_empty() {
            return Err(FluxNovaError::Config(
                "api.api_key must be set (config file or FLUXNOVA_API_KEY)".to_string(),
            )
            .into());
        }

        if self.api.request_timeout_seconds == 0 {
            return Err(FluxNovaError::Config(
                "api.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.viewer.poll_interval_ms == 0 {
            return Err(FluxNovaError::Config(
                "viewer.poll_interval_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if !(MIN_SNAP_DURATION_SECS..=MAX_SNAP_DURATION_SECS)
            .contains(&self.send.default_duration_secs)
        {
            return Err(FluxNovaError::Config(format!(
                "send.default_duration_secs must be between {} and {}",
                MIN_SNAP_DURATION_SECS, MAX_SNAP_DURATION_SECS
            ))
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            viewer: ViewerConfig::default(),
            send: SendConfig::default(),
        }
    }
}
