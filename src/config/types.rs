//! Core configuration types.

use super::network::NetworkConfig;
use super::reconnect::ReconnectConfig;
use super::standalone::StandaloneConfig;
use super::validation::{ValidationError, validate};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{default_database_path, default_marker, default_true};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", format_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Scribe configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Message store / host directory database.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Outbound connection settings shared by every monitor.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Reconnect backoff policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Single-host mode: serve the host directory from this block instead of
    /// the database.
    pub standalone: Option<StandaloneConfig>,
    /// Interactive admin console.
    #[serde(default)]
    pub console: ConsoleConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or ":memory:".
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Admin console configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Read operator commands from stdin.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Character that introduces a console command (default ':').
    #[serde(default = "default_marker")]
    pub marker: char,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker: default_marker(),
        }
    }
}
