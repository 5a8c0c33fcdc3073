//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::network::ProxyUrl;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("database.path is required")]
    MissingDatabasePath,
    #[error("network.proxy is not a usable socks5 or http proxy url: {url} ({reason})")]
    UnsupportedProxy { url: String, reason: String },
    #[error("reconnect.base_delay_secs ({base}) exceeds max_delay_secs ({max})")]
    BackoffInverted { base: u64, max: u64 },
    #[error("standalone.{0} is required")]
    MissingStandaloneField(&'static str),
    #[error("standalone.port must be non-zero")]
    InvalidStandalonePort,
    #[error("console.marker cannot be whitespace or the room marker, got {0:?}")]
    InvalidMarker(char),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.database.path.trim().is_empty() {
        errors.push(ValidationError::MissingDatabasePath);
    }

    if let Some(proxy) = &config.network.proxy
        && let Err(e) = proxy.parse::<ProxyUrl>()
    {
        errors.push(ValidationError::UnsupportedProxy {
            url: proxy.clone(),
            reason: e.to_string(),
        });
    }

    let reconnect = &config.reconnect;
    if reconnect.base_delay_secs > reconnect.max_delay_secs {
        errors.push(ValidationError::BackoffInverted {
            base: reconnect.base_delay_secs,
            max: reconnect.max_delay_secs,
        });
    }

    if let Some(standalone) = &config.standalone {
        let host = standalone.host();
        if host.name.trim().is_empty() {
            errors.push(ValidationError::MissingStandaloneField("name"));
        }
        if host.address.trim().is_empty() {
            errors.push(ValidationError::MissingStandaloneField("address"));
        }
        if host.nick.trim().is_empty() {
            errors.push(ValidationError::MissingStandaloneField("nick"));
        }
        if host.port == 0 {
            errors.push(ValidationError::InvalidStandalonePort);
        }
    }

    let marker = config.console.marker;
    if marker.is_whitespace() || marker == crate::state::ROOM_MARKER {
        errors.push(ValidationError::InvalidMarker(marker));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
