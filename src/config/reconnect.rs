//! Reconnect backoff configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{default_base_delay, default_max_delay};

/// Backoff applied between a mid-session disconnect and the next connect.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,
    /// Consecutive reconnect attempts before giving up. Unlimited when absent.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl ReconnectConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: default_base_delay(),
            max_delay_secs: default_max_delay(),
            max_attempts: None,
        }
    }
}
