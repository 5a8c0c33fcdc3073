//! Outbound connection configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{
    default_idle_timeout, default_quit_grace, default_realname, default_registration_timeout,
    default_true,
};

/// Settings shared by every outbound session.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Optional proxy URL: `socks5://[user:pass@]host:port` or `http://host:port`.
    #[serde(default)]
    pub proxy: Option<String>,
    /// Verify server certificates on TLS hosts.
    /// Set to false only for self-signed test servers.
    #[serde(default = "default_true")]
    pub verify_cert: bool,
    /// Seconds to wait for the server welcome after connecting.
    #[serde(default = "default_registration_timeout")]
    pub registration_timeout_secs: u64,
    /// Seconds of silence before a keepalive PING; a second silent interval
    /// drops the session.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Seconds to wait for the server to close after QUIT.
    #[serde(default = "default_quit_grace")]
    pub quit_grace_secs: u64,
    /// USER realname.
    #[serde(default = "default_realname")]
    pub realname: String,
}

impl NetworkConfig {
    pub fn registration_timeout(&self) -> Duration {
        Duration::from_secs(self.registration_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn quit_grace(&self) -> Duration {
        Duration::from_secs(self.quit_grace_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            verify_cert: true,
            registration_timeout_secs: default_registration_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            quit_grace_secs: default_quit_grace(),
            realname: default_realname(),
        }
    }
}
