//! Host directory entries.

use serde::Deserialize;

/// One remote chat server this process keeps a session with.
///
/// Loaded once at startup and never mutated; the owning monitor holds it
/// behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostConfig {
    /// Unique directory key (e.g. "libera").
    pub name: String,
    /// Server hostname or IP.
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub tls: bool,
    pub nick: String,
}

impl HostConfig {
    /// `address:port` as passed to the socket layer.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_address_and_port() {
        let host = HostConfig {
            name: "libera".into(),
            address: "irc.libera.chat".into(),
            port: 6697,
            tls: true,
            nick: "scribe".into(),
        };
        assert_eq!(host.endpoint(), "irc.libera.chat:6697");
    }
}
