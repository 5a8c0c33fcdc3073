//! Single-host mode configuration.

use crate::state::{HostConfig, RoomRef};
use serde::Deserialize;

/// One host described directly in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct StandaloneConfig {
    #[serde(flatten)]
    host: HostConfig,
    /// Rooms to join on connect.
    #[serde(default)]
    pub rooms: Vec<RoomRef>,
}

impl StandaloneConfig {
    pub fn host(&self) -> &HostConfig {
        &self.host
    }
}
