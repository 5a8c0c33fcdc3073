//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Top-level `Config`, database and console blocks
//! - [`network`]: Outbound session settings (proxy, TLS verification, timeouts)
//! - [`reconnect`]: Reconnect backoff policy
//! - [`standalone`]: Single-host mode
//! - [`validation`]: Startup validation

mod defaults;
mod network;
mod reconnect;
mod standalone;
mod types;
pub mod validation;

pub use network::NetworkConfig;
pub use reconnect::ReconnectConfig;
pub use standalone::StandaloneConfig;
pub use types::{Config, ConfigError, ConsoleConfig, DatabaseConfig};
