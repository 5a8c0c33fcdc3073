//! slirc-scribe - multi-host IRC logger.
//!
//! Keeps one long-lived session per configured host, persists every chat line
//! it observes, and lets an operator mirror rooms to the console and act on
//! the sessions from an interactive prompt.

pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod monitor;
pub mod network;
pub mod state;
pub mod store;
pub mod supervisor;
pub mod telemetry;

pub use config::Config;
pub use error::{CommandError, SessionError, StartupError};
pub use monitor::{ConnectionMonitor, ControlRouter, MonitorCommand, MonitorContext, SessionOutcome};
pub use supervisor::Supervisor;
