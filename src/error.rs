//! Unified error handling for slirc-scribe.
//!
//! One enum per failure class so callers can tell a fatal startup problem
//! from a per-host connect failure, a dropped message write or a typo on the
//! admin console.

use crate::config::ConfigError;
use crate::db::DbError;
use crate::network::ProxyError;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Startup Errors (process exits, no monitor starts)
// ============================================================================

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open database: {0}")]
    Database(#[source] DbError),

    #[error("failed to read host directory: {0}")]
    Directory(#[source] DbError),

    #[error("no hosts configured")]
    NoHosts,

    #[error("host {0} is listed more than once")]
    DuplicateHost(String),
}

// ============================================================================
// Session Errors (protocol sessions)
// ============================================================================

/// Errors raised while opening or driving a protocol session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connect failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("proxy: {0}")]
    Proxy(#[from] ProxyError),

    #[error("session closed")]
    Closed,

    #[error("outbound queue full")]
    QueueFull,
}

impl SessionError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Timeout(_) => "timeout",
            Self::Tls(_) => "tls",
            Self::Proxy(_) => "proxy",
            Self::Closed => "closed",
            Self::QueueFull => "queue_full",
        }
    }
}

// ============================================================================
// Command Errors (admin console input)
// ============================================================================

/// Malformed or unroutable admin console input. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0} (try :help)")]
    UnknownCommand(String),

    #[error("{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("invalid room name {0:?}, should start with #")]
    InvalidRoom(String),

    #[error("unknown host: {0}")]
    UnknownHost(String),

    #[error("no monitor accepted the command")]
    NoMonitors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_errors_read_well_on_console() {
        assert_eq!(
            CommandError::InvalidRoom("dev".into()).to_string(),
            "invalid room name \"dev\", should start with #"
        );
        assert_eq!(
            CommandError::MissingArgument {
                command: "msg",
                argument: "a room and text"
            }
            .to_string(),
            "msg needs a room and text"
        );
    }

    #[test]
    fn session_error_codes() {
        assert_eq!(SessionError::Closed.error_code(), "closed");
        assert_eq!(
            SessionError::Timeout(Duration::from_secs(1)).error_code(),
            "timeout"
        );
    }
}
