//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

pub fn default_database_path() -> String {
    "scribe.db".to_string()
}

pub fn default_marker() -> char {
    ':'
}

// =============================================================================
// Network Defaults
// =============================================================================

pub fn default_registration_timeout() -> u64 {
    60
}

pub fn default_idle_timeout() -> u64 {
    300
}

pub fn default_quit_grace() -> u64 {
    10
}

pub fn default_realname() -> String {
    "slirc-scribe".to_string()
}

// =============================================================================
// Reconnect Defaults
// =============================================================================

pub fn default_base_delay() -> u64 {
    5
}

pub fn default_max_delay() -> u64 {
    300
}
