//! Chat events handed from a protocol session to its monitor.

use chrono::{DateTime, Utc};

/// Kind of persisted chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatKind {
    Message,
    Action,
}

impl ChatKind {
    /// Single-letter code stored in `irc_message.typ`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Message => "M",
            Self::Action => "A",
        }
    }
}

/// A chat line observed on a session. Consumed once, never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    /// Target as received (may still carry markers).
    pub room: String,
    pub author: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub kind: ChatKind,
}
