//! Room-name normalization.
//!
//! Directory entries, inbound events and operator commands all spell rooms
//! differently (`dev`, `#dev`, `##dev`...). Everything that compares, stores or
//! keys on a room name goes through [`normalize_room`] first.

use serde::Deserialize;

/// Channel marker character.
pub const ROOM_MARKER: char = '#';

/// Normalize a room name for comparison, storage and echo lookups.
///
/// A name led by exactly two markers (`##ops`) is left untouched; every other
/// name has all of its leading markers stripped, so `###general` becomes
/// `general`.
pub fn normalize_room(name: &str) -> &str {
    let stripped = name.trim_start_matches(ROOM_MARKER);
    if name.len() - stripped.len() == 2 {
        name
    } else {
        stripped
    }
}

/// Name to put on the wire when joining or messaging a room.
///
/// Returns `None` when nothing is left after normalization.
pub fn wire_room(name: &str) -> Option<String> {
    let normalized = normalize_room(name.trim());
    if normalized.is_empty() {
        return None;
    }
    if normalized.starts_with(ROOM_MARKER) {
        Some(normalized.to_string())
    } else {
        Some(format!("{ROOM_MARKER}{normalized}"))
    }
}

/// Whether a raw name looks like a room (as opposed to a nickname target).
pub fn is_room(name: &str) -> bool {
    name.starts_with(ROOM_MARKER)
}

/// A room entry from the host directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RoomRef {
    pub name: String,
}

impl RoomRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
