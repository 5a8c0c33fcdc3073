//! Per-room echo toggles shared between the admin console and every monitor.

use super::room::normalize_room;
use dashmap::DashMap;
use std::sync::Arc;

/// Operator-controlled "mirror this room to the console" flags.
///
/// One writer (the admin console) and many readers (every monitor, once per
/// chat event). Backed by a sharded `DashMap`, so a toggle never makes a reader
/// wait on another monitor and readers only ever see whole `bool`s.
///
/// Keys are always normalized room names; callers pass raw names.
#[derive(Debug, Clone, Default)]
pub struct EchoState {
    rooms: Arc<DashMap<String, bool>>,
}

impl EchoState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the flag for `room`, returning the new value.
    ///
    /// A room that was never toggled starts at `false`, so the first toggle
    /// turns echo on.
    pub fn toggle(&self, room: &str) -> bool {
        let mut entry = self
            .rooms
            .entry(normalize_room(room).to_string())
            .or_insert(false);
        *entry = !*entry;
        *entry
    }

    /// Whether echo is enabled for `room`. Unknown rooms are off.
    pub fn get(&self, room: &str) -> bool {
        self.rooms
            .get(normalize_room(room))
            .map(|flag| *flag)
            .unwrap_or(false)
    }

    /// Rooms currently echoing, sorted.
    pub fn enabled_rooms(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self
            .rooms
            .iter()
            .filter(|e| *e.value())
            .map(|e| e.key().clone())
            .collect();
        rooms.sort();
        rooms
    }
}
