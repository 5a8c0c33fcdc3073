//! Core data model shared by the supervisor, monitors and admin console.

mod echo;
mod event;
mod host;
mod room;

pub use echo::EchoState;
pub use event::{ChatEvent, ChatKind};
pub use host::HostConfig;
pub use room::{ROOM_MARKER, RoomRef, is_room, normalize_room, wire_room};
