//! Integration test common infrastructure.
//!
//! Scripted sessions and in-memory collaborators for monitor/supervisor
//! tests, plus a loopback IRC server for the real adapter.

pub mod fake;
pub mod server;

#[allow(unused_imports)]
pub use fake::{
    BrokenRooms, FakeConnector, MemorySink, SessionHandle, Sessions, context, host, wait_until,
};
#[allow(unused_imports)]
pub use server::{LoopbackServer, ServerConn};
