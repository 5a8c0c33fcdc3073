//! Network module.
//!
//! Outbound IRC sessions: transport (plain, TLS, proxied), line protocol and
//! the [`Session`]/[`Connector`] seam the monitors drive.

mod irc;
pub mod proto;
mod proxy;
mod session;
mod stream;
mod tls;

pub use irc::{IrcConnector, IrcSession};
pub use proxy::{ProxyError, ProxyKind, ProxyUrl};
pub use session::{Connector, Session, SessionEvent};
pub use stream::ChatStream;
