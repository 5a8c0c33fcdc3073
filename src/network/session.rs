//! The protocol seam the monitors are written against.
//!
//! A [`Connector`] opens a [`Session`] for one host. The session reports
//! protocol events in arrival order and accepts outbound commands without
//! blocking. [`super::IrcConnector`] is the production implementation; tests
//! plug in scripted ones.

use super::proto::Outbound;
use crate::error::SessionError;
use crate::state::{ChatEvent, HostConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Protocol events delivered to a monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Registration finished; rooms can be joined.
    Connected,
    /// A chat message or action.
    Chat(ChatEvent),
    /// Notice-class traffic: logged, never persisted.
    Notice {
        from: String,
        target: String,
        text: String,
        timestamp: DateTime<Utc>,
    },
    /// The session is gone. Nothing follows.
    Disconnected { reason: String },
}

/// A live protocol session.
#[async_trait]
pub trait Session: Send {
    /// Next event in arrival order.
    ///
    /// Must be cancel-safe: monitors poll it inside `select!`. Once the
    /// session has ended every call returns `Disconnected`.
    async fn next_event(&mut self) -> SessionEvent;

    /// Queue an outbound command without waiting for the socket.
    fn submit(&self, command: Outbound) -> Result<(), SessionError>;

    fn join(&self, room: &str) -> Result<(), SessionError> {
        self.submit(Outbound::Join(room.to_string()))
    }

    fn send(&self, target: &str, text: &str) -> Result<(), SessionError> {
        self.submit(Outbound::Privmsg {
            target: target.to_string(),
            text: text.to_string(),
        })
    }

    fn quit(&self, reason: &str) -> Result<(), SessionError> {
        self.submit(Outbound::Quit(reason.to_string()))
    }

    fn raw(&self, line: &str) -> Result<(), SessionError> {
        self.submit(Outbound::Raw(line.to_string()))
    }
}

/// Opens sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a session to `host`.
    ///
    /// An error here is a connect-level failure (DNS, refused, TLS, proxy)
    /// and is not retried by the monitor.
    async fn connect(&self, host: &HostConfig) -> Result<Box<dyn Session>, SessionError>;
}
