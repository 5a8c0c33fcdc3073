//! Console-to-monitor control plane.
//!
//! The [`ControlRouter`] is built once by the supervisor and never mutated:
//! one bounded command channel and one state watch per host, in directory
//! order. The console holds a clone and addresses a single host or all of them.

use super::MonitorState;
use crate::error::CommandError;
use crate::state::RoomRef;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Commands buffered per monitor.
pub const COMMAND_CHANNEL_SIZE: usize = 16;

/// Operator actions delivered to a monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Send a chat message to a room (or nick).
    Send { room: String, text: String },
    /// Join a room.
    Join { room: RoomRef },
    /// Quit for good with this reason.
    Quit { reason: String },
    /// Pass a protocol line through untouched.
    Raw { line: String },
}

impl MonitorCommand {
    /// Short name for logs and console replies.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Send { .. } => "msg",
            Self::Join { .. } => "join",
            Self::Quit { .. } => "quit",
            Self::Raw { .. } => "raw",
        }
    }
}

#[derive(Debug, Clone)]
struct HostHandle {
    name: String,
    commands: mpsc::Sender<MonitorCommand>,
    state: watch::Receiver<MonitorState>,
}

/// Addresses monitors by host name.
#[derive(Debug, Clone, Default)]
pub struct ControlRouter {
    hosts: Arc<Vec<HostHandle>>,
}

/// Builds a [`ControlRouter`]; consumed by `build`.
#[derive(Debug, Default)]
pub struct ControlRouterBuilder {
    hosts: Vec<HostHandle>,
}

impl ControlRouterBuilder {
    pub fn register(
        &mut self,
        name: &str,
        commands: mpsc::Sender<MonitorCommand>,
        state: watch::Receiver<MonitorState>,
    ) {
        self.hosts.push(HostHandle {
            name: name.to_string(),
            commands,
            state,
        });
    }

    pub fn build(self) -> ControlRouter {
        ControlRouter {
            hosts: Arc::new(self.hosts),
        }
    }
}

impl ControlRouter {
    pub fn builder() -> ControlRouterBuilder {
        ControlRouterBuilder::default()
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.iter().any(|h| h.name == host)
    }

    /// Host names with their current state, in directory order.
    pub fn snapshot(&self) -> Vec<(String, MonitorState)> {
        self.hosts
            .iter()
            .map(|h| (h.name.clone(), *h.state.borrow()))
            .collect()
    }

    /// Deliver `command` to `target`, or to every monitor when `target` is `None`.
    ///
    /// Terminated monitors are skipped. Returns how many monitors accepted it.
    pub async fn dispatch(
        &self,
        target: Option<&str>,
        command: MonitorCommand,
    ) -> Result<usize, CommandError> {
        if let Some(host) = target
            && !self.contains(host)
        {
            return Err(CommandError::UnknownHost(host.to_string()));
        }

        let mut delivered = 0;
        for handle in self
            .hosts
            .iter()
            .filter(|h| target.is_none_or(|t| t == h.name))
        {
            if handle.commands.send(command.clone()).await.is_ok() {
                delivered += 1;
            }
        }

        if delivered == 0 {
            return Err(CommandError::NoMonitors);
        }
        Ok(delivered)
    }
}
