//! Connection monitor: one per host, for the life of the process.
//!
//! ```text
//!   Idle ──► Connecting ──► Connected ──► Disconnected ──┬──► Connecting (backoff)
//!                │                                      └──► Terminated (quit)
//!                └── connect error ──► Terminated
//! ```
//!
//! A monitor owns its session outright. The only things it shares are the
//! [`EchoState`] it reads on every chat event and the console it writes echo
//! lines to. Operator actions reach it through its [`MonitorCommand`] channel.

mod backoff;
mod control;

pub use backoff::{ReconnectPolicy, calculate_backoff};
pub use control::{COMMAND_CHANNEL_SIZE, ControlRouter, ControlRouterBuilder, MonitorCommand};

use crate::config::ReconnectConfig;
use crate::console::ConsoleWriter;
use crate::error::SessionError;
use crate::network::{Connector, Session, SessionEvent};
use crate::state::{ChatEvent, ChatKind, EchoState, HostConfig, is_room, normalize_room, wire_room};
use crate::store::{HostDirectory, MessageSink};
use chrono::Local;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, error, info, warn};

/// Lifecycle state of one monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Terminated,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Terminated => "terminated",
        })
    }
}

/// How a session (or the whole monitor) ended.
///
/// `DisconnectedRetry` never leaves the monitor: it is what a session reports
/// when the monitor should reconnect. The rest are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    DisconnectedRetry,
    DisconnectedFinal,
    ConnectError(String),
    RetriesExhausted,
    /// The monitor task itself died. Only the supervisor reports this.
    Panicked,
}

impl SessionOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::DisconnectedRetry)
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisconnectedRetry => f.write_str("disconnected, retrying"),
            Self::DisconnectedFinal => f.write_str("quit"),
            Self::ConnectError(reason) => write!(f, "connect error: {reason}"),
            Self::RetriesExhausted => f.write_str("gave up reconnecting"),
            Self::Panicked => f.write_str("monitor panicked"),
        }
    }
}

/// Collaborators every monitor shares.
#[derive(Clone)]
pub struct MonitorContext {
    pub connector: Arc<dyn Connector>,
    pub directory: Arc<dyn HostDirectory>,
    pub sink: Arc<dyn MessageSink>,
    pub echo: EchoState,
    pub console: Arc<dyn ConsoleWriter>,
    pub reconnect: ReconnectConfig,
    /// How long to wait for the server to close after QUIT.
    pub quit_grace: Duration,
}

/// Drives one host's session until a terminal outcome.
pub struct ConnectionMonitor {
    host: Arc<HostConfig>,
    ctx: MonitorContext,
    commands: mpsc::Receiver<MonitorCommand>,
    commands_open: bool,
    state: watch::Sender<MonitorState>,
    quit_deadline: Option<Instant>,
}

impl ConnectionMonitor {
    /// Create a monitor and the sender the control plane uses to reach it.
    pub fn new(host: HostConfig, ctx: MonitorContext) -> (Self, mpsc::Sender<MonitorCommand>) {
        let (tx, commands) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (state, _) = watch::channel(MonitorState::Idle);
        let monitor = Self {
            host: Arc::new(host),
            ctx,
            commands,
            commands_open: true,
            state,
            quit_deadline: None,
        };
        (monitor, tx)
    }

    pub fn host(&self) -> &HostConfig {
        &self.host
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: MonitorState) {
        debug!(%state, "Monitor state");
        self.state.send_replace(state);
    }

    fn is_connected(&self) -> bool {
        *self.state.borrow() == MonitorState::Connected
    }

    /// Run connect/event/reconnect cycles until a terminal outcome.
    pub async fn run(mut self) -> SessionOutcome {
        let mut policy = ReconnectPolicy::new(&self.ctx.reconnect);
        let outcome = loop {
            self.set_state(MonitorState::Connecting);
            let mut session = match self.connect().await {
                Ok(Some(session)) => session,
                Ok(None) => break SessionOutcome::DisconnectedFinal,
                Err(e) => {
                    error!(error = %e, code = e.error_code(), "Connect failed");
                    break SessionOutcome::ConnectError(e.to_string());
                }
            };

            let outcome = self.drive(session.as_mut(), &mut policy).await;
            drop(session);
            self.set_state(MonitorState::Disconnected);
            if outcome.is_terminal() {
                break outcome;
            }

            let Some(delay) = policy.next_delay() else {
                warn!(attempts = policy.attempt(), "Reconnect attempts exhausted");
                break SessionOutcome::RetriesExhausted;
            };
            info!(delay_secs = delay.as_secs(), attempt = policy.attempt(), "Reconnecting");
            if self.wait_backoff(delay).await {
                break SessionOutcome::DisconnectedFinal;
            }
        };

        self.set_state(MonitorState::Terminated);
        info!(outcome = %outcome, "Monitor terminated");
        outcome
    }

    /// Open a session. `Ok(None)` means a quit arrived first.
    async fn connect(&mut self) -> Result<Option<Box<dyn Session>>, SessionError> {
        let connector = Arc::clone(&self.ctx.connector);
        let host = Arc::clone(&self.host);
        let connect = connector.connect(&host);
        tokio::pin!(connect);

        loop {
            tokio::select! {
                result = &mut connect => {
                    return result.map(Some);
                }
                command = self.commands.recv(), if self.commands_open => match command {
                    Some(MonitorCommand::Quit { .. }) => {
                        info!("Quit while connecting");
                        return Ok(None);
                    }
                    Some(other) => self.report_dropped(&other),
                    None => self.commands_open = false,
                }
            }
        }
    }

    /// Wait out a reconnect delay. Returns true if a quit arrived meanwhile.
    async fn wait_backoff(&mut self, delay: Duration) -> bool {
        let sleep = sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                command = self.commands.recv(), if self.commands_open => match command {
                    Some(MonitorCommand::Quit { .. }) => {
                        info!("Quit during reconnect delay");
                        return true;
                    }
                    Some(other) => self.report_dropped(&other),
                    None => self.commands_open = false,
                }
            }
        }
    }

    /// Process one session's events in arrival order until it ends.
    async fn drive(
        &mut self,
        session: &mut dyn Session,
        policy: &mut ReconnectPolicy,
    ) -> SessionOutcome {
        self.quit_deadline = None;
        loop {
            let quit_deadline = self.quit_deadline;
            tokio::select! {
                event = session.next_event() => match event {
                    SessionEvent::Connected => {
                        self.set_state(MonitorState::Connected);
                        policy.reset();
                        info!(nick = %self.host.nick, "Connected");
                        self.join_rooms(&mut *session).await;
                    }
                    SessionEvent::Chat(event) => self.handle_chat(event).await,
                    SessionEvent::Notice { from, target, text, timestamp } => {
                        info!(
                            "[{}] {} NOTICE {} {}",
                            timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                            from,
                            target,
                            text
                        );
                    }
                    SessionEvent::Disconnected { reason } => {
                        if self.quit_deadline.is_some() {
                            info!(reason = %reason, "Disconnected after quit");
                            return SessionOutcome::DisconnectedFinal;
                        }
                        warn!(reason = %reason, "Disconnected");
                        return SessionOutcome::DisconnectedRetry;
                    }
                },
                command = self.commands.recv(), if self.commands_open => match command {
                    Some(command) => {
                        if let Some(outcome) = self.handle_command(&*session, command) {
                            return outcome;
                        }
                    }
                    None => self.commands_open = false,
                },
                _ = sleep_until(quit_deadline.unwrap_or_else(Instant::now)), if quit_deadline.is_some() => {
                    info!("Server did not close after quit; giving up on it");
                    return SessionOutcome::DisconnectedFinal;
                }
            }
        }
    }

    async fn join_rooms(&mut self, session: &mut dyn Session) {
        let rooms = match self.ctx.directory.list_rooms(&self.host.name).await {
            Ok(rooms) => rooms,
            Err(e) => {
                warn!(error = %e, "Failed to list rooms; joining none");
                Vec::new()
            }
        };
        if rooms.is_empty() {
            info!("No rooms to join");
        }
        for room in rooms {
            let Some(target) = wire_room(&room.name) else {
                warn!(room = %room.name, "Skipping empty room name");
                continue;
            };
            info!(room = %target, "Joining");
            if let Err(e) = session.join(&target) {
                warn!(room = %target, error = %e, "Join failed");
            }
        }
    }

    async fn handle_chat(&mut self, event: ChatEvent) {
        let event = ChatEvent {
            room: normalize_room(&event.room).to_string(),
            ..event
        };

        if let Err(e) = self.ctx.sink.save(&self.host.name, &event).await {
            warn!(room = %event.room, error = %e, "Failed to persist message; dropped");
        }

        if self.ctx.echo.get(&event.room) {
            self.ctx.console.line(&format_echo(&self.host.name, &event));
        }
    }

    /// Apply an operator command. Returns an outcome when the session must end now.
    fn handle_command(
        &mut self,
        session: &dyn Session,
        command: MonitorCommand,
    ) -> Option<SessionOutcome> {
        if let MonitorCommand::Quit { reason } = &command {
            if self.quit_deadline.is_some() {
                return None;
            }
            info!(reason = %reason, "Quitting");
            if let Err(e) = session.quit(reason) {
                warn!(error = %e, "Quit could not be sent; closing");
                return Some(SessionOutcome::DisconnectedFinal);
            }
            self.quit_deadline = Some(Instant::now() + self.ctx.quit_grace);
            return None;
        }

        if !self.is_connected() {
            self.report_dropped(&command);
            return None;
        }

        let result = match &command {
            MonitorCommand::Send { room, text } => {
                let target = if is_room(room) {
                    wire_room(room)
                } else {
                    Some(room.clone())
                };
                match target {
                    Some(target) => session.send(&target, text),
                    None => {
                        self.console_line(&format!("invalid target {room:?}"));
                        return None;
                    }
                }
            }
            MonitorCommand::Join { room } => match wire_room(&room.name) {
                Some(target) => session.join(&target),
                None => {
                    self.console_line(&format!("invalid room {:?}", room.name));
                    return None;
                }
            },
            MonitorCommand::Raw { line } => session.raw(line),
            MonitorCommand::Quit { .. } => return None,
        };

        if let Err(e) = result {
            warn!(command = command.name(), error = %e, "Send failed");
            self.console_line(&format!("{} failed: {e}", command.name()));
        }
        None
    }

    fn report_dropped(&self, command: &MonitorCommand) {
        warn!(command = command.name(), "Not connected; command dropped");
        self.console_line(&format!("not connected, dropped {}", command.name()));
    }

    fn console_line(&self, text: &str) {
        self.ctx
            .console
            .line(&format!("[{}] {text}", self.host.name));
    }
}

/// `[HH:MM:SS][host][room]author: body`, or `author [ACTION] body` for actions.
pub fn format_echo(host: &str, event: &ChatEvent) -> String {
    let time = event.timestamp.with_timezone(&Local).format("%H:%M:%S");
    match event.kind {
        ChatKind::Message => format!(
            "[{time}][{host}][{}]{}: {}",
            event.room, event.author, event.body
        ),
        ChatKind::Action => format!(
            "[{time}][{host}][{}]{} [ACTION] {}",
            event.room, event.author, event.body
        ),
    }
}
