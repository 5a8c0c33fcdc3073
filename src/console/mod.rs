//! Admin console.
//!
//! Two units of work: a reader that turns input into lines on a small
//! channel, and [`AdminConsole::run`], which parses each line and either flips
//! an [`EchoState`] flag or routes an action to the monitors. Neither ever
//! blocks a monitor.

mod command;
mod output;

pub use command::{ConsoleCommand, DEFAULT_QUIT_REASON, help_lines, parse_command};
pub use output::{BufferWriter, ConsoleWriter, StdoutWriter};

use crate::error::CommandError;
use crate::monitor::{ControlRouter, MonitorCommand};
use crate::state::{EchoState, RoomRef, normalize_room};
use crate::telemetry::spans;
use std::io::BufRead;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, warn};

/// Input lines buffered ahead of the processing loop.
pub const INPUT_CHANNEL_SIZE: usize = 4;

/// Read lines from an async source until EOF.
pub fn spawn_reader<R>(input: R) -> mpsc::Receiver<String>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INPUT_CHANNEL_SIZE);
    tokio::spawn(async move {
        let mut lines = input.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Console read failed");
                    break;
                }
            }
        }
        debug!("Console input closed");
    });
    rx
}

/// Read stdin lines on a plain thread.
///
/// A blocking stdin read cannot be cancelled; keeping it off the runtime lets
/// the process exit while the read is still pending.
pub fn spawn_stdin_reader() -> std::io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(INPUT_CHANNEL_SIZE);
    std::thread::Builder::new()
        .name("console-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Console read failed");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Interactive operator console.
pub struct AdminConsole {
    router: ControlRouter,
    echo: EchoState,
    out: Arc<dyn ConsoleWriter>,
    marker: char,
    selected: Option<String>,
}

impl AdminConsole {
    pub fn new(
        router: ControlRouter,
        echo: EchoState,
        out: Arc<dyn ConsoleWriter>,
        marker: char,
    ) -> Self {
        Self {
            router,
            echo,
            out,
            marker,
            selected: None,
        }
    }

    /// Host currently addressed, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Process lines until end of input or `quit`.
    pub async fn run(mut self, mut lines: mpsc::Receiver<String>) {
        self.out.line(&format!(
            "console ready, {}help for commands",
            self.marker
        ));
        while let Some(line) = lines.recv().await {
            if self.handle_line(&line).await.is_break() {
                info!("Console stopped after quit");
                return;
            }
        }
        info!("Console input ended");
    }

    /// Handle one line. `Break` means stop reading.
    pub async fn handle_line(&mut self, line: &str) -> ControlFlow<()> {
        let command = match parse_command(line, self.marker) {
            Ok(Some(command)) => command,
            Ok(None) => return ControlFlow::Continue(()),
            Err(e) => {
                self.report(&e);
                return ControlFlow::Continue(());
            }
        };
        let span = spans::command(command.name(), self.selected.as_deref());
        self.execute(command).instrument(span).await
    }

    async fn execute(&mut self, command: ConsoleCommand) -> ControlFlow<()> {
        match command {
            ConsoleCommand::Show { room } => {
                let enabled = self.echo.toggle(&room);
                let state = if enabled { "on" } else { "off" };
                self.out
                    .line(&format!("echo {state} for {}", normalize_room(&room)));
            }
            ConsoleCommand::Msg { room, text } => {
                self.dispatch(MonitorCommand::Send { room, text }).await;
            }
            ConsoleCommand::Join { room } => {
                self.dispatch(MonitorCommand::Join {
                    room: RoomRef::new(room),
                })
                .await;
            }
            ConsoleCommand::Quit { reason } => {
                self.dispatch(MonitorCommand::Quit { reason }).await;
                return ControlFlow::Break(());
            }
            ConsoleCommand::Use { host: Some(host) } => {
                if self.router.contains(&host) {
                    self.out.line(&format!("addressing {host}"));
                    self.selected = Some(host);
                } else {
                    self.report(&CommandError::UnknownHost(host));
                }
            }
            ConsoleCommand::Use { host: None } => {
                self.selected = None;
                self.out.line("addressing all hosts");
            }
            ConsoleCommand::Hosts => {
                for (name, state) in self.router.snapshot() {
                    let mark = if self.selected.as_deref() == Some(name.as_str()) {
                        " *"
                    } else {
                        ""
                    };
                    self.out.line(&format!("  {name} ({state}){mark}"));
                }
                let echoing = self.echo.enabled_rooms();
                if !echoing.is_empty() {
                    self.out.line(&format!("  echoing: {}", echoing.join(", ")));
                }
            }
            ConsoleCommand::Help => {
                for line in help_lines(self.marker) {
                    self.out.line(&line);
                }
            }
            ConsoleCommand::Raw { line } => {
                self.dispatch(MonitorCommand::Raw { line }).await;
            }
        }
        ControlFlow::Continue(())
    }

    async fn dispatch(&self, command: MonitorCommand) {
        let name = command.name();
        match self.router.dispatch(self.selected.as_deref(), command).await {
            Ok(count) => debug!(command = name, monitors = count, "Dispatched"),
            Err(e) => self.report(&e),
        }
    }

    fn report(&self, error: &CommandError) {
        self.out.line(&format!("error: {error}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{COMMAND_CHANNEL_SIZE, MonitorState};
    use tokio::sync::watch;

    struct Harness {
        console: AdminConsole,
        out: Arc<BufferWriter>,
        echo: EchoState,
        receivers: Vec<mpsc::Receiver<MonitorCommand>>,
        _states: Vec<watch::Sender<MonitorState>>,
    }

    fn harness(hosts: &[&str]) -> Harness {
        let mut builder = ControlRouter::builder();
        let mut receivers = Vec::new();
        let mut states = Vec::new();
        for host in hosts {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            let (state_tx, state_rx) = watch::channel(MonitorState::Connected);
            builder.register(host, tx, state_rx);
            receivers.push(rx);
            states.push(state_tx);
        }
        let out = Arc::new(BufferWriter::new());
        let echo = EchoState::new();
        let console = AdminConsole::new(builder.build(), echo.clone(), out.clone(), ':');
        Harness {
            console,
            out,
            echo,
            receivers,
            _states: states,
        }
    }

    #[tokio::test]
    async fn show_toggles_normalized_echo() {
        let mut h = harness(&["a"]);
        assert!(h.console.handle_line(":show #dev").await.is_continue());
        assert!(h.echo.get("dev"));
        assert_eq!(h.out.lines(), vec!["echo on for dev"]);

        h.console.handle_line(":show #dev").await;
        assert!(!h.echo.get("dev"));
    }

    #[tokio::test]
    async fn invalid_room_is_reported_and_ignored() {
        let mut h = harness(&["a"]);
        h.console.handle_line(":show dev").await;
        assert!(!h.echo.get("dev"));
        assert_eq!(h.out.matching(&["error", "dev"]).len(), 1);
    }

    #[tokio::test]
    async fn msg_broadcasts_without_selection() {
        let mut h = harness(&["a", "b"]);
        h.console.handle_line(":msg #dev hi all").await;
        for rx in &mut h.receivers {
            assert_eq!(
                rx.try_recv().unwrap(),
                MonitorCommand::Send {
                    room: "#dev".into(),
                    text: "hi all".into()
                }
            );
        }
    }

    #[tokio::test]
    async fn use_narrows_addressing() {
        let mut h = harness(&["a", "b"]);
        h.console.handle_line(":use b").await;
        assert_eq!(h.console.selected(), Some("b"));
        h.console.handle_line("WHOIS someone").await;
        assert!(h.receivers[0].try_recv().is_err());
        assert_eq!(
            h.receivers[1].try_recv().unwrap(),
            MonitorCommand::Raw {
                line: "WHOIS someone".into()
            }
        );

        h.console.handle_line(":use nope").await;
        assert_eq!(h.console.selected(), Some("b"));
        assert_eq!(h.out.matching(&["unknown host", "nope"]).len(), 1);

        h.console.handle_line(":use *").await;
        assert_eq!(h.console.selected(), None);
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let mut h = harness(&["a"]);
        assert!(h.console.handle_line(":quit bye").await.is_break());
        assert_eq!(
            h.receivers[0].try_recv().unwrap(),
            MonitorCommand::Quit {
                reason: "bye".into()
            }
        );
    }

    #[tokio::test]
    async fn hosts_lists_state_and_selection() {
        let mut h = harness(&["a", "b"]);
        h.console.handle_line(":use a").await;
        h.console.handle_line(":show #dev").await;
        h.console.handle_line(":hosts").await;
        assert_eq!(h.out.matching(&["a (connected) *"]).len(), 1);
        assert_eq!(h.out.matching(&["b (connected)"]).len(), 1);
        assert_eq!(h.out.matching(&["echoing: dev"]).len(), 1);
    }

    #[tokio::test]
    async fn run_ends_at_end_of_input() {
        let h = harness(&["a"]);
        let out = h.out.clone();
        let input: &[u8] = b":show #dev\n\n:bogus\n";
        let lines = spawn_reader(input);
        h.console.run(lines).await;
        assert!(h.echo.get("dev"));
        assert_eq!(out.matching(&["unknown command", "bogus"]).len(), 1);
    }
}
