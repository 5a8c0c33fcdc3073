//! Scripted protocol sessions and in-memory collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use slirc_scribe::SessionError;
use slirc_scribe::config::ReconnectConfig;
use slirc_scribe::console::ConsoleWriter;
use slirc_scribe::db::DbError;
use slirc_scribe::monitor::MonitorContext;
use slirc_scribe::network::proto::Outbound;
use slirc_scribe::network::{Connector, Session, SessionEvent};
use slirc_scribe::state::{ChatEvent, ChatKind, EchoState, HostConfig};
use slirc_scribe::store::{HostDirectory, MessageSink};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

/// Test-side handle on one fake session.
#[derive(Clone)]
pub struct SessionHandle {
    pub host: String,
    events: mpsc::UnboundedSender<SessionEvent>,
    sent: Arc<Mutex<Vec<Outbound>>>,
}

impl SessionHandle {
    pub fn connected(&self) {
        let _ = self.events.send(SessionEvent::Connected);
    }

    pub fn chat(&self, room: &str, author: &str, body: &str, kind: ChatKind) {
        let _ = self.events.send(SessionEvent::Chat(ChatEvent {
            room: room.to_string(),
            author: author.to_string(),
            body: body.to_string(),
            timestamp: Utc::now(),
            kind,
        }));
    }

    pub fn notice(&self, from: &str, text: &str) {
        let _ = self.events.send(SessionEvent::Notice {
            from: from.to_string(),
            target: "scribe".to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn disconnect(&self, reason: &str) {
        let _ = self.events.send(SessionEvent::Disconnected {
            reason: reason.to_string(),
        });
    }

    /// Everything the monitor has submitted so far.
    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().clone()
    }

    /// Wait until the monitor has submitted something matching `pred`.
    pub async fn wait_sent(&self, pred: impl Fn(&Outbound) -> bool) -> Outbound {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(found) = self.sent.lock().iter().find(|o| pred(o)).cloned() {
                return found;
            }
            assert!(
                Instant::now() < deadline,
                "timed out waiting for outbound on {}; saw {:?}",
                self.host,
                self.sent()
            );
            sleep(Duration::from_millis(10)).await;
        }
    }
}

struct FakeSession {
    events: mpsc::UnboundedReceiver<SessionEvent>,
    loopback: mpsc::UnboundedSender<SessionEvent>,
    sent: Arc<Mutex<Vec<Outbound>>>,
    closed: bool,
    closes_on_quit: bool,
}

#[async_trait]
impl Session for FakeSession {
    async fn next_event(&mut self) -> SessionEvent {
        if self.closed {
            return SessionEvent::Disconnected {
                reason: "closed".into(),
            };
        }
        let event = self.events.recv().await.unwrap_or(SessionEvent::Disconnected {
            reason: "script ended".into(),
        });
        if matches!(event, SessionEvent::Disconnected { .. }) {
            self.closed = true;
        }
        event
    }

    fn submit(&self, command: Outbound) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let is_quit = matches!(command, Outbound::Quit(_));
        self.sent.lock().push(command);
        if is_quit && self.closes_on_quit {
            // Servers close the link after QUIT.
            let _ = self.loopback.send(SessionEvent::Disconnected {
                reason: "quit".into(),
            });
        }
        Ok(())
    }
}

/// Connector whose sessions are driven by the test.
pub struct FakeConnector {
    refused: HashSet<String>,
    ignores_quit: HashSet<String>,
    panics: HashSet<String>,
    auto_connect: bool,
    opened: mpsc::UnboundedSender<SessionHandle>,
}

/// Receives every session a [`FakeConnector`] opens.
pub struct Sessions {
    rx: mpsc::UnboundedReceiver<SessionHandle>,
    pending: Vec<SessionHandle>,
}

impl Sessions {
    /// Next session opened for `host`.
    pub async fn next_for(&mut self, host: &str) -> SessionHandle {
        if let Some(pos) = self.pending.iter().position(|s| s.host == host) {
            return self.pending.remove(pos);
        }
        let deadline = Duration::from_secs(5);
        loop {
            let handle = tokio::time::timeout(deadline, self.rx.recv())
                .await
                .unwrap_or_else(|_| panic!("no session opened for {host}"))
                .expect("connector dropped");
            if handle.host == host {
                return handle;
            }
            self.pending.push(handle);
        }
    }
}

impl FakeConnector {
    /// Sessions report `Connected` as soon as they open.
    pub fn new() -> (Self, Sessions) {
        Self::build(true)
    }

    /// Sessions stay in registration until the test calls `connected()`.
    pub fn manual() -> (Self, Sessions) {
        Self::build(false)
    }

    fn build(auto_connect: bool) -> (Self, Sessions) {
        let (opened, rx) = mpsc::unbounded_channel();
        (
            Self {
                refused: HashSet::new(),
                ignores_quit: HashSet::new(),
                panics: HashSet::new(),
                auto_connect,
                opened,
            },
            Sessions {
                rx,
                pending: Vec::new(),
            },
        )
    }

    /// Make every connect to `host` fail.
    pub fn refuse(mut self, host: &str) -> Self {
        self.refused.insert(host.to_string());
        self
    }

    /// Sessions for `host` keep the link open after QUIT.
    pub fn ignore_quit(mut self, host: &str) -> Self {
        self.ignores_quit.insert(host.to_string());
        self
    }

    /// Connecting to `host` panics inside the monitor task.
    pub fn panic_on(mut self, host: &str) -> Self {
        self.panics.insert(host.to_string());
        self
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, host: &HostConfig) -> Result<Box<dyn Session>, SessionError> {
        if self.panics.contains(&host.name) {
            panic!("connector blew up for {}", host.name);
        }
        if self.refused.contains(&host.name) {
            return Err(SessionError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let handle = SessionHandle {
            host: host.name.clone(),
            events: tx.clone(),
            sent: Arc::clone(&sent),
        };
        if self.auto_connect {
            handle.connected();
        }
        let _ = self.opened.send(handle);
        Ok(Box::new(FakeSession {
            events: rx,
            loopback: tx,
            sent,
            closed: false,
            closes_on_quit: !self.ignores_quit.contains(&host.name),
        }))
    }
}

/// Message sink held in memory.
#[derive(Default)]
pub struct MemorySink {
    saved: Mutex<Vec<(String, ChatEvent)>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Vec<(String, ChatEvent)> {
        self.saved.lock().clone()
    }

    /// Wait until at least `count` events are stored.
    pub async fn wait_for(&self, count: usize) -> Vec<(String, ChatEvent)> {
        wait_until(|| self.saved.lock().len() >= count).await;
        self.saved()
    }
}

#[async_trait]
impl MessageSink for MemorySink {
    async fn save(&self, host: &str, event: &ChatEvent) -> Result<(), DbError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::InvalidRow("sink offline".into()));
        }
        self.saved.lock().push((host.to_string(), event.clone()));
        Ok(())
    }
}

/// Directory whose room listing always fails.
pub struct BrokenRooms(pub Vec<HostConfig>);

#[async_trait]
impl HostDirectory for BrokenRooms {
    async fn list_hosts(&self) -> Result<Vec<HostConfig>, DbError> {
        Ok(self.0.clone())
    }

    async fn list_rooms(&self, host: &str) -> Result<Vec<slirc_scribe::state::RoomRef>, DbError> {
        Err(DbError::HostNotFound(host.to_string()))
    }
}

pub fn host(name: &str) -> HostConfig {
    HostConfig {
        name: name.to_string(),
        address: format!("irc.{name}.test"),
        port: 6667,
        tls: false,
        nick: "scribe".to_string(),
    }
}

/// Monitor context with instant reconnects and a short quit grace.
pub fn context(
    connector: impl Connector + 'static,
    directory: impl HostDirectory + 'static,
    sink: Arc<MemorySink>,
    echo: EchoState,
    console: Arc<dyn ConsoleWriter>,
) -> MonitorContext {
    MonitorContext {
        connector: Arc::new(connector),
        directory: Arc::new(directory),
        sink,
        echo,
        console,
        reconnect: ReconnectConfig {
            base_delay_secs: 0,
            max_delay_secs: 0,
            max_attempts: None,
        },
        quit_grace: Duration::from_millis(500),
    }
}

/// Poll `cond` until it holds, panicking after five seconds.
pub async fn wait_until(cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        sleep(Duration::from_millis(10)).await;
    }
}
