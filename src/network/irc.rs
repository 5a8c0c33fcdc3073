//! IRC implementation of [`Connector`] / [`Session`].
//!
//! Each session runs two tasks:
//!
//! ```text
//!   socket ──► reader task ──► events (mpsc) ──► monitor
//!                  │ PING/433
//!                  ▼
//!   socket ◄── writer task ◄── outbound (mpsc) ◄── monitor / console
//! ```
//!
//! Both tasks are aborted when the [`IrcSession`] is dropped, so a monitor that
//! reconnects a thousand times never accumulates stale tasks.

use super::proto::{IrcLine, Outbound, action_text};
use super::proxy::{self, ProxyUrl};
use super::session::{Connector, Session, SessionEvent};
use super::stream::ChatStream;
use super::tls::upgrade_to_tls;
use crate::config::NetworkConfig;
use crate::error::SessionError;
use crate::state::{ChatEvent, ChatKind, HostConfig};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, trace, warn};

/// Tagged lines may run far past the classic 512 bytes.
const MAX_LINE_LEN: usize = 16 * 1024;

/// Inbound events buffered ahead of the monitor.
const EVENT_CHANNEL_SIZE: usize = 256;

/// Outbound commands buffered ahead of the socket.
const OUTBOUND_CHANNEL_SIZE: usize = 64;

/// Opens IRC sessions, directly or through the configured proxy.
#[derive(Debug, Clone)]
pub struct IrcConnector {
    proxy: Option<ProxyUrl>,
    verify_cert: bool,
    registration_timeout: Duration,
    idle_timeout: Duration,
    realname: String,
}

impl IrcConnector {
    pub fn new(network: &NetworkConfig) -> Result<Self, SessionError> {
        let proxy = network
            .proxy
            .as_deref()
            .map(str::parse::<ProxyUrl>)
            .transpose()?;
        Ok(Self {
            proxy,
            verify_cert: network.verify_cert,
            registration_timeout: network.registration_timeout(),
            idle_timeout: network.idle_timeout(),
            realname: network.realname.clone(),
        })
    }

    async fn dial(&self, host: &HostConfig) -> Result<TcpStream, SessionError> {
        match &self.proxy {
            Some(proxy) => {
                debug!(proxy = %proxy.host, "Dialing through proxy");
                Ok(proxy::dial(proxy, &host.address, host.port).await?)
            }
            None => Ok(TcpStream::connect((host.address.as_str(), host.port)).await?),
        }
    }

    async fn open_transport(&self, host: &HostConfig) -> Result<ChatStream, SessionError> {
        let tcp_stream = self.dial(host).await?;
        if host.tls {
            Ok(ChatStream::Tls(Box::new(
                upgrade_to_tls(tcp_stream, &host.address, self.verify_cert).await?,
            )))
        } else {
            Ok(ChatStream::Plain(tcp_stream))
        }
    }
}

#[async_trait]
impl Connector for IrcConnector {
    async fn connect(&self, host: &HostConfig) -> Result<Box<dyn Session>, SessionError> {
        info!(address = %host.address, port = host.port, tls = host.tls, "Connecting");

        // Dial and TLS handshake share one deadline.
        let stream = timeout(self.registration_timeout, self.open_transport(host))
            .await
            .map_err(|_| SessionError::Timeout(self.registration_timeout))??;
        debug!(tls = stream.is_tls(), "Transport established");

        let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LEN));
        let (mut sink, lines) = framed.split::<String>();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outbound>(OUTBOUND_CHANNEL_SIZE);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

        let writer = tokio::spawn(async move {
            while let Some(command) = outbound_rx.recv().await {
                trace!(line = %command, "→");
                // LinesCodec terminates with LF; IRC wants CRLF.
                if let Err(e) = sink.send(format!("{command}\r")).await {
                    warn!(error = %e, "Write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Registration goes out before the reader can see a reply.
        outbound_tx
            .try_send(Outbound::Nick(host.nick.clone()))
            .map_err(|_| SessionError::QueueFull)?;
        outbound_tx
            .try_send(Outbound::User {
                user: host.nick.clone(),
                realname: self.realname.clone(),
            })
            .map_err(|_| SessionError::QueueFull)?;

        let reader = tokio::spawn(
            Reader {
                lines,
                events: event_tx,
                outbound: outbound_tx.clone(),
                nick: host.nick.clone(),
                registration_timeout: self.registration_timeout,
                idle_timeout: self.idle_timeout,
            }
            .run(),
        );

        Ok(Box::new(IrcSession {
            events: event_rx,
            outbound: outbound_tx,
            reader,
            writer,
        }))
    }
}

/// A live IRC session.
pub struct IrcSession {
    events: mpsc::Receiver<SessionEvent>,
    outbound: mpsc::Sender<Outbound>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

#[async_trait]
impl Session for IrcSession {
    async fn next_event(&mut self) -> SessionEvent {
        self.events
            .recv()
            .await
            .unwrap_or_else(|| SessionEvent::Disconnected {
                reason: "session closed".to_string(),
            })
    }

    fn submit(&self, command: Outbound) -> Result<(), SessionError> {
        self.outbound.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SessionError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SessionError::Closed,
        })
    }
}

impl Drop for IrcSession {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Inbound half: parses lines, answers keepalives, emits events.
struct Reader {
    lines: SplitStream<Framed<ChatStream, LinesCodec>>,
    events: mpsc::Sender<SessionEvent>,
    outbound: mpsc::Sender<Outbound>,
    nick: String,
    registration_timeout: Duration,
    idle_timeout: Duration,
}

impl Reader {
    async fn run(mut self) {
        let reason = self.read_loop().await;
        info!(reason = %reason, "Session ended");
        let _ = self
            .events
            .send(SessionEvent::Disconnected { reason })
            .await;
    }

    /// Returns the disconnect reason.
    async fn read_loop(&mut self) -> String {
        let registration_deadline = Instant::now() + self.registration_timeout;
        let mut registered = false;
        let mut awaiting_pong = false;

        loop {
            let wait = if registered {
                self.idle_timeout
            } else {
                registration_deadline.saturating_duration_since(Instant::now())
            };

            let line = match timeout(wait, self.lines.next()).await {
                Err(_) if !registered => return "registration timed out".to_string(),
                Err(_) if awaiting_pong => return "ping timeout".to_string(),
                Err(_) => {
                    awaiting_pong = true;
                    let _ = self.outbound.try_send(Outbound::Ping("keepalive".to_string()));
                    continue;
                }
                Ok(None) => return "connection closed by server".to_string(),
                Ok(Some(Err(LinesCodecError::MaxLineLengthExceeded))) => {
                    warn!("Dropped oversized line");
                    continue;
                }
                Ok(Some(Err(LinesCodecError::Io(e)))) => return format!("read error: {e}"),
                Ok(Some(Ok(line))) => line,
            };
            awaiting_pong = false;
            trace!(line = %line, "←");

            let Some(msg) = IrcLine::parse(&line) else {
                continue;
            };

            let event = match msg.command.as_str() {
                "PING" => {
                    let token = msg.param(0).unwrap_or_default().to_string();
                    let _ = self.outbound.try_send(Outbound::Pong(token));
                    continue;
                }
                "001" => {
                    registered = true;
                    if let Some(nick) = msg.param(0) {
                        self.nick = nick.to_string();
                    }
                    SessionEvent::Connected
                }
                "433" if !registered => {
                    self.nick.push('^');
                    info!(nick = %self.nick, "Nickname in use, retrying");
                    let _ = self.outbound.try_send(Outbound::Nick(self.nick.clone()));
                    continue;
                }
                "PRIVMSG" => match chat_event(&msg) {
                    Some(event) => SessionEvent::Chat(event),
                    None => continue,
                },
                "NOTICE" => SessionEvent::Notice {
                    from: msg.nick().unwrap_or("*").to_string(),
                    target: msg.param(0).unwrap_or_default().to_string(),
                    text: msg.param(1).unwrap_or_default().to_string(),
                    timestamp: msg.server_time().unwrap_or_else(Utc::now),
                },
                "ERROR" => {
                    warn!(reason = msg.param(0).unwrap_or_default(), "Server error");
                    continue;
                }
                _ => continue,
            };

            if self.events.send(event).await.is_err() {
                return "session dropped".to_string();
            }
        }
    }
}

fn chat_event(msg: &IrcLine) -> Option<ChatEvent> {
    let room = msg.param(0)?;
    let body = msg.param(1)?;
    let (kind, body) = match action_text(body) {
        Some(text) => (ChatKind::Action, text),
        // Other CTCP (VERSION, PING...) is not chat.
        None if body.starts_with('\x01') => return None,
        None => (ChatKind::Message, body),
    };
    Some(ChatEvent {
        room: room.to_string(),
        author: msg.nick().unwrap_or_default().to_string(),
        body: body.to_string(),
        timestamp: msg.server_time().unwrap_or_else(Utc::now),
        kind,
    })
}
