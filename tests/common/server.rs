//! Minimal loopback IRC server for exercising the real session adapter.

#![allow(dead_code)]

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

/// A listening socket on an ephemeral port.
pub struct LoopbackServer {
    listener: TcpListener,
    port: u16,
}

impl LoopbackServer {
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Accept the next client.
    pub async fn accept(&self) -> anyhow::Result<ServerConn> {
        let (stream, _) = timeout(Duration::from_secs(5), self.listener.accept()).await??;
        Ok(ServerConn::new(stream))
    }
}

/// Server side of one client connection.
pub struct ServerConn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ServerConn {
    fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    /// Send one line, CRLF appended.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Next line from the client with the terminator removed.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("client closed the connection");
        }
        anyhow::ensure!(line.ends_with("\r\n"), "line not CRLF terminated: {line:?}");
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read lines until one starts with `prefix`.
    pub async fn recv_until(&mut self, prefix: &str) -> anyhow::Result<String> {
        loop {
            let line = self.recv().await?;
            if line.starts_with(prefix) {
                return Ok(line);
            }
        }
    }

    /// Consume NICK/USER and send the welcome.
    pub async fn register(&mut self, nick: &str) -> anyhow::Result<()> {
        let first = self.recv().await?;
        anyhow::ensure!(first == format!("NICK {nick}"), "unexpected {first:?}");
        let second = self.recv().await?;
        anyhow::ensure!(second.starts_with("USER "), "unexpected {second:?}");
        self.send(&format!(":irc.test 001 {nick} :Welcome")).await
    }

    /// Close the connection from the server side.
    pub async fn close(mut self) {
        let _ = self.writer.shutdown().await;
    }
}
