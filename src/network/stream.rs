//! Chat session stream abstraction.
//!
//! Provides a unified stream type for both plaintext and TLS sessions.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// Either a plaintext TCP stream or a TLS client stream, possibly tunnelled
/// through a proxy underneath.
pub enum ChatStream {
    /// Plaintext TCP connection.
    Plain(TcpStream),
    /// TLS-encrypted client connection.
    Tls(Box<TlsStream<TcpStream>>),
}

impl ChatStream {
    /// Returns true if this is a TLS-encrypted connection.
    pub fn is_tls(&self) -> bool {
        !matches!(self, Self::Plain(_))
    }
}

impl AsyncRead for ChatStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ChatStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            ChatStream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ChatStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            ChatStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            ChatStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ChatStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            ChatStream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ChatStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            ChatStream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}
