//! Local listening endpoint: unix socket or TCP.
//!
//! The endpoint owns the OS listener. Closing is requested through a
//! [`CancellationToken`] handed in at bind time; a pending [`accept`] then
//! fails with [`AcceptError::Closed`], which is the only clean-stop signal
//! the accept loop needs. Dropping the endpoint releases the socket and,
//! for unix endpoints, unlinks the socket file.
//!
//! [`accept`]: ListeningEndpoint::accept

use std::fmt;
use std::io;
use std::net::SocketAddr;
#[cfg(unix)]
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ServerError;
use crate::util::create_listener;

/// Address of the local listening endpoint.
///
/// Parsed from the `--socket` value: anything that parses as `ip:port`
/// (optionally prefixed with `tcp://`) is a TCP endpoint, everything else
/// (optionally prefixed with `unix:`) is a unix socket path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAddr {
    Tcp(SocketAddr),
    #[cfg(unix)]
    Unix(PathBuf),
}

impl FromStr for LocalAddr {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ServerError::Config("empty listen address".into()));
        }
        if let Some(rest) = s.strip_prefix("tcp://") {
            return rest
                .parse()
                .map(LocalAddr::Tcp)
                .map_err(|_| ServerError::Config(format!("invalid tcp listen address: {rest}")));
        }
        if let Some(rest) = s.strip_prefix("unix:") {
            return unix_addr(rest);
        }
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(LocalAddr::Tcp(addr));
        }
        unix_addr(s)
    }
}

#[cfg(unix)]
fn unix_addr(path: &str) -> Result<LocalAddr, ServerError> {
    Ok(LocalAddr::Unix(PathBuf::from(path)))
}

#[cfg(not(unix))]
fn unix_addr(path: &str) -> Result<LocalAddr, ServerError> {
    Err(ServerError::Config(format!(
        "unix sockets are not supported on this platform: {path}"
    )))
}

impl fmt::Display for LocalAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalAddr::Tcp(addr) => write!(f, "{addr}"),
            #[cfg(unix)]
            LocalAddr::Unix(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Accept failure, classified for the accept loop.
#[derive(Debug, thiserror::Error)]
pub enum AcceptError {
    /// The endpoint was closed on purpose; the loop should stop.
    #[error("listener closed")]
    Closed,
    /// Any other accept failure; the loop should keep going.
    #[error("accept: {0}")]
    Io(#[from] io::Error),
}

enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

/// A bound, listening local endpoint.
pub struct ListeningEndpoint {
    listener: Listener,
    local: LocalAddr,
    closed: CancellationToken,
}

impl ListeningEndpoint {
    /// Bind `addr`. Must be called from within a tokio runtime.
    ///
    /// `backlog` only applies to TCP endpoints. An existing file at a unix
    /// socket path is not removed; binding fails instead.
    pub fn bind(
        addr: &LocalAddr,
        backlog: u32,
        closed: CancellationToken,
    ) -> Result<Self, ServerError> {
        let bind_err = |source: io::Error| ServerError::Bind {
            addr: addr.to_string(),
            source,
        };

        let (listener, local) = match addr {
            LocalAddr::Tcp(sock) => {
                let listener = create_listener(*sock, backlog).map_err(bind_err)?;
                // Port 0 resolves to the real port here.
                let local = LocalAddr::Tcp(listener.local_addr().map_err(bind_err)?);
                (Listener::Tcp(listener), local)
            }
            #[cfg(unix)]
            LocalAddr::Unix(path) => {
                let listener = UnixListener::bind(path).map_err(bind_err)?;
                (Listener::Unix(listener), addr.clone())
            }
        };

        Ok(Self {
            listener,
            local,
            closed,
        })
    }

    /// The bound address.
    pub fn local_addr(&self) -> &LocalAddr {
        &self.local
    }

    /// Accept the next inbound connection.
    ///
    /// Returns the stream and a printable peer label.
    pub async fn accept(&self) -> Result<(InboundStream, String), AcceptError> {
        if self.closed.is_cancelled() {
            return Err(AcceptError::Closed);
        }
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(AcceptError::Closed),
            res = self.accept_inner() => res.map_err(AcceptError::Io),
        }
    }

    async fn accept_inner(&self) -> io::Result<(InboundStream, String)> {
        match &self.listener {
            Listener::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                Ok((InboundStream::Tcp(stream), peer.to_string()))
            }
            #[cfg(unix)]
            Listener::Unix(listener) => {
                let (stream, peer) = listener.accept().await?;
                let label = match peer.as_pathname() {
                    Some(path) => path.display().to_string(),
                    None => format!("{}(unnamed)", self.local),
                };
                Ok((InboundStream::Unix(stream), label))
            }
        }
    }
}

impl Drop for ListeningEndpoint {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let LocalAddr::Unix(path) = &self.local {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "socket file removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove socket file"),
            }
        }
    }
}

/// An accepted inbound connection.
pub enum InboundStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl AsyncRead for InboundStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            InboundStream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            #[cfg(unix)]
            InboundStream::Unix(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for InboundStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            InboundStream::Tcp(s) => Pin::new(s).poll_write(cx, data),
            #[cfg(unix)]
            InboundStream::Unix(s) => Pin::new(s).poll_write(cx, data),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            InboundStream::Tcp(s) => Pin::new(s).poll_flush(cx),
            #[cfg(unix)]
            InboundStream::Unix(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            InboundStream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            #[cfg(unix)]
            InboundStream::Unix(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}
