use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, TransportError};
use crate::stream::Stream;
use crate::tcp::TcpEndpoint;
#[cfg(unix)]
use crate::uds::UnixDomainSocket;

/// Where to listen or connect.
///
/// Accepted spellings:
/// - `tcp://127.0.0.1:5568` or plain `127.0.0.1:5568`
/// - `unix:///run/app.sock` or a path containing `/` such as `/tmp/app.sock`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(String),
    Unix(PathBuf),
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason| TransportError::InvalidEndpoint {
            input: input.to_string(),
            reason,
        };

        if let Some(addr) = input.strip_prefix("tcp://") {
            return parse_tcp(addr).ok_or_else(|| invalid("expected tcp://host:port"));
        }
        if let Some(path) = input.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid("unix endpoint needs a path"));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if input.contains('/') {
            return Ok(Self::Unix(PathBuf::from(input)));
        }
        parse_tcp(input).ok_or_else(|| invalid("expected host:port, tcp://, unix:// or a path"))
    }
}

fn parse_tcp(addr: &str) -> Option<Endpoint> {
    let (host, port) = addr.rsplit_once(':')?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return None;
    }
    Some(Endpoint::Tcp(addr.to_string()))
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// Connect to an endpoint (blocking).
pub fn connect(endpoint: &Endpoint) -> Result<Stream> {
    match endpoint {
        Endpoint::Tcp(addr) => TcpEndpoint::connect(addr),
        #[cfg(unix)]
        Endpoint::Unix(path) => UnixDomainSocket::connect(path),
        #[cfg(not(unix))]
        Endpoint::Unix(_) => Err(TransportError::Unsupported("unix domain sockets")),
    }
}

/// A bound listener of either transport kind.
pub enum Listener {
    Tcp(TcpEndpoint),
    #[cfg(unix)]
    Unix(UnixDomainSocket),
}

impl Listener {
    /// Bind a listener for the endpoint.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => TcpEndpoint::bind(addr).map(Self::Tcp),
            #[cfg(unix)]
            Endpoint::Unix(path) => UnixDomainSocket::bind(path).map(Self::Unix),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(TransportError::Unsupported("unix domain sockets")),
        }
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<Stream> {
        match self {
            Self::Tcp(listener) => listener.accept(),
            #[cfg(unix)]
            Self::Unix(listener) => listener.accept(),
        }
    }

    /// The endpoint actually bound (resolves ephemeral TCP ports).
    pub fn local_endpoint(&self) -> Endpoint {
        match self {
            Self::Tcp(listener) => Endpoint::Tcp(listener.local_addr().to_string()),
            #[cfg(unix)]
            Self::Unix(listener) => Endpoint::Unix(listener.path().to_path_buf()),
        }
    }
}
