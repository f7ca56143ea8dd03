use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected byte stream over TCP or a Unix domain socket.
///
/// This is the fundamental I/O type returned by transport operations.
/// It wraps either a TCP stream or, on Unix, a Unix domain socket stream.
pub struct Stream {
    inner: StreamInner,
}

enum StreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl From<TcpStream> for Stream {
    fn from(stream: TcpStream) -> Self {
        Self {
            inner: StreamInner::Tcp(stream),
        }
    }
}

#[cfg(unix)]
impl From<std::os::unix::net::UnixStream> for Stream {
    fn from(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: StreamInner::Unix(stream),
        }
    }
}

impl Stream {
    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// Both handles refer to the same connection, which lets one thread
    /// read while another writes.
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            StreamInner::Tcp(stream) => StreamInner::Tcp(stream.try_clone()?),
            #[cfg(unix)]
            StreamInner::Unix(stream) => StreamInner::Unix(stream.try_clone()?),
        };
        Ok(Self { inner })
    }

    /// Shut down the read half, write half, or both.
    ///
    /// A read blocked on another handle of this connection returns once the
    /// read half is shut down.
    pub fn shutdown(&self, how: Shutdown) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.shutdown(how).map_err(Into::into),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.shutdown(how).map_err(Into::into),
        }
    }

    /// Human-readable description of the remote end, for logs and output.
    pub fn peer_label(&self) -> String {
        match &self.inner {
            StreamInner::Tcp(stream) => stream
                .peer_addr()
                .map(|addr| format!("tcp://{addr}"))
                .unwrap_or_else(|_| "tcp://unknown".to_string()),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream
                .peer_addr()
                .ok()
                .and_then(|addr| addr.as_pathname().map(|p| format!("unix://{}", p.display())))
                .unwrap_or_else(|| "unix://unnamed".to_string()),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            StreamInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            StreamInner::Unix(_) => "unix-domain-socket",
        }
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("type", &self.transport_name())
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn cloned_handles_share_the_connection() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = Stream::from(left);
        let reader = Stream::from(right);
        let mut reader_clone = reader.try_clone().unwrap();

        writer.write_all(b"dup").unwrap();
        let mut buf = [0u8; 3];
        reader_clone.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"dup");
        assert_eq!(reader.transport_name(), "unix-domain-socket");
    }

    #[test]
    fn shutdown_unblocks_reader() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let _keep = Stream::from(left);
        let mut reader = Stream::from(right);
        reader.shutdown(Shutdown::Read).unwrap();

        let mut buf = [0u8; 1];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}
