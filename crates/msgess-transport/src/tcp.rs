use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::stream::Stream;

/// TCP listener.
pub struct TcpEndpoint {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpEndpoint {
    /// Bind and listen on a TCP address such as `127.0.0.1:5568`.
    ///
    /// Port `0` picks an ephemeral port; see [`TcpEndpoint::local_addr`].
    pub fn bind(addr: &str) -> Result<Self> {
        let bind_err = |source: std::io::Error| TransportError::Bind {
            address: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        info!(%local_addr, "listening on tcp");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Stream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        // Frames are written with a single write followed by a flush;
        // Nagle would only delay them. A socket that refuses is still usable.
        if let Err(err) = stream.set_nodelay(true) {
            warn!(%peer, error = %err, "failed to set TCP_NODELAY");
        }
        debug!(%peer, "accepted tcp connection");
        Ok(Stream::from(stream))
    }

    /// Connect to a listening TCP peer (blocking).
    pub fn connect(addr: &str) -> Result<Stream> {
        let connect_err = |source: std::io::Error| TransportError::Connect {
            address: addr.to_string(),
            source,
        };
        let addrs: Vec<SocketAddr> = addr.to_socket_addrs().map_err(connect_err)?.collect();
        let stream = TcpStream::connect(&addrs[..]).map_err(connect_err)?;
        stream.set_nodelay(true)?;
        debug!(addr, "connected to tcp peer");
        Ok(Stream::from(stream))
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn bind_accept_connect_on_loopback() {
        let listener = TcpEndpoint::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();

        let handle = std::thread::spawn(move || {
            let mut client = TcpEndpoint::connect(&addr).unwrap();
            client.write_all(b"tcp!").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"tcp!");
        assert_eq!(server.transport_name(), "tcp");
        assert!(server.peer_label().starts_with("tcp://127.0.0.1:"));

        handle.join().unwrap();
    }

    #[test]
    fn bind_rejects_unresolvable_address() {
        let result = TcpEndpoint::bind("not an address");
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }
}
