//! Byte-stream transports for MsgESS.
//!
//! MsgESS frames ride on any reliable, ordered byte stream. This crate
//! provides the two stream kinds the rest of the workspace uses:
//! - TCP sockets (all platforms)
//! - Unix domain sockets (Linux/macOS)
//!
//! Connection lifecycle lives here; the frame codec only ever sees a
//! connected [`Stream`].

pub mod endpoint;
pub mod error;
pub mod stream;
pub mod tcp;

#[cfg(unix)]
pub mod uds;

pub use endpoint::{connect, Endpoint, Listener};
pub use error::{Result, TransportError};
pub use stream::Stream;
pub use tcp::TcpEndpoint;

#[cfg(unix)]
pub use uds::UnixDomainSocket;
