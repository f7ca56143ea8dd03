//! MsgESS: Message Exchange over Stream Sockets.
//!
//! Applications exchange typed messages (binary, text, JSON array, JSON
//! object) tagged with an integer message class. Each message is one
//! self-delimiting, optionally gzip-compressed frame on a byte stream.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP and Unix-domain byte streams
//! - [`frame`]: the MsgESS frame codec and typed send/receive endpoints
//!
//! ```no_run
//! use msgess::frame::Connection;
//! use msgess::transport::{connect, Endpoint};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint: Endpoint = "127.0.0.1:5568".parse()?;
//! let mut conn = Connection::new(connect(&endpoint)?);
//! conn.send_text("hello", 1)?;
//! let (reply, class) = conn.receive_text()?;
//! println!("{class}: {reply}");
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use msgess_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use msgess_frame::*;
}
