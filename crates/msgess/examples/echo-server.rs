//! Minimal echo server: accepts peers one at a time and echoes every message.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --example json-client

use msgess::frame::{Connection, FrameError, Payload};
use msgess::transport::{Endpoint, Listener};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint: Endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:5568".to_string())
        .parse()?;
    let listener = Listener::bind(&endpoint)?;
    eprintln!("Listening on {}", listener.local_endpoint());

    loop {
        let stream = listener.accept()?;
        eprintln!("Peer connected: {}", stream.peer_label());
        let mut conn = Connection::new(stream);

        loop {
            let message = match conn.receive() {
                Ok(message) => message,
                Err(FrameError::ConnectionClosed) => break,
                Err(e) => {
                    eprintln!("Dropping peer: {e}");
                    break;
                }
            };
            eprintln!(
                "Received {} (class {})",
                message.kind(),
                message.message_class
            );
            conn.send(&message)?;

            if let Payload::JsonObject(object) = &message.payload {
                if object.get("close_connection").and_then(|v| v.as_bool()) == Some(true) {
                    eprintln!("Peer asked to close");
                    break;
                }
            }
        }
    }
}
