use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use msgess_frame::{CodecConfig, Connection, FrameError, Message, Payload};
use msgess_transport::{Listener, Stream};
use serde_json::Value;
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, EchoArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};

/// What to do with a connection after one receive attempt.
#[derive(Debug)]
enum Step {
    Continue,
    Close,
}

pub fn run(args: EchoArgs) -> CliResult<i32> {
    let config = args.codec.to_config()?;
    let listener =
        Listener::bind(&args.endpoint).map_err(|err| transport_error("bind failed", err))?;
    info!(endpoint = %listener.local_endpoint(), "echo server listening");

    let running = install_ctrlc_handler()?;

    while running.load(Ordering::SeqCst) {
        let stream = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        serve(stream, &config, &running);
    }

    Ok(SUCCESS)
}

/// Echo one connection until the peer leaves, asks to close, or breaks framing.
fn serve(stream: Stream, config: &CodecConfig, running: &AtomicBool) {
    let peer = stream.peer_label();
    let mut conn = match Connection::with_config_stream(stream, config.clone()) {
        Ok(conn) => conn,
        Err(err) => {
            warn!(%peer, error = %err, "failed configuring connection");
            return;
        }
    };

    while running.load(Ordering::SeqCst) {
        match echo_once(&mut conn) {
            Ok(Step::Continue) => {}
            Ok(Step::Close) => {
                info!(%peer, "peer requested close");
                break;
            }
            Err(FrameError::ConnectionClosed) => break,
            Err(err) if !err.is_fatal_to_connection() => {
                warn!(%peer, error = %err, "dropping undecodable message");
            }
            Err(err) => {
                warn!(%peer, error = %err, "closing connection");
                break;
            }
        }
    }
}

fn echo_once<S: Read + Write>(conn: &mut Connection<S>) -> Result<Step, FrameError> {
    let message = conn.receive()?;
    info!(
        class = message.message_class,
        kind = %message.kind(),
        "echoing message"
    );
    conn.send(&message)?;
    Ok(if requests_close(&message) {
        Step::Close
    } else {
        Step::Continue
    })
}

/// A JSON object carrying `"close_connection": true`.
fn requests_close(message: &Message) -> bool {
    match &message.payload {
        Payload::JsonObject(object) => {
            matches!(object.get("close_connection"), Some(Value::Bool(true)))
        }
        _ => false,
    }
}
