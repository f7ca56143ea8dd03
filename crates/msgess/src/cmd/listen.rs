use std::sync::atomic::Ordering;

use msgess_frame::{Connection, FrameError};
use msgess_transport::Listener;
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, ListenArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.codec.to_config()?;
    let listener =
        Listener::bind(&args.endpoint).map_err(|err| transport_error("bind failed", err))?;
    info!(endpoint = %listener.local_endpoint(), "listening");

    let running = install_ctrlc_handler()?;
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let stream = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        let peer = stream.peer_label();
        let mut conn = match Connection::with_config_stream(stream, config.clone()) {
            Ok(conn) => conn,
            Err(err) => {
                warn!(%peer, error = %err, "failed configuring connection");
                continue;
            }
        };

        while running.load(Ordering::SeqCst) {
            let message = match conn.receive() {
                Ok(message) => message,
                Err(FrameError::ConnectionClosed) => break,
                Err(err) if !err.is_fatal_to_connection() => {
                    warn!(%peer, error = %err, "skipping message");
                    continue;
                }
                Err(err) => {
                    warn!(%peer, error = %err, "closing connection");
                    break;
                }
            };

            if let Some(classes) = &args.class {
                if !classes.contains(&message.message_class) {
                    continue;
                }
            }

            print_message(&message, &peer, format)?;
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }
    }

    Ok(SUCCESS)
}
