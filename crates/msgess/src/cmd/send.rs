use std::fs;

use msgess_frame::{Connection, Message, Payload};
use msgess_transport::connect;
use serde_json::Value;
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let message = resolve_message(&args)?;
    let mut config = args.codec.to_config()?;
    if args.wait {
        config.read_timeout = Some(args.wait_timeout);
    }

    let stream = connect(&args.endpoint).map_err(|err| transport_error("connect failed", err))?;
    let peer = stream.peer_label();
    let mut conn = Connection::with_config_stream(stream, config)
        .map_err(|err| frame_error("connect failed", err))?;

    conn.send(&message)
        .map_err(|err| frame_error("send failed", err))?;
    debug!(endpoint = %args.endpoint, kind = %message.kind(), "message sent");

    if args.wait {
        let reply = conn
            .receive()
            .map_err(|err| frame_error("receive failed", err))?;
        print_message(&reply, &peer, format)?;
    }

    Ok(SUCCESS)
}

fn resolve_message(args: &SendArgs) -> CliResult<Message> {
    let payload = if let Some(text) = &args.text {
        Payload::Text(text.clone())
    } else if let Some(json) = &args.json {
        json_payload(json)?
    } else if let Some(path) = &args.file {
        let data = fs::read(path).map_err(|err| {
            CliError::new(USAGE, format!("failed reading {}: {err}", path.display()))
        })?;
        Payload::Binary(data.into())
    } else {
        return Err(CliError::new(USAGE, "one of --text, --json or --file is required"));
    };
    Ok(Message::new(payload, args.class))
}

/// Pick JsonArray or JsonObject from the document's top-level shape.
fn json_payload(input: &str) -> CliResult<Payload> {
    let value: Value = serde_json::from_str(input)
        .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
    Payload::try_from(value).map_err(|other| {
        CliError::new(
            USAGE,
            format!("--json must be an array or an object, got `{other}`"),
        )
    })
}
