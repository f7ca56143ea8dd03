use std::fmt::Write as _;
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use msgess_frame::{encode_payload, Message, Payload};
use serde::Serialize;
use serde_json::Value;

use crate::exit::{frame_error, CliResult};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per message.
    Json,
    Table,
    Pretty,
    /// The message body bytes, unframed.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    class: u32,
    kind: &'static str,
    size: usize,
    payload: Value,
    peer: &'a str,
    timestamp: String,
}

pub fn print_message(message: &Message, peer: &str, format: OutputFormat) -> CliResult<()> {
    let body = encode_payload(&message.payload).map_err(|err| frame_error("output", err))?;

    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                class: message.message_class,
                kind: message.kind().name(),
                size: body.len(),
                payload: payload_value(&message.payload),
                peer,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CLASS", "KIND", "SIZE", "PEER", "PAYLOAD"])
                .add_row(vec![
                    message.message_class.to_string(),
                    message.kind().name().to_string(),
                    body.len().to_string(),
                    peer.to_string(),
                    payload_preview(&message.payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "class={} kind={} size={} peer={} payload={}",
                message.message_class,
                message.kind(),
                body.len(),
                peer,
                payload_preview(&message.payload)
            );
        }
        OutputFormat::Raw => print_raw(&body),
    }
    Ok(())
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// JSON rendering: text as a string, JSON as-is, binary as lowercase hex.
fn payload_value(payload: &Payload) -> Value {
    match payload {
        Payload::Binary(data) => Value::String(hex(data)),
        Payload::Text(text) => Value::String(text.clone()),
        Payload::JsonArray(array) => Value::Array(array.clone()),
        Payload::JsonObject(object) => Value::Object(object.clone()),
    }
}

fn payload_preview(payload: &Payload) -> String {
    match payload {
        Payload::Binary(data) if data.len() <= 32 => hex(data),
        Payload::Binary(data) => format!("<binary {} bytes>", data.len()),
        Payload::Text(text) => text.clone(),
        Payload::JsonArray(array) => Value::Array(array.clone()).to_string(),
        Payload::JsonObject(object) => Value::Object(object.clone()).to_string(),
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().fold(String::with_capacity(data.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
