//! MsgESS (Message Exchange over Stream Sockets) framing.
//!
//! Every message travels as one self-delimiting frame:
//! - An 11-byte `MsgESSbegin` header magic and a 4-byte protocol version
//! - 4-byte body length and 4-byte message class (big-endian, non-negative)
//! - A compression flag and a data-kind tag
//! - The (optionally gzip-compressed) body, then a 9-byte `MsgESSend` footer
//!
//! Callers deal in typed [`Message`]s. Every structural invariant is checked
//! before a payload is handed back; decoding is all-or-nothing.

pub mod codec;
pub mod compression;
pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use codec::{
    check_footer, encode_frame, encode_message, FrameHeader, DEFAULT_MAX_MESSAGE_SIZE,
    FOOTER_MAGIC, FOOTER_SIZE, FRAME_OVERHEAD, HEADER_MAGIC, HEADER_SIZE, MAX_BODY_LEN,
    MAX_MESSAGE_CLASS, PROTOCOL_VERSION,
};
pub use config::CodecConfig;
pub use connection::Connection;
pub use error::{ErrorCategory, FrameError, Result};
pub use message::{decode_payload, encode_payload, DataKind, JsonArray, JsonObject, Message, Payload};
pub use reader::FrameReader;
pub use writer::FrameWriter;
