use std::io::{ErrorKind, Read};

use bytes::Bytes;
use msgess_transport::Stream;
use tracing::{debug, warn};

use crate::codec::{check_footer, FrameHeader, FOOTER_SIZE, HEADER_SIZE};
use crate::compression::decompress;
use crate::config::CodecConfig;
use crate::error::{ErrorCategory, FrameError, Result};
use crate::message::{decode_payload, JsonArray, JsonObject, Message};

/// Bodies are grown as bytes arrive rather than allocated from the declared
/// length up front.
const INITIAL_BODY_CAPACITY: usize = 64 * 1024;

/// Reads complete messages from any `Read` stream.
///
/// Reads are exact-length: the reader never consumes bytes beyond the frame
/// it is decoding, so a frame rejected at the header leaves the rest of the
/// stream untouched.
///
/// `max_message_size` bounds the body as it sits on the wire. A compressed
/// body is inflated in full with no separate limit, so a small gzip body can
/// expand far beyond `max_message_size`; peers that are not trusted should be
/// read with compression accounted for at a higher layer.
pub struct FrameReader<T> {
    inner: T,
    config: CodecConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: CodecConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next message of any kind (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` if the stream ends before
    /// a full frame arrives.
    pub fn receive(&mut self) -> Result<Message> {
        read_message(&mut self.inner, self.config.max_message_size())
    }

    /// Read the next message, which must be binary. Returns `(data, class)`.
    pub fn receive_binary(&mut self) -> Result<(Bytes, u32)> {
        let message = self.receive()?;
        let class = message.message_class;
        Ok((message.into_binary()?, class))
    }

    /// Read the next message, which must be text. Returns `(text, class)`.
    pub fn receive_text(&mut self) -> Result<(String, u32)> {
        let message = self.receive()?;
        let class = message.message_class;
        Ok((message.into_text()?, class))
    }

    /// Read the next message, which must be a JSON array. Returns `(array, class)`.
    pub fn receive_json_array(&mut self) -> Result<(JsonArray, u32)> {
        let message = self.receive()?;
        let class = message.message_class;
        Ok((message.into_json_array()?, class))
    }

    /// Read the next message, which must be a JSON object. Returns `(object, class)`.
    pub fn receive_json_object(&mut self) -> Result<(JsonObject, u32)> {
        let message = self.receive()?;
        let class = message.message_class;
        Ok((message.into_json_object()?, class))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the maximum accepted body size for subsequent messages.
    pub fn set_max_message_size(&mut self, max_message_size: usize) -> Result<()> {
        self.config.set_max_message_size(max_message_size)
    }

    /// Current reader configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl FrameReader<Stream> {
    /// Create a frame reader for a transport stream and apply the read timeout from config.
    pub fn with_config_stream(inner: Stream, config: CodecConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}

/// Decode one frame from `inner`: header, body, footer, payload.
///
/// A frame whose data-kind tag is unknown is still drained through its footer
/// before the error is returned, so the stream stays on a frame boundary.
pub(crate) fn read_message<R: Read>(inner: &mut R, max_message_size: usize) -> Result<Message> {
    decode_next(inner, max_message_size).inspect_err(|err| {
        if matches!(
            err.category(),
            ErrorCategory::Protocol | ErrorCategory::Compression
        ) {
            warn!(error = %err, "rejected incoming frame");
        }
    })
}

fn decode_next<R: Read>(inner: &mut R, max_message_size: usize) -> Result<Message> {
    let mut header = [0u8; HEADER_SIZE];
    read_exact(inner, &mut header)?;
    let header = FrameHeader::parse(&header, max_message_size)?;
    let kind = header.kind();

    let mut body = Vec::with_capacity(header.body_len.min(INITIAL_BODY_CAPACITY));
    let read = inner
        .by_ref()
        .take(header.body_len as u64)
        .read_to_end(&mut body)?;
    if read < header.body_len {
        return Err(FrameError::ConnectionClosed);
    }

    if kind.is_some() && header.compressed {
        body = decompress(&body)?;
        debug!(
            wire_len = header.body_len,
            inflated_len = body.len(),
            "inflated message body"
        );
    }

    let mut footer = [0u8; FOOTER_SIZE];
    read_exact(inner, &mut footer)?;
    check_footer(&footer)?;

    let Some(kind) = kind else {
        return Err(FrameError::UnknownDataKind(header.kind_tag));
    };
    let payload = decode_payload(kind, Bytes::from(body))?;

    debug!(
        kind = %kind,
        class = header.message_class,
        body_len = header.body_len,
        compressed = header.compressed,
        "received message"
    );
    Ok(Message::new(payload, header.message_class))
}

fn read_exact<R: Read>(inner: &mut R, buf: &mut [u8]) -> Result<()> {
    inner.read_exact(buf).map_err(|err| match err.kind() {
        ErrorKind::UnexpectedEof => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    })
}
