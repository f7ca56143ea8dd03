use std::io::{ErrorKind, Write};

use bytes::{Bytes, BytesMut};
use msgess_transport::Stream;
use tracing::debug;

use crate::codec::encode_message;
use crate::config::CodecConfig;
use crate::error::{FrameError, Result};
use crate::message::{JsonArray, JsonObject, Message};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete messages to any `Write` stream.
///
/// Each send produces exactly one frame, written in full and flushed before
/// the call returns. Nothing is buffered across calls.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: CodecConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: CodecConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and send one message (blocking).
    pub fn send(&mut self, message: &Message) -> Result<()> {
        write_message(&mut self.inner, &mut self.buf, &self.config, message)
    }

    /// Send a binary message.
    pub fn send_binary(&mut self, data: impl Into<Bytes>, message_class: u32) -> Result<()> {
        self.send(&Message::binary(data, message_class))
    }

    /// Send a UTF-8 text message.
    pub fn send_text(&mut self, text: impl Into<String>, message_class: u32) -> Result<()> {
        self.send(&Message::text(text, message_class))
    }

    /// Send a JSON array message.
    pub fn send_json_array(&mut self, array: JsonArray, message_class: u32) -> Result<()> {
        self.send(&Message::json_array(array, message_class))
    }

    /// Send a JSON object message.
    pub fn send_json_object(&mut self, object: JsonObject, message_class: u32) -> Result<()> {
        self.send(&Message::json_object(object, message_class))
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        flush(&mut self.inner)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Turn gzip compression of subsequent messages on or off.
    pub fn set_compression_enabled(&mut self, enabled: bool) {
        self.config.compression_enabled = enabled;
    }

    /// Current writer configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl FrameWriter<Stream> {
    /// Create a frame writer for a transport stream and apply the write timeout from config.
    pub fn with_config_stream(inner: Stream, config: CodecConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}

/// Encode `message` into `buf` and write the whole frame to `inner`.
pub(crate) fn write_message<W: Write>(
    inner: &mut W,
    buf: &mut BytesMut,
    config: &CodecConfig,
    message: &Message,
) -> Result<()> {
    buf.clear();
    let header = encode_message(message, config, buf)?;

    let mut offset = 0usize;
    while offset < buf.len() {
        match inner.write(&buf[offset..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    flush(inner)?;

    debug!(
        kind = %message.kind(),
        class = header.message_class,
        body_len = header.body_len,
        compressed = header.compressed,
        "sent message"
    );

    // Large frames should not pin their allocation between sends.
    if buf.capacity() > 4 * INITIAL_BUFFER_CAPACITY {
        *buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
    } else {
        buf.clear();
    }
    Ok(())
}

fn flush<W: Write>(inner: &mut W) -> Result<()> {
    loop {
        match inner.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}
