use std::io::{Read, Write};

use bytes::{Bytes, BytesMut};
use msgess_transport::Stream;

use crate::config::CodecConfig;
use crate::error::Result;
use crate::message::{JsonArray, JsonObject, Message};
use crate::reader::{read_message, FrameReader};
use crate::writer::{write_message, FrameWriter};

/// A MsgESS codec bound to one duplex stream.
///
/// Sends and receives share the stream and the configuration. Each call is a
/// multi-step sequence on the stream, so a `Connection` is driven from one
/// thread at a time; use [`Connection::split`] for a reader thread plus a
/// writer thread.
pub struct Connection<S> {
    inner: S,
    buf: BytesMut,
    config: CodecConfig,
}

impl<S: Read + Write> Connection<S> {
    /// Create a connection with default configuration.
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a connection with explicit configuration.
    pub fn with_config(inner: S, config: CodecConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            config,
        }
    }

    pub fn send(&mut self, message: &Message) -> Result<()> {
        write_message(&mut self.inner, &mut self.buf, &self.config, message)
    }

    pub fn send_binary(&mut self, data: impl Into<Bytes>, message_class: u32) -> Result<()> {
        self.send(&Message::binary(data, message_class))
    }

    pub fn send_text(&mut self, text: impl Into<String>, message_class: u32) -> Result<()> {
        self.send(&Message::text(text, message_class))
    }

    pub fn send_json_array(&mut self, array: JsonArray, message_class: u32) -> Result<()> {
        self.send(&Message::json_array(array, message_class))
    }

    pub fn send_json_object(&mut self, object: JsonObject, message_class: u32) -> Result<()> {
        self.send(&Message::json_object(object, message_class))
    }

    /// Block until the next message of any kind arrives.
    pub fn receive(&mut self) -> Result<Message> {
        read_message(&mut self.inner, self.config.max_message_size())
    }

    pub fn receive_binary(&mut self) -> Result<(Bytes, u32)> {
        let message = self.receive()?;
        let class = message.message_class;
        Ok((message.into_binary()?, class))
    }

    pub fn receive_text(&mut self) -> Result<(String, u32)> {
        let message = self.receive()?;
        let class = message.message_class;
        Ok((message.into_text()?, class))
    }

    pub fn receive_json_array(&mut self) -> Result<(JsonArray, u32)> {
        let message = self.receive()?;
        let class = message.message_class;
        Ok((message.into_json_array()?, class))
    }

    pub fn receive_json_object(&mut self) -> Result<(JsonObject, u32)> {
        let message = self.receive()?;
        let class = message.message_class;
        Ok((message.into_json_object()?, class))
    }

    pub fn set_compression_enabled(&mut self, enabled: bool) {
        self.config.compression_enabled = enabled;
    }

    pub fn set_max_message_size(&mut self, max_message_size: usize) -> Result<()> {
        self.config.set_max_message_size(max_message_size)
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl Connection<Stream> {
    /// Create a connection over a transport stream, applying both timeouts from config.
    pub fn with_config_stream(inner: Stream, config: CodecConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }

    /// Split into independent reader and writer halves over cloned handles.
    pub fn split(self) -> Result<(FrameReader<Stream>, FrameWriter<Stream>)> {
        let reader_stream = self.inner.try_clone()?;
        let reader = FrameReader::with_config(reader_stream, self.config.clone());
        let writer = FrameWriter::with_config(self.inner, self.config);
        Ok((reader, writer))
    }
}
