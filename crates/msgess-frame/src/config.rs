use std::time::Duration;

use crate::codec::{DEFAULT_MAX_MESSAGE_SIZE, MAX_BODY_LEN};
use crate::error::{FrameError, Result};

/// Per-connection codec configuration.
///
/// `compression_enabled` only affects sending; the flag travels with every
/// frame so receivers adapt per message. `max_message_size` only affects
/// receiving: a declared body above it is rejected before any body byte is
/// read.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Gzip outgoing bodies. Default: on.
    pub compression_enabled: bool,
    max_message_size: usize,
    /// Read timeout applied to a transport stream. The codec itself never times out.
    pub read_timeout: Option<Duration>,
    /// Write timeout applied to a transport stream.
    pub write_timeout: Option<Duration>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression_enabled: true,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl CodecConfig {
    /// Build a configuration, rejecting values the wire format cannot express.
    pub fn new(compression_enabled: bool, max_message_size: usize) -> Result<Self> {
        Self::default()
            .with_compression(compression_enabled)
            .with_max_message_size(max_message_size)
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compression_enabled = enabled;
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Result<Self> {
        self.set_max_message_size(max_message_size)?;
        Ok(self)
    }

    pub fn with_timeouts(mut self, read: Option<Duration>, write: Option<Duration>) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    /// Maximum accepted body length in bytes. Default: 25,000,000.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Change the receive limit. Limits above `i32::MAX` cannot be expressed
    /// by the length field and are rejected.
    pub fn set_max_message_size(&mut self, max_message_size: usize) -> Result<()> {
        if max_message_size > MAX_BODY_LEN {
            return Err(FrameError::InvalidConfig(format!(
                "max message size {max_message_size} exceeds the wire limit of {MAX_BODY_LEN} bytes"
            )));
        }
        self.max_message_size = max_message_size;
        Ok(())
    }

    /// Convert a signed limit such as one read from a CLI flag or env var.
    pub fn max_message_size_from_signed(value: i64) -> Result<usize> {
        usize::try_from(value).map_err(|_| {
            FrameError::InvalidConfig(format!("max message size must not be negative (got {value})"))
        })
    }
}
