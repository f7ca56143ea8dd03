use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::compression::compress;
use crate::config::CodecConfig;
use crate::error::{FrameError, Result};
use crate::message::{encode_payload, DataKind, Message};

/// Header magic: ASCII `MsgESSbegin`.
pub const HEADER_MAGIC: &[u8; 11] = b"MsgESSbegin";

/// Footer magic: ASCII `MsgESSend`.
pub const FOOTER_MAGIC: &[u8; 9] = b"MsgESSend";

/// Protocol revision with dedicated JSON array/object tags. Peers must match exactly.
pub const PROTOCOL_VERSION: u32 = 3;

/// Frame header: magic (11) + version (4) + length (4) + class (4) + flag (1) + kind (1).
pub const HEADER_SIZE: usize = 25;

/// Frame footer: magic (9).
pub const FOOTER_SIZE: usize = 9;

/// Bytes every frame carries in addition to its body.
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + FOOTER_SIZE;

/// Default maximum accepted body size: 25,000,000 bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 25_000_000;

/// Largest body length the signed 32-bit length field can carry.
pub const MAX_BODY_LEN: usize = i32::MAX as usize;

/// Largest message class the signed 32-bit class field can carry.
pub const MAX_MESSAGE_CLASS: u32 = i32::MAX as u32;

/// The validated fixed-size part of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Length of the body as it sits on the wire (post-compression).
    pub body_len: usize,
    pub message_class: u32,
    pub compressed: bool,
    /// Raw data-kind tag. Not validated by [`FrameHeader::parse`]; see [`FrameHeader::kind`].
    pub kind_tag: u8,
}

impl FrameHeader {
    /// Validate and parse a 25-byte header.
    ///
    /// Checks run in wire order: magic, version, body length (sign, then
    /// `max_message_size`), class. The data-kind tag is returned as-is so the
    /// caller can still drain the body of a frame with an unknown kind.
    pub fn parse(header: &[u8; HEADER_SIZE], max_message_size: usize) -> Result<Self> {
        let (magic, mut fields) = header.split_at(HEADER_MAGIC.len());
        if magic != HEADER_MAGIC {
            return Err(FrameError::InvalidHeader);
        }

        let version = fields.get_u32();
        if version != PROTOCOL_VERSION {
            return Err(FrameError::IncompatibleVersion {
                expected: PROTOCOL_VERSION,
                found: version,
            });
        }

        let body_len = fields.get_i32();
        let body_len =
            usize::try_from(body_len).map_err(|_| FrameError::InvalidBodyLength(body_len))?;
        if body_len > max_message_size {
            return Err(FrameError::MessageTooLarge {
                size: body_len,
                max: max_message_size,
            });
        }

        let message_class = fields.get_i32();
        let message_class = u32::try_from(message_class)
            .map_err(|_| FrameError::InvalidMessageClass(i64::from(message_class)))?;

        let compressed = fields.get_u8() != 0;
        let kind_tag = fields.get_u8();

        Ok(Self {
            body_len,
            message_class,
            compressed,
            kind_tag,
        })
    }

    /// The data kind named by the tag, if it is a known one.
    pub fn kind(&self) -> Option<DataKind> {
        DataKind::from_tag(self.kind_tag)
    }

    /// Total wire size of the frame this header opens.
    pub fn frame_len(&self) -> usize {
        FRAME_OVERHEAD + self.body_len
    }
}

/// Check a 9-byte footer.
pub fn check_footer(footer: &[u8; FOOTER_SIZE]) -> Result<()> {
    if footer != FOOTER_MAGIC {
        return Err(FrameError::InvalidFooter);
    }
    Ok(())
}

/// Assemble a frame around an already encoded (and possibly compressed) body.
///
/// Wire format (integers big-endian):
/// ```text
/// ┌─────────────┬─────────┬────────┬─────────┬──────┬──────┬─────────┬───────────┐
/// │ MsgESSbegin │ Version │ Length │ Class   │ Gzip │ Kind │ Body    │ MsgESSend │
/// │ (11B)       │ (4B)    │ (4B)   │ (4B)    │ (1B) │ (1B) │ (Length)│ (9B)      │
/// └─────────────┴─────────┴────────┴─────────┴──────┴──────┴─────────┴───────────┘
/// ```
pub fn encode_frame(
    kind: DataKind,
    message_class: u32,
    compressed: bool,
    body: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    if body.len() > MAX_BODY_LEN {
        return Err(FrameError::MessageTooLarge {
            size: body.len(),
            max: MAX_BODY_LEN,
        });
    }
    if message_class > MAX_MESSAGE_CLASS {
        return Err(FrameError::InvalidMessageClass(i64::from(message_class)));
    }

    dst.reserve(FRAME_OVERHEAD + body.len());
    dst.put_slice(HEADER_MAGIC);
    dst.put_u32(PROTOCOL_VERSION);
    dst.put_u32(body.len() as u32);
    dst.put_u32(message_class);
    dst.put_u8(u8::from(compressed));
    dst.put_u8(kind.tag());
    dst.put_slice(body);
    dst.put_slice(FOOTER_MAGIC);
    Ok(())
}

/// Serialize, optionally compress, and frame a message into `dst`.
///
/// Returns the header that was written.
pub fn encode_message(
    message: &Message,
    config: &CodecConfig,
    dst: &mut BytesMut,
) -> Result<FrameHeader> {
    let kind = message.kind();
    let raw = encode_payload(&message.payload)?;
    let body = if config.compression_enabled {
        Bytes::from(compress(&raw)?)
    } else {
        raw
    };

    encode_frame(
        kind,
        message.message_class,
        config.compression_enabled,
        &body,
        dst,
    )?;

    Ok(FrameHeader {
        body_len: body.len(),
        message_class: message.message_class,
        compressed: config.compression_enabled,
        kind_tag: kind.tag(),
    })
}
