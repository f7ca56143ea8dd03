use crate::message::DataKind;

/// Errors that can occur while sending or receiving messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was transferred.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// The frame does not start with `MsgESSbegin`.
    #[error("invalid header magic (expected \"MsgESSbegin\")")]
    InvalidHeader,

    /// The peer speaks a different protocol revision.
    #[error("incompatible protocol version {found} (expected {expected})")]
    IncompatibleVersion { expected: u32, found: u32 },

    /// The declared body length is negative.
    #[error("invalid body length {0}")]
    InvalidBodyLength(i32),

    /// The body is larger than the configured or representable maximum.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The message class is negative on the wire, or above `i32::MAX` on send.
    #[error("invalid message class {0}")]
    InvalidMessageClass(i64),

    /// The data-kind tag is not one of the four known kinds.
    #[error("unknown data kind tag {0}")]
    UnknownDataKind(u8),

    /// The frame does not end with `MsgESSend`.
    #[error("invalid footer magic (expected \"MsgESSend\")")]
    InvalidFooter,

    /// Compressing an outgoing body failed.
    #[error("failed to compress message body: {0}")]
    Compression(#[source] std::io::Error),

    /// The body is flagged as compressed but is not a valid gzip stream.
    #[error("failed to decompress message body: {0}")]
    Decompression(#[source] std::io::Error),

    /// An outgoing payload could not be serialized.
    #[error("failed to serialize {kind} body: {reason}")]
    Serialize { kind: DataKind, reason: String },

    /// The frame was valid but its body is not a valid value of its kind.
    #[error("failed to deserialize {kind} body: {reason}")]
    Deserialize { kind: DataKind, reason: String },

    /// A kind-specific receive got a message of another kind.
    #[error("wrong data type (expected {expected}, received {found})")]
    WrongDataKind { expected: DataKind, found: DataKind },

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification of a [`FrameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The underlying stream failed or closed.
    Transport,
    /// The bytes on the wire violate the frame layout.
    Protocol,
    /// A gzip body could not be produced or read back.
    Compression,
    /// The frame was intact but its payload was not.
    Deserialization,
    /// The message kind differs from what the caller asked for.
    TypeMismatch,
    /// A configuration value was rejected up front.
    Configuration,
}

impl FrameError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) | Self::ConnectionClosed => ErrorCategory::Transport,
            Self::InvalidHeader
            | Self::IncompatibleVersion { .. }
            | Self::InvalidBodyLength(_)
            | Self::MessageTooLarge { .. }
            | Self::InvalidMessageClass(_)
            | Self::UnknownDataKind(_)
            | Self::InvalidFooter => ErrorCategory::Protocol,
            Self::Compression(_) | Self::Decompression(_) => ErrorCategory::Compression,
            Self::Serialize { .. } | Self::Deserialize { .. } => ErrorCategory::Deserialization,
            Self::WrongDataKind { .. } => ErrorCategory::TypeMismatch,
            Self::InvalidConfig(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether a failed receive left the stream off a frame boundary.
    ///
    /// Deserialization and type-mismatch errors happen after the footer was
    /// validated, and a frame with an unknown kind is drained through its
    /// footer, so the connection stays usable after them.
    pub fn is_fatal_to_connection(&self) -> bool {
        if matches!(self, Self::UnknownDataKind(_)) {
            return false;
        }
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Protocol | ErrorCategory::Compression
        )
    }
}

impl From<msgess_transport::TransportError> for FrameError {
    fn from(err: msgess_transport::TransportError) -> Self {
        use msgess_transport::TransportError;

        match err {
            TransportError::Io(io) | TransportError::Accept(io) => Self::Io(io),
            TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
                Self::Io(source)
            }
            other => Self::Io(std::io::Error::other(other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        assert_eq!(FrameError::ConnectionClosed.category(), ErrorCategory::Transport);
        assert_eq!(FrameError::InvalidFooter.category(), ErrorCategory::Protocol);
        assert_eq!(
            FrameError::Decompression(std::io::Error::other("bad gzip")).category(),
            ErrorCategory::Compression
        );
        assert_eq!(
            FrameError::WrongDataKind {
                expected: DataKind::Text,
                found: DataKind::Binary,
            }
            .category(),
            ErrorCategory::TypeMismatch
        );
    }

    #[test]
    fn payload_errors_keep_connection_usable() {
        let err = FrameError::Deserialize {
            kind: DataKind::JsonObject,
            reason: "eof".to_string(),
        };
        assert!(!err.is_fatal_to_connection());
        assert!(FrameError::InvalidHeader.is_fatal_to_connection());
        assert!(!FrameError::UnknownDataKind(9).is_fatal_to_connection());
        assert!(!FrameError::InvalidConfig("x".into()).is_fatal_to_connection());
    }

    #[test]
    fn messages_name_the_kinds() {
        let err = FrameError::WrongDataKind {
            expected: DataKind::JsonArray,
            found: DataKind::Text,
        };
        assert_eq!(
            err.to_string(),
            "wrong data type (expected json-array, received text)"
        );
    }
}
