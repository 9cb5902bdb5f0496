//! Protocol-level errors for frame and header processing
//!
//! Each variant carries enough context to diagnose a rejected frame from a
//! log line alone. Inside the frame scanner these errors only ever trigger
//! resynchronization; they surface as hard errors solely from the encoding
//! path and from direct header decoding.

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Framing and header wire-format errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Header region does not end with the unit separator byte
    #[error("missing unit separator: header terminated by {got:#04x}")]
    MissingTerminator { got: u8 },

    /// Header bytes end in the middle of a field
    #[error("truncated header: need {need} bytes, got {got}")]
    TruncatedHeader { need: usize, got: usize },

    /// Header decoded without the required message length field
    #[error("header is missing the message length field")]
    MissingLength,

    /// Varint continuation bits exceed the maximum encodable width
    #[error("invalid varint at header offset {offset}")]
    InvalidVarint { offset: usize },

    /// Encoding tag is not in the supported set
    #[error("unknown message encoding {value}")]
    UnknownEncoding { value: u64 },

    /// Header carries a field with a wire type other than varint
    #[error("unsupported header field wire type (tag {tag:#04x})")]
    UnsupportedWireType { tag: u8 },

    /// Declared message length exceeds the protocol limit
    #[error("message length {size} exceeds maximum {max}")]
    MessageTooLarge { size: usize, max: usize },

    /// Serialized header exceeds the one-byte length field's limit
    #[error("header too large: {size} bytes exceeds maximum {max}")]
    HeaderTooLarge { size: usize, max: usize },

    /// Payload handed to the encoder exceeds the protocol limit
    #[error("payload too large: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },
}
