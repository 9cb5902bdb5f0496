//! Frame header wire format
//!
//! The header region of a frame (the bytes between the length byte and the
//! unit separator) is a sequence of varint-keyed fields:
//!
//! ```text
//! field 1 (tag 0x08): message_length, varint, required
//! field 2 (tag 0x10): message_encoding, varint, optional (default Json)
//! ```
//!
//! Unknown varint fields are skipped so headers from newer producers still
//! decode; any non-varint wire type is rejected. The decoder enforces the
//! `MAX_MESSAGE_SIZE` bound itself so the scanner can condemn an oversized
//! candidate without a second check.

use crate::constants::MAX_MESSAGE_SIZE;
use crate::error::{CodecError, CodecResult};
use num_enum::TryFromPrimitive;

const TAG_MESSAGE_LENGTH: u8 = 0x08;
const TAG_MESSAGE_ENCODING: u8 = 0x10;
const WIRE_TYPE_MASK: u8 = 0x07;
const MAX_VARINT_BYTES: usize = 10;

/// Closed set of payload encodings a frame can route to
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum MessageEncoding {
    Json = 0,
    Protobuf = 1,
}

/// Number of supported encodings, usable for decoder-table sizing
pub const ENCODING_COUNT: usize = 2;

impl MessageEncoding {
    /// All supported encodings, indexable by `encoding as usize`
    pub const ALL: [MessageEncoding; ENCODING_COUNT] =
        [MessageEncoding::Json, MessageEncoding::Protobuf];

    /// Configuration key for this encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageEncoding::Json => "json",
            MessageEncoding::Protobuf => "protobuf",
        }
    }
}

/// Decoded frame header
///
/// Within a connection handler an `Option<FrameHeader>` doubles as the
/// "already parsed, payload pending" sentinel: `None` means the scanner has
/// not located a valid header for the frame at the current scan position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Declared payload length, bounded by `MAX_MESSAGE_SIZE`
    pub message_length: u32,
    /// Decoder the payload must be routed to
    pub message_encoding: MessageEncoding,
}

impl FrameHeader {
    /// Decode a header region (terminator byte excluded)
    pub fn decode(buf: &[u8]) -> CodecResult<FrameHeader> {
        let mut message_length: Option<u32> = None;
        let mut message_encoding = MessageEncoding::Json;
        let mut offset = 0;

        while offset < buf.len() {
            let tag = buf[offset];
            offset += 1;
            if tag & WIRE_TYPE_MASK != 0 {
                return Err(CodecError::UnsupportedWireType { tag });
            }
            let (value, len) = decode_varint(&buf[offset..], offset)?;
            offset += len;
            match tag {
                TAG_MESSAGE_LENGTH => {
                    if value > MAX_MESSAGE_SIZE as u64 {
                        return Err(CodecError::MessageTooLarge {
                            size: value as usize,
                            max: MAX_MESSAGE_SIZE,
                        });
                    }
                    message_length = Some(value as u32);
                }
                TAG_MESSAGE_ENCODING => {
                    let raw = u8::try_from(value)
                        .map_err(|_| CodecError::UnknownEncoding { value })?;
                    message_encoding = MessageEncoding::try_from(raw)
                        .map_err(|_| CodecError::UnknownEncoding { value })?;
                }
                _ => {} // unknown varint field, skipped
            }
        }

        let message_length = message_length.ok_or(CodecError::MissingLength)?;
        Ok(FrameHeader {
            message_length,
            message_encoding,
        })
    }

    /// Serialize the header region (terminator byte excluded)
    ///
    /// The encoding field is omitted when it holds the default, matching
    /// what producers of the original wire format emit.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(TAG_MESSAGE_LENGTH);
        encode_varint(u64::from(self.message_length), out);
        if self.message_encoding != MessageEncoding::Json {
            out.push(TAG_MESSAGE_ENCODING);
            encode_varint(self.message_encoding as u64, out);
        }
    }
}

fn decode_varint(buf: &[u8], offset: usize) -> CodecResult<(u64, usize)> {
    let mut value = 0u64;
    for (i, &b) in buf.iter().enumerate().take(MAX_VARINT_BYTES) {
        value |= u64::from(b & 0x7f) << (7 * i);
        if b & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if buf.len() >= MAX_VARINT_BYTES {
        return Err(CodecError::InvalidVarint { offset });
    }
    Err(CodecError::TruncatedHeader {
        need: buf.len() + 1,
        got: buf.len(),
    })
}

fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_length_only_header() {
        // field 1, varint 5; encoding absent defaults to Json
        let header = FrameHeader::decode(&[0x08, 0x05]).unwrap();
        assert_eq!(header.message_length, 5);
        assert_eq!(header.message_encoding, MessageEncoding::Json);
    }

    #[test]
    fn decodes_explicit_encoding() {
        let header = FrameHeader::decode(&[0x08, 0x05, 0x10, 0x01]).unwrap();
        assert_eq!(header.message_encoding, MessageEncoding::Protobuf);
    }

    #[test]
    fn round_trips_multi_byte_length() {
        let original = FrameHeader {
            message_length: MAX_MESSAGE_SIZE as u32,
            message_encoding: MessageEncoding::Protobuf,
        };
        let mut buf = Vec::new();
        original.encode_into(&mut buf);
        assert_eq!(FrameHeader::decode(&buf).unwrap(), original);
    }

    #[test]
    fn default_encoding_is_omitted_on_the_wire() {
        let header = FrameHeader {
            message_length: 7,
            message_encoding: MessageEncoding::Json,
        };
        let mut buf = Vec::new();
        header.encode_into(&mut buf);
        assert_eq!(buf, vec![0x08, 0x07]);
    }

    #[test]
    fn rejects_missing_length() {
        assert_eq!(
            FrameHeader::decode(&[0x10, 0x01]),
            Err(CodecError::MissingLength)
        );
    }

    #[test]
    fn rejects_oversized_length() {
        let mut buf = Vec::new();
        buf.push(TAG_MESSAGE_LENGTH);
        encode_varint(MAX_MESSAGE_SIZE as u64 + 1, &mut buf);
        assert!(matches!(
            FrameHeader::decode(&buf),
            Err(CodecError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_unknown_encoding() {
        assert!(matches!(
            FrameHeader::decode(&[0x08, 0x05, 0x10, 0x09]),
            Err(CodecError::UnknownEncoding { value: 9 })
        ));
    }

    #[test]
    fn rejects_non_varint_wire_type() {
        // field 3, length-delimited wire type
        assert!(matches!(
            FrameHeader::decode(&[0x08, 0x05, 0x1a, 0x01, 0x00]),
            Err(CodecError::UnsupportedWireType { tag: 0x1a })
        ));
    }

    #[test]
    fn rejects_truncated_varint() {
        assert!(matches!(
            FrameHeader::decode(&[0x08, 0x80]),
            Err(CodecError::TruncatedHeader { .. })
        ));
    }

    #[test]
    fn skips_unknown_varint_fields() {
        // field 3 varint, then the required length
        let header = FrameHeader::decode(&[0x18, 0x2a, 0x08, 0x03]).unwrap();
        assert_eq!(header.message_length, 3);
    }
}
