//! Framing protocol constants
//!
//! Wire-level limits and delimiter bytes shared by the frame scanner and the
//! connection handlers that size their buffers from them.

/// Maximum serialized header size in bytes (the header length field is one byte)
pub const MAX_HEADER_SIZE: usize = 255;

/// Maximum payload size a header may declare
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Byte marking a candidate frame boundary (ASCII record separator)
pub const RECORD_SEPARATOR: u8 = 0x1e;

/// Byte terminating the serialized header region (ASCII unit separator)
pub const UNIT_SEPARATOR: u8 = 0x1f;
