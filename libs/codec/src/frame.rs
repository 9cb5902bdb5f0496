//! Frame scanning and encoding
//!
//! ## Purpose
//!
//! Locates one length-framed record at a time inside a sliding byte window.
//! The wire format carries no total-length prefix, only a nested
//! variable-size header, so the scanner must tolerate arbitrary split points
//! across reads and recover alignment after corrupt or foreign traffic.
//!
//! ## Wire layout
//!
//! ```text
//! 0x1E | headerLength(1) | header(headerLength) | 0x1F | payload(message_length)
//! ```
//!
//! ## Resynchronization
//!
//! A record separator byte inside corrupt traffic is not proof of a frame
//! boundary. Every candidate must survive full header validation (varint
//! decode, terminator byte, length bound); a candidate that fails is
//! condemned and the search continues one byte past its separator. The
//! search runs as an explicit cursor loop so adversarial input with many
//! spurious separators cannot grow the stack.

use crate::constants::{MAX_HEADER_SIZE, MAX_MESSAGE_SIZE, RECORD_SEPARATOR, UNIT_SEPARATOR};
use crate::error::{CodecError, CodecResult};
use crate::header::{FrameHeader, MessageEncoding};
use tracing::debug;

/// Outcome of one scan over a byte window
///
/// `consumed` is the number of leading window bytes the caller must fold
/// away: on a complete frame it points one past the payload; on an
/// incomplete frame it points at the candidate's separator byte (or the end
/// of the window when no byte in it can start a frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameScan {
    pub consumed: usize,
    pub complete: bool,
}

/// Scan `window` for the next complete frame.
///
/// `header` is the caller-owned sentinel: `Some` on return means a valid
/// header was located for the frame starting at the reported position, and
/// passing it back in on the next call skips re-decoding while the payload
/// is still in flight. The caller resets it to `None` after consuming a
/// complete frame. On a complete frame the payload bytes are copied into
/// `payload` (which is cleared first in every case).
pub fn find_frame(
    window: &[u8],
    header: &mut Option<FrameHeader>,
    payload: &mut Vec<u8>,
) -> FrameScan {
    payload.clear();
    let mut search = 0usize;
    loop {
        let pos = match window[search..].iter().position(|&b| b == RECORD_SEPARATOR) {
            Some(rel) => search + rel,
            // No byte in the window can start a frame
            None => {
                return FrameScan {
                    consumed: window.len(),
                    complete: false,
                }
            }
        };

        // Need at least separator + length byte + unit separator
        if window.len() < pos + 3 {
            return FrameScan {
                consumed: pos,
                complete: false,
            };
        }

        let header_len = window[pos + 1] as usize;
        let header_end = pos + header_len + 3; // sep + len byte + header + unit sep
        if window.len() < header_end {
            return FrameScan {
                consumed: pos,
                complete: false,
            };
        }

        // A header carried over from a prior incomplete attempt belongs to
        // this candidate (the caller's scan position sits on its separator),
        // so decoding is skipped while the payload is pending.
        let decoded = match header.take() {
            Some(h) => h,
            None => match decode_header(&window[pos + 2..header_end]) {
                Ok(h) => h,
                Err(err) => {
                    debug!(offset = pos, error = %err, "condemning corrupt frame candidate");
                    search = pos + 1;
                    continue;
                }
            },
        };

        let message_end = header_end + decoded.message_length as usize;
        if window.len() < message_end {
            *header = Some(decoded);
            return FrameScan {
                consumed: pos,
                complete: false,
            };
        }

        payload.extend_from_slice(&window[header_end..message_end]);
        *header = Some(decoded);
        return FrameScan {
            consumed: message_end,
            complete: true,
        };
    }
}

/// Decode a header region including its trailing unit separator
fn decode_header(buf: &[u8]) -> CodecResult<FrameHeader> {
    match buf.last() {
        Some(&UNIT_SEPARATOR) => FrameHeader::decode(&buf[..buf.len() - 1]),
        Some(&got) => Err(CodecError::MissingTerminator { got }),
        None => Err(CodecError::TruncatedHeader { need: 1, got: 0 }),
    }
}

/// Append one complete frame for `payload` to `out`
pub fn encode_frame(
    payload: &[u8],
    encoding: MessageEncoding,
    out: &mut Vec<u8>,
) -> CodecResult<()> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let header = FrameHeader {
        message_length: payload.len() as u32,
        message_encoding: encoding,
    };
    let mut region = Vec::with_capacity(8);
    header.encode_into(&mut region);
    if region.len() > MAX_HEADER_SIZE {
        return Err(CodecError::HeaderTooLarge {
            size: region.len(),
            max: MAX_HEADER_SIZE,
        });
    }
    out.push(RECORD_SEPARATOR);
    out.push(region.len() as u8);
    out.extend_from_slice(&region);
    out.push(UNIT_SEPARATOR);
    out.extend_from_slice(payload);
    Ok(())
}
