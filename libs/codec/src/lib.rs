//! # Stream Framing Protocol Codec
//!
//! ## Purpose
//!
//! This crate contains the "rules" layer of the ingestion front-end:
//! - Wire-format constants for the self-synchronizing record protocol
//! - Header encoding/decoding (varint wire format)
//! - Frame scanning with resynchronization after corrupt input
//!
//! ## Architecture Role
//!
//! ```text
//! socket bytes → [codec: frame scanner] → inputs/ → decoder channels
//!      ↓                  ↓                  ↓
//!   Raw Stream      Protocol Rules      Connection
//!   Arbitrary       Boundary Search     Handling
//!   Split Points    Header Validation   Dispatch
//! ```
//!
//! ## What This Crate Contains
//! - `FrameHeader` and `MessageEncoding` wire types
//! - `find_frame` sliding-window scanner (the core framing algorithm)
//! - `encode_frame` for producers and tests
//! - Protocol constants and error types
//!
//! ## What This Crate Does NOT Contain
//! - Socket management or connection handling (belongs in `inputs`)
//! - Payload decoding (decoders are external collaborators)

pub mod constants;
pub mod error;
pub mod frame;
pub mod header;

// Re-export key types for convenience
pub use constants::*;
pub use error::{CodecError, CodecResult};
pub use frame::{encode_frame, find_frame, FrameScan};
pub use header::{FrameHeader, MessageEncoding, ENCODING_COUNT};
