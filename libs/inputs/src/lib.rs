//! # Network Ingestion Front-End
//!
//! ## Purpose
//!
//! Accepts datagram and stream traffic from remote producers, reconstructs
//! discrete application messages from raw bytes, and hands each message to
//! one of several downstream decoders over bounded channels.
//!
//! ## Architecture Role
//!
//! ```text
//! UDP socket ──► UdpInput ──────────────────────┐
//!                                               ├──► decoder channels
//! TCP socket ──► TcpInput ──► frame scanner ────┘
//!                    │
//!              pack pool (backpressure)
//! ```
//!
//! One tokio task drives the datagram receive loop, one drives the stream
//! accept loop, and one more runs per accepted connection. Tasks share
//! nothing but the pack pool, the decoder channels, and the shutdown
//! signal; each connection owns its receive buffer and header state
//! exclusively.
//!
//! ## What This Crate Contains
//! - `PackPool`/`Pack`: bounded reusable message buffers (backpressure gate)
//! - `UdpInput`: datagram ingestion, one message per datagram
//! - `TcpInput`: stream ingestion over the framed record protocol
//! - `DecoderRegistry`/`DecoderSink`: the boundary to downstream decoders
//! - `ShutdownCoordinator`: process-wide stop signal and completion barrier
//!
//! ## What This Crate Does NOT Contain
//! - Payload decoding, filtering, routing, or any later pipeline stage
//! - Configuration file loading (config structs are the interface)

pub mod decoder;
pub mod error;
pub mod pool;
pub mod shutdown;
pub mod tcp;
pub mod udp;

// Re-export key types for convenience
pub use decoder::{ChannelDecoder, DecoderRegistry, DecoderSink};
pub use error::{InputError, InputResult};
pub use pool::{Pack, PackPool};
pub use shutdown::{ShutdownCoordinator, ShutdownHandle, ShutdownToken};
pub use tcp::{default_decoders, TcpInput, TcpInputConfig};
pub use udp::{UdpInput, UdpInputConfig};
