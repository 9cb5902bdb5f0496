//! Decoder Boundary
//!
//! Decoders are external collaborators: this crate only routes filled packs
//! to them. The boundary is an inbound channel of [`Pack`] plus a one-shot
//! `start` hook; whatever consumes the channel owns decoding and is
//! responsible for eventually recycling each pack.

use crate::pool::Pack;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Dispatch target for one named decoder
///
/// `start` is invoked once per input that routes to the sink, before the
/// first pack is forwarded; implementations must tolerate repeated calls
/// when several inputs share a sink.
pub trait DecoderSink: Send + Sync {
    /// Launch whatever consumes the inbound channel
    fn start(&self);

    /// Clone of the bounded inbound channel
    ///
    /// A full channel exerts backpressure on the forwarding input.
    fn in_chan(&self) -> mpsc::Sender<Pack>;
}

/// Named decoder sinks supplied by the embedding pipeline
#[derive(Default)]
pub struct DecoderRegistry {
    sinks: HashMap<String, Arc<dyn DecoderSink>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, sink: Arc<dyn DecoderSink>) {
        self.sinks.insert(name.into(), sink);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DecoderSink>> {
        self.sinks.get(name).cloned()
    }
}

/// Channel-backed sink for tests and simple embeddings
///
/// The caller keeps the receiving half and drains packs at its own pace.
pub struct ChannelDecoder {
    name: String,
    tx: mpsc::Sender<Pack>,
}

impl ChannelDecoder {
    pub fn new(name: impl Into<String>, depth: usize) -> (Self, mpsc::Receiver<Pack>) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        (
            Self {
                name: name.into(),
                tx,
            },
            rx,
        )
    }
}

impl DecoderSink for ChannelDecoder {
    fn start(&self) {
        debug!(decoder = %self.name, "decoder sink started");
    }

    fn in_chan(&self) -> mpsc::Sender<Pack> {
        self.tx.clone()
    }
}
