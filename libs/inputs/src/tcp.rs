//! Stream Input
//!
//! ## Purpose
//!
//! Accepts stream connections and reconstructs discrete messages from the
//! self-synchronizing framed record protocol. Each connection gets an
//! independent handler task owning a fixed-capacity receive buffer; the
//! frame scanner runs against the unconsumed window after every read and
//! completed payloads are dispatched to the decoder registered for the
//! frame's encoding tag.
//!
//! ## Lifecycle
//!
//! ```text
//! accept loop ──spawn──► connection handler ──► per-encoding decoder chans
//!      │                       │
//!      └── shutdown token      └── shutdown token (own subscription)
//! ```
//!
//! Accept errors are logged and retried unless shutdown is in progress.
//! Errors on one connection never affect another; the sole forced teardown
//! is the capacity defense against a peer whose stream can never yield a
//! frame within the receive buffer.

use crate::decoder::DecoderRegistry;
use crate::error::{InputError, InputResult};
use crate::pool::{Pack, PackPool};
use crate::shutdown::{ShutdownHandle, ShutdownToken};
use codec::{find_frame, FrameHeader, MessageEncoding, MAX_HEADER_SIZE, MAX_MESSAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Stream input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpInputConfig {
    /// `host:port` to listen on
    pub address: String,
    /// Decoder name per encoding tag; every supported encoding needs an entry
    pub decoders: HashMap<String, String>,
}

impl Default for TcpInputConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            decoders: default_decoders(),
        }
    }
}

/// Conventional decoder names for every supported encoding
pub fn default_decoders() -> HashMap<String, String> {
    let mut decoders = HashMap::new();
    decoders.insert("json".to_string(), "JsonDecoder".to_string());
    decoders.insert("protobuf".to_string(), "ProtobufDecoder".to_string());
    decoders
}

/// Stream ingestion input
pub struct TcpInput {
    name: String,
    listener: TcpListener,
    // Indexed by `MessageEncoding as usize`
    decoder_chans: Vec<mpsc::Sender<Pack>>,
}

impl TcpInput {
    /// Validate the decoder table, resolve sinks, and bind the listener
    ///
    /// Sinks are shared per process; a sink referenced for several
    /// encodings is started once.
    pub async fn new(
        name: impl Into<String>,
        config: TcpInputConfig,
        registry: &DecoderRegistry,
    ) -> InputResult<Self> {
        let name = name.into();
        let mut decoder_chans = Vec::with_capacity(MessageEncoding::ALL.len());
        let mut started: HashSet<&str> = HashSet::new();

        for encoding in MessageEncoding::ALL {
            let decoder_name = config
                .decoders
                .get(encoding.as_str())
                .ok_or(InputError::MissingDecoder {
                    encoding: encoding.as_str(),
                })?;
            let sink = registry
                .get(decoder_name)
                .ok_or_else(|| InputError::UnknownDecoder {
                    name: decoder_name.clone(),
                })?;
            if started.insert(decoder_name.as_str()) {
                sink.start();
            }
            decoder_chans.push(sink.in_chan());
        }

        let listener = TcpListener::bind(&config.address)
            .await
            .map_err(|e| InputError::Bind {
                addr: config.address.clone(),
                source: e,
            })?;

        info!(input = %name, address = %config.address, "TCP input configured");
        Ok(Self {
            name,
            listener,
            decoder_chans,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> InputResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop: one independent handler task per connection
    pub async fn run(self, pool: PackPool, shutdown: ShutdownHandle) {
        let mut token = shutdown.subscribe();
        loop {
            let accepted = tokio::select! {
                biased;
                _ = token.recv() => None,
                res = self.listener.accept() => Some(res),
            };
            match accepted {
                None => break,
                Some(Ok((stream, peer))) => {
                    debug!(input = %self.name, peer = %peer, "accepted connection");
                    let handler = ConnectionHandler {
                        stream,
                        peer,
                        pool: pool.clone(),
                        decoder_chans: self.decoder_chans.clone(),
                        shutdown: shutdown.subscribe(),
                    };
                    tokio::spawn(handler.run());
                }
                Some(Err(err)) => {
                    if token.is_signalled() {
                        break;
                    }
                    warn!(input = %self.name, error = %err, "TCP accept failed");
                }
            }
        }
        info!(input = %self.name, "TCP input stopped");
    }
}

/// One accepted connection's receive state
struct ConnectionHandler {
    stream: TcpStream,
    peer: SocketAddr,
    pool: PackPool,
    decoder_chans: Vec<mpsc::Sender<Pack>>,
    shutdown: ShutdownToken,
}

impl ConnectionHandler {
    /// Read/scan/dispatch loop for one connection
    ///
    /// Buffer discipline: bytes in `[0, scan_pos)` are consumed garbage,
    /// `[scan_pos, read_pos)` are pending, and `[read_pos, capacity)` is
    /// free for the next read. `scan_pos <= read_pos <= capacity` always
    /// holds.
    async fn run(mut self) {
        // Room for one maximum-size header plus one maximum-size payload
        let mut buf = vec![0u8; MAX_MESSAGE_SIZE + MAX_HEADER_SIZE];
        let mut read_pos = 0usize;
        let mut scan_pos = 0usize;
        let mut header: Option<FrameHeader> = None;

        loop {
            let read = tokio::select! {
                biased;
                _ = self.shutdown.recv() => None,
                res = self.stream.read(&mut buf[read_pos..]) => Some(res),
            };
            let n = match read {
                None => break,
                Some(Ok(0)) => {
                    debug!(peer = %self.peer, "peer closed connection");
                    break;
                }
                Some(Ok(n)) => n,
                Some(Err(err)) => {
                    if !self.shutdown.is_signalled() {
                        debug!(peer = %self.peer, error = %err, "connection read failed");
                    }
                    break;
                }
            };
            read_pos += n;

            // Consume every complete record the window now holds
            loop {
                let Some(mut pack) = self.pool.acquire().await else {
                    return;
                };
                let scan = find_frame(&buf[scan_pos..read_pos], &mut header, &mut pack.payload);
                scan_pos += scan.consumed;

                let Some(found) = header.as_ref() else {
                    // No boundary (or header region still partial)
                    pack.recycle();
                    break;
                };
                if found.message_length as usize != pack.payload.len() {
                    // Payload still pending, or a truncated copy
                    pack.recycle();
                    break;
                }

                let encoding = found.message_encoding;
                header = None;
                if self.decoder_chans[encoding as usize].send(pack).await.is_err() {
                    warn!(peer = %self.peer, encoding = encoding.as_str(), "decoder channel closed; dropping connection");
                    return;
                }
            }

            // Make room at the end of the buffer. With a decoded header the
            // pending frame's exact extent is known (the scan position sits
            // on its separator, so the length byte follows it); without one,
            // keep at least a maximum-size header's worth of free space.
            let cramped = match header.as_ref() {
                Some(h) => {
                    let header_len = buf[scan_pos + 1] as usize;
                    scan_pos + header_len + 3 + h.message_length as usize > buf.len()
                }
                None => buf.len() - scan_pos < MAX_HEADER_SIZE,
            };
            if cramped {
                if scan_pos == 0 {
                    // The frame can never fit even from the buffer's start
                    warn!(peer = %self.peer, "receive buffer cannot hold the pending frame; closing connection");
                    return;
                }
                buf.copy_within(scan_pos..read_pos, 0);
                read_pos -= scan_pos;
                scan_pos = 0;
            }
        }
    }
}
