//! Datagram Input
//!
//! Reads one datagram per pack from a UDP socket (bound from an address or
//! adopted from an inherited file descriptor) and forwards each pack to a
//! single statically configured decoder. No framing: every datagram is one
//! complete message whose encoding the configuration implies.

use crate::decoder::DecoderRegistry;
use crate::error::{InputError, InputResult};
use crate::pool::{Pack, PackPool};
use crate::shutdown::ShutdownToken;
use codec::MAX_MESSAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Sentinel prefix selecting file-descriptor socket handoff
const FD_PREFIX: &str = "fd:";

/// Datagram input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpInputConfig {
    /// `host:port` to bind, or `fd:<descriptor>` for an inherited socket
    pub address: String,
    /// Decoder every datagram is forwarded to
    pub decoder: String,
}

/// Datagram ingestion input
pub struct UdpInput {
    name: String,
    socket: UdpSocket,
    decoder_chan: mpsc::Sender<Pack>,
}

impl UdpInput {
    /// Validate configuration, resolve the decoder, and bind (or adopt)
    /// the socket
    pub async fn new(
        name: impl Into<String>,
        config: UdpInputConfig,
        registry: &DecoderRegistry,
    ) -> InputResult<Self> {
        let name = name.into();
        if config.decoder.is_empty() {
            return Err(InputError::configuration(
                "no decoder specified",
                Some("decoder"),
            ));
        }
        let sink = registry
            .get(&config.decoder)
            .ok_or_else(|| InputError::UnknownDecoder {
                name: config.decoder.clone(),
            })?;

        let socket = if let Some(fd_str) = config.address.strip_prefix(FD_PREFIX) {
            adopt_fd_socket(fd_str, &config.address)?
        } else {
            UdpSocket::bind(&config.address)
                .await
                .map_err(|e| InputError::Bind {
                    addr: config.address.clone(),
                    source: e,
                })?
        };

        sink.start();
        info!(input = %name, address = %config.address, decoder = %config.decoder, "UDP input configured");
        Ok(Self {
            name,
            socket,
            decoder_chan: sink.in_chan(),
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> InputResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive loop: one datagram per pack, forwarded to the decoder.
    ///
    /// A receive error while not stopping reuses the same pack for the next
    /// attempt so a failing socket cannot exhaust the pool. Exits on the
    /// shutdown signal, dropping the socket and then the token (the
    /// completion report).
    pub async fn run(self, pool: PackPool, mut shutdown: ShutdownToken) {
        let mut retry: Option<Pack> = None;
        loop {
            let mut pack = match retry.take() {
                Some(pack) => pack,
                None => match pool.acquire().await {
                    Some(pack) => pack,
                    None => break,
                },
            };
            pack.payload.resize(MAX_MESSAGE_SIZE, 0);

            let received = tokio::select! {
                biased;
                _ = shutdown.recv() => None,
                res = self.socket.recv_from(&mut pack.payload) => Some(res),
            };
            match received {
                None => {
                    pack.recycle();
                    break;
                }
                Some(Ok((n, _peer))) => {
                    pack.payload.truncate(n);
                    if self.decoder_chan.send(pack).await.is_err() {
                        warn!(input = %self.name, "decoder channel closed; stopping UDP input");
                        break;
                    }
                }
                Some(Err(err)) => {
                    if shutdown.is_signalled() {
                        pack.recycle();
                        break;
                    }
                    warn!(input = %self.name, error = %err, "UDP read failed");
                    retry = Some(pack);
                }
            }
        }
        info!(input = %self.name, "UDP input stopped");
    }
}

/// Adopt an inherited datagram socket from a raw file descriptor
#[cfg(unix)]
fn adopt_fd_socket(fd_str: &str, address: &str) -> InputResult<UdpSocket> {
    use std::os::fd::{FromRawFd, RawFd};

    let fd: RawFd = fd_str.trim().parse().map_err(|_| {
        InputError::configuration(format!("invalid file descriptor: {address}"), Some("address"))
    })?;
    if fd < 0 {
        return Err(InputError::configuration(
            format!("invalid file descriptor: {address}"),
            Some("address"),
        ));
    }
    // Ownership of the descriptor transfers to the socket
    let std_socket = unsafe { std::net::UdpSocket::from_raw_fd(fd) };
    std_socket.set_nonblocking(true)?;
    Ok(UdpSocket::from_std(std_socket)?)
}

#[cfg(not(unix))]
fn adopt_fd_socket(_fd_str: &str, address: &str) -> InputResult<UdpSocket> {
    Err(InputError::configuration(
        format!("file descriptor addresses are not supported on this platform: {address}"),
        Some("address"),
    ))
}
