//! Message Buffer Pool
//!
//! ## Purpose
//!
//! A bounded set of reusable byte-buffer records ("packs") distributed
//! through a channel that doubles as the admission-control gate. Packs are
//! never individually allocated on the hot path after startup: inputs draw
//! them from the pool, fill them in place, and either forward them to a
//! decoder (which recycles them once consumed) or recycle them directly.
//!
//! ## Backpressure
//!
//! `acquire` parking until a pack is free is the sole flow-control
//! mechanism: when decoders and downstream stages fall behind, input
//! handlers block on acquisition instead of buffering unboundedly.
//!
//! ## Ownership
//!
//! A pack in flight is owned by exactly one of {pool, input handler,
//! decoder} at any instant. Recycling consumes the pack, so the type system
//! enforces the release-exactly-once contract.

use codec::MAX_MESSAGE_SIZE;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

/// Reusable buffer record carrying one message's bytes
///
/// The payload is the full interface for later pipeline stages covered
/// here; a pack returns itself to its pool of origin via [`Pack::recycle`].
pub struct Pack {
    /// Message bytes, truncated to the received/extracted length
    pub payload: Vec<u8>,
    home: mpsc::Sender<Pack>,
}

impl Pack {
    fn new(home: mpsc::Sender<Pack>) -> Self {
        Self {
            payload: Vec::with_capacity(MAX_MESSAGE_SIZE),
            home,
        }
    }

    /// Return this pack to its pool for reuse
    ///
    /// Never blocks: the pool channel is sized to the total pack
    /// population, so a recycle slot is always free while the pool lives.
    pub fn recycle(mut self) {
        self.payload.clear();
        let home = self.home.clone();
        if home.try_send(self).is_err() {
            // Pool torn down; the pack is dropped with it
            warn!("pack recycled into a closed pool");
        }
    }
}

impl std::fmt::Debug for Pack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pack")
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// Bounded pool of packs, cloneable across input tasks
#[derive(Clone)]
pub struct PackPool {
    free: Arc<Mutex<mpsc::Receiver<Pack>>>,
    capacity: usize,
}

impl PackPool {
    /// Create a pool pre-populated with `capacity` packs
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        for _ in 0..capacity {
            tx.try_send(Pack::new(tx.clone()))
                .map_err(|_| ())
                .expect("pool channel sized to its pack population");
        }
        Self {
            free: Arc::new(Mutex::new(rx)),
            capacity,
        }
    }

    /// Wait for a free pack
    ///
    /// Returns `None` only once every pack has been dropped rather than
    /// recycled, i.e. the pool is defunct.
    pub async fn acquire(&self) -> Option<Pack> {
        let mut free = self.free.lock().await;
        free.recv().await
    }

    /// Total pack population
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn packs_cycle_through_the_pool() {
        let pool = PackPool::new(2);

        let mut first = pool.acquire().await.unwrap();
        first.payload.extend_from_slice(b"abc");
        let second = pool.acquire().await.unwrap();

        first.recycle();
        second.recycle();

        // Recycled packs come back cleared
        let again = pool.acquire().await.unwrap();
        assert!(again.payload.is_empty());
    }

    #[tokio::test]
    async fn exhausted_pool_blocks_until_recycle() {
        let pool = PackPool::new(1);
        let held = pool.acquire().await.unwrap();

        // Pool is empty; the next acquisition must park
        assert!(timeout(Duration::from_millis(50), pool.acquire())
            .await
            .is_err());

        held.recycle();
        let reacquired = timeout(Duration::from_millis(500), pool.acquire())
            .await
            .expect("recycle should wake the waiter");
        assert!(reacquired.is_some());
    }

    #[tokio::test]
    async fn dropping_every_pack_closes_the_pool() {
        let pool = PackPool::new(1);
        let pack = pool.acquire().await.unwrap();
        drop(pack);

        assert!(pool.acquire().await.is_none());
    }
}
