//! Shutdown Coordination
//!
//! A process-wide broadcast signal plus a completion barrier. Inputs (and
//! per-connection handler tasks) subscribe once at startup; on the signal
//! each stops accepting/reading, drops its sockets, and implicitly reports
//! completion by dropping its token. The owning process awaits
//! [`ShutdownCoordinator::wait_idle`] to know everything has fully stopped.
//!
//! Tokens tolerate the signal arriving before, during, or after any await:
//! a token subscribed after the signal fired observes it immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Owner side: fires the signal and awaits full stop
pub struct ShutdownCoordinator {
    handle: ShutdownHandle,
    done_rx: mpsc::Receiver<()>,
}

/// Cloneable subscription point handed to inputs
#[derive(Clone)]
pub struct ShutdownHandle {
    notify: broadcast::Sender<()>,
    fired: Arc<AtomicBool>,
    done_tx: mpsc::Sender<()>,
}

/// One task's view of the shutdown signal
///
/// Dropping the token is the task's completion report.
pub struct ShutdownToken {
    notify: broadcast::Receiver<()>,
    fired: Arc<AtomicBool>,
    _done: mpsc::Sender<()>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        let (done_tx, done_rx) = mpsc::channel(1);
        Self {
            handle: ShutdownHandle {
                notify,
                fired: Arc::new(AtomicBool::new(false)),
                done_tx,
            },
            done_rx,
        }
    }

    /// Cloneable handle for subscribing tasks
    pub fn handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    /// Subscribe one task
    pub fn subscribe(&self) -> ShutdownToken {
        self.handle.subscribe()
    }

    /// Broadcast the shutdown signal
    pub fn signal(&self) {
        self.handle.fired.store(true, Ordering::SeqCst);
        // No receivers is fine; the fired flag covers late subscribers
        let _ = self.handle.notify.send(());
    }

    /// Resolve once every outstanding token has been dropped
    pub async fn wait_idle(self) {
        let ShutdownCoordinator { handle, mut done_rx } = self;
        let ShutdownHandle {
            notify,
            fired: _,
            done_tx,
        } = handle;
        drop(done_tx);
        while done_rx.recv().await.is_some() {}
        drop(notify);
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn subscribe(&self) -> ShutdownToken {
        ShutdownToken {
            notify: self.notify.subscribe(),
            fired: self.fired.clone(),
            _done: self.done_tx.clone(),
        }
    }
}

impl ShutdownToken {
    /// Wait for the shutdown signal
    ///
    /// Resolves immediately if the signal already fired, including before
    /// this token subscribed.
    pub async fn recv(&mut self) {
        if self.fired.load(Ordering::SeqCst) {
            return;
        }
        // Lagged and Closed both mean the signal has been observed or the
        // coordinator is gone; either way this task must stop.
        let _ = self.notify.recv().await;
    }

    /// Whether the signal has fired, for suppressing shutdown-induced
    /// I/O errors in log output
    pub fn is_signalled(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn signal_reaches_subscriber() {
        let coordinator = ShutdownCoordinator::new();
        let mut token = coordinator.subscribe();

        coordinator.signal();
        timeout(Duration::from_secs(1), token.recv())
            .await
            .expect("signal should arrive");
        assert!(token.is_signalled());
    }

    #[tokio::test]
    async fn late_subscriber_sees_fired_signal() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.signal();

        let mut token = coordinator.subscribe();
        timeout(Duration::from_secs(1), token.recv())
            .await
            .expect("already-fired signal should resolve immediately");
    }

    #[tokio::test]
    async fn wait_idle_blocks_on_live_tokens() {
        let coordinator = ShutdownCoordinator::new();
        let mut token = coordinator.subscribe();

        let worker = tokio::spawn(async move {
            token.recv().await;
            // Token dropped here reports completion
        });

        coordinator.signal();
        timeout(Duration::from_secs(1), coordinator.wait_idle())
            .await
            .expect("wait_idle should resolve after the worker exits");
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn token_outliving_the_signal_stalls_wait_idle() {
        let coordinator = ShutdownCoordinator::new();
        let token = coordinator.subscribe();

        coordinator.signal();
        let stalled = timeout(Duration::from_millis(50), coordinator.wait_idle()).await;
        assert!(stalled.is_err());
        drop(token);
    }
}
