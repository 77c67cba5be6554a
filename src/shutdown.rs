//! Cooperative shutdown signal for async tasks.
//!
//! [`ShutdownSignal`] lets the owner of periodic tasks (the status poller
//! handle) request a graceful stop, while the tasks wait on
//! [`ShutdownSignal::cancelled`] next to their timer.

use std::sync::Arc;
use tokio::sync::watch;

/// Cooperative shutdown signal backed by a shared [`watch`] channel.
///
/// The signal is cheaply cloneable so that one clone can live in a control
/// handler while others are awaited inside periodic tasks.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Create a new signal with shutdown **not** requested.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request a graceful shutdown. Idempotent.
    pub fn request_shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Resolve once shutdown is requested (immediately if it already was).
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so `wait_for` cannot fail here.
        let _ = rx.wait_for(|requested| *requested).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
