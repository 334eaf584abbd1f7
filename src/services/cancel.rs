//! Cooperative cancellation for orchestrated operations

use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation signal scoped to one orchestrated operation.
///
/// Clones observe the same signal. Requesting cancellation after the
/// operation completed is a harmless no-op.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { flag: Arc::new(tx) }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Wait until cancellation is requested.
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                // Unreachable while a token clone holds the sender alive.
                return;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
