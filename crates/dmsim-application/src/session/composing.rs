//! The "agent is composing" indicator.
//!
//! Holds the number of sends currently awaiting the AI backend. The flag is
//! raised while that number is non-zero.

use std::sync::Arc;
use tokio::sync::watch;

/// Owner side, kept by the session manager.
#[derive(Clone)]
pub(crate) struct ComposingTracker {
    in_flight: Arc<watch::Sender<usize>>,
}

impl ComposingTracker {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            in_flight: Arc::new(tx),
        }
    }

    /// Raises the flag until the returned guard is dropped.
    pub(crate) fn begin(&self) -> ComposingGuard {
        self.in_flight.send_modify(|n| *n += 1);
        ComposingGuard {
            in_flight: self.in_flight.clone(),
        }
    }

    pub(crate) fn is_composing(&self) -> bool {
        *self.in_flight.borrow() > 0
    }

    pub(crate) fn indicator(&self) -> ComposingIndicator {
        ComposingIndicator {
            rx: self.in_flight.subscribe(),
        }
    }
}

/// Lowers the flag on drop, including when a send future is dropped mid-flight.
pub(crate) struct ComposingGuard {
    in_flight: Arc<watch::Sender<usize>>,
}

impl Drop for ComposingGuard {
    fn drop(&mut self) {
        self.in_flight.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Read side for a presentation layer.
#[derive(Clone)]
pub struct ComposingIndicator {
    rx: watch::Receiver<usize>,
}

impl ComposingIndicator {
    pub fn is_composing(&self) -> bool {
        *self.rx.borrow() > 0
    }

    /// Waits until the flag equals `composing`.
    pub async fn wait_for(&mut self, composing: bool) {
        // The sender lives as long as the manager; a closed channel just ends the wait.
        let _ = self.rx.wait_for(|n| (*n > 0) == composing).await;
    }
}
