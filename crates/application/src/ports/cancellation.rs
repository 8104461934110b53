//! Cooperative cancellation scope.
//!
//! One token/receiver pair is threaded through an entire execution call.
//! Firing the token must unwind every blocking wait inside that call
//! promptly; dropping the token without firing it must not.

use std::sync::Arc;

use tokio::sync::watch;

/// The caller-owned handle that fires a cancellation scope.
#[derive(Debug)]
pub struct CancellationToken {
    sender: watch::Sender<bool>,
}

/// The executor-side view of a cancellation scope. Cloneable so every
/// suspension point in one call can observe the same scope.
#[derive(Debug, Clone)]
pub struct CancellationReceiver {
    receiver: watch::Receiver<bool>,
    // Set only by `never`: keeps the channel open so `cancelled` pends
    // instead of observing a dropped sender.
    keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl CancellationToken {
    /// Creates a fresh scope.
    #[must_use]
    pub fn new() -> (Self, CancellationReceiver) {
        let (sender, receiver) = watch::channel(false);
        (
            Self { sender },
            CancellationReceiver {
                receiver,
                keepalive: None,
            },
        )
    }

    /// Fires the scope. Idempotent.
    pub fn cancel(&self) {
        // Receivers may already be gone; that is not an error.
        let _ = self.sender.send(true);
    }
}

impl CancellationReceiver {
    /// Creates a receiver whose scope can never fire. Useful when a caller
    /// has no cancellation requirement.
    #[must_use]
    pub fn never() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            receiver,
            keepalive: Some(Arc::new(sender)),
        }
    }

    /// Returns true if the scope has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves when the scope fires. If the token is dropped without
    /// firing, this pends forever rather than resolving spuriously.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                // Token dropped without cancelling; never resolve.
                std::future::pending::<()>().await;
            }
        }
    }
}
