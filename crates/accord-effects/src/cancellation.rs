//! Watch-channel cancellation.

use accord_core::{CancellationToken, OperationContext};
use std::sync::Arc;
use tokio::sync::watch;

/// Owner side of a cancellation signal.
///
/// Tokens handed out by [`token`](Self::token) fire once [`cancel`](Self::cancel)
/// is called. Dropping the source without cancelling leaves them pending.
#[derive(Debug)]
pub struct CancellationSource {
    cancel_tx: watch::Sender<bool>,
}

impl CancellationSource {
    /// New, uncancelled source.
    pub fn new() -> Self {
        let (cancel_tx, _cancel_rx) = watch::channel(false);
        Self { cancel_tx }
    }

    /// Token observing this source.
    pub fn token(&self) -> Arc<dyn CancellationToken> {
        Arc::new(WatchCancellationToken {
            cancel_rx: self.cancel_tx.subscribe(),
        })
    }

    /// Operation context bound to this source.
    pub fn context(&self) -> OperationContext {
        OperationContext::with_cancellation(self.token())
    }

    /// Fire every token.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct WatchCancellationToken {
    cancel_rx: watch::Receiver<bool>,
}

#[async_trait::async_trait]
impl CancellationToken for WatchCancellationToken {
    async fn cancelled(&self) {
        let mut cancel_rx = self.cancel_rx.clone();
        loop {
            if *cancel_rx.borrow() {
                return;
            }
            if cancel_rx.changed().await.is_err() {
                // Source dropped without cancelling.
                std::future::pending::<()>().await;
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }
}
