//! Operation context for effectful calls.
//!
//! `OperationContext` carries the cancellation token and optional deadline
//! for a single create or resolve call. It is threaded through every
//! suspension point (manifest publish/resolve, controller save/load) so that
//! a cancelled operation drops the in-flight future instead of committing it.

use crate::effects::task::{CancellationToken, NeverCancel};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Why an operation stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelCause {
    /// The cancellation token fired
    Requested,
    /// The deadline passed
    DeadlineExceeded,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("cancellation requested"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Operation-scoped context threaded through effectful calls.
#[derive(Clone)]
pub struct OperationContext {
    cancellation: Arc<dyn CancellationToken>,
    deadline: Option<Instant>,
}

impl OperationContext {
    /// Context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            cancellation: Arc::new(NeverCancel),
            deadline: None,
        }
    }

    /// Context bound to a cancellation token.
    pub fn with_cancellation(token: Arc<dyn CancellationToken>) -> Self {
        Self {
            cancellation: token,
            deadline: None,
        }
    }

    /// Tighten the deadline. A later deadline than the current one is ignored.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Tighten the deadline to `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Current deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the cancellation token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Non-blocking check of both the token and the deadline.
    pub fn check(&self) -> Result<(), CancelCause> {
        if self.cancellation.is_cancelled() {
            return Err(CancelCause::Requested);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(CancelCause::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drive `fut` to completion unless the context is cancelled or its
    /// deadline passes first. On interruption `fut` is dropped unfinished.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, CancelCause>
    where
        F: Future,
    {
        self.check()?;

        let work = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| CancelCause::DeadlineExceeded),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(CancelCause::Requested),
            result = work => result,
        }
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationContext")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.deadline)
            .finish()
    }
}
