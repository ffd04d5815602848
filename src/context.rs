//! Request context
//!
//! A `Context` travels with one logical request through every executor
//! layer. It combines a cancellation token with an optional deadline, and
//! every layer calls [`Context::check`] before doing work.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{AudifyError, Result};

/// Cancellation-aware request context.
///
/// Clones share the same token, so cancelling any clone cancels them all.
/// Use [`Context::child`] or [`Context::with_timeout`] to derive a context
/// that is cancelled together with its parent but can be cancelled alone.
#[derive(Clone, Debug)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A root context that is never cancelled on its own.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derive a child context sharing this context's deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child context that is done after `timeout`.
    ///
    /// The effective deadline is the earlier of the parent's and the new one.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            token: self.token.child_token(),
            deadline: Some(match self.deadline {
                Some(parent) if parent < deadline => parent,
                _ => deadline,
            }),
        }
    }

    /// Request cancellation of this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context was cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Checkpoint: fail with [`AudifyError::Cancelled`] when the context is done.
    pub fn check(&self) -> Result<()> {
        if self.is_done() {
            Err(AudifyError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves once the context is cancelled or its deadline is reached.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
