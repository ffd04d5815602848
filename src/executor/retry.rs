//! Retrying decorator

use std::sync::Arc;

use async_trait::async_trait;

use super::{CapturedResponse, Executor};
use crate::context::Context;
use crate::error::{AudifyError, Result, RetryError};

/// Re-runs the inner executor up to a fixed number of attempts.
///
/// Introduces no delay of its own; stack it over [`super::BackingOff`] to
/// space attempts out. A cancellation, either observed at the checkpoint
/// before an attempt or returned by the inner executor, ends the loop with
/// [`AudifyError::Cancelled`] and drops the errors collected so far.
pub struct Retrying {
    inner: Arc<dyn Executor>,
    attempts: u32,
}

impl Retrying {
    /// `attempts` below one is treated as one.
    pub fn new(inner: Arc<dyn Executor>, attempts: u32) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[async_trait]
impl Executor for Retrying {
    async fn execute(
        &self,
        ctx: &Context,
        client: &reqwest::Client,
        request: &reqwest::Request,
    ) -> Result<CapturedResponse> {
        let mut failures = RetryError::new(self.attempts);

        for attempt in 1..=self.attempts {
            ctx.check()?;

            match self.inner.execute(ctx, client, request).await {
                Ok(response) => return Ok(response),
                Err(error) if error.is_cancelled() => return Err(error),
                Err(error) => {
                    tracing::debug!(
                        target: "audify::http",
                        attempt,
                        max_attempts = self.attempts,
                        err = %error,
                        "attempt failed"
                    );
                    failures.append(error);
                }
            }
        }

        Err(AudifyError::RetryExhausted(failures.finish()))
    }
}
