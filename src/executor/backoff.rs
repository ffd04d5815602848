//! Fixed backoff decorator

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{CapturedResponse, Executor};
use crate::context::Context;
use crate::error::Result;

/// Sleeps for a fixed delay after every failed inner call.
///
/// The delay is not adaptive and not cumulative: each failed invocation
/// costs exactly one `delay`, and successes return immediately. The sleep
/// ends early if the context is cancelled, leaving the next checkpoint to
/// report the cancellation.
pub struct BackingOff {
    inner: Arc<dyn Executor>,
    delay: Duration,
}

impl BackingOff {
    pub fn new(inner: Arc<dyn Executor>, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Delay expressed in nanoseconds.
    pub fn from_nanos(inner: Arc<dyn Executor>, nanos: u64) -> Self {
        Self::new(inner, Duration::from_nanos(nanos))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Executor for BackingOff {
    async fn execute(
        &self,
        ctx: &Context,
        client: &reqwest::Client,
        request: &reqwest::Request,
    ) -> Result<CapturedResponse> {
        ctx.check()?;

        let result = self.inner.execute(ctx, client, request).await;

        if matches!(&result, Err(error) if !error.is_cancelled()) {
            tracing::debug!(target: "audify::http", delay_ms = self.delay.as_millis() as u64, "backing off");
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = ctx.done() => {}
            }
        }

        result
    }
}
