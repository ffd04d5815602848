//! Caching decorator

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{CapturedResponse, Executor};
use crate::cache::ResponseCache;
use crate::context::Context;
use crate::error::Result;

/// Lifetime of every entry written by [`Caching`], regardless of the
/// cache's own default expiry.
pub const CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Serves repeated requests from a [`ResponseCache`] keyed by the full URL.
///
/// A failed lookup degrades to a miss, but a failed write is returned to
/// the caller even though the upstream call itself succeeded.
pub struct Caching {
    inner: Arc<dyn Executor>,
    cache: Arc<dyn ResponseCache>,
}

impl Caching {
    pub fn new(inner: Arc<dyn Executor>, cache: Arc<dyn ResponseCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl Executor for Caching {
    async fn execute(
        &self,
        ctx: &Context,
        client: &reqwest::Client,
        request: &reqwest::Request,
    ) -> Result<CapturedResponse> {
        ctx.check()?;

        let key = request.url().as_str();
        match self.cache.get(key) {
            Ok(Some(cached)) => {
                tracing::debug!(target: "audify::cache", key = %key, "cache hit");
                return Ok(cached);
            }
            Ok(None) => {
                tracing::debug!(target: "audify::cache", key = %key, "cache miss");
            }
            Err(error) => {
                tracing::warn!(target: "audify::cache", key = %key, err = %error, "unable to access cache");
            }
        }

        ctx.check()?;
        let response = self.inner.execute(ctx, client, request).await?;

        self.cache.set(key, response.clone(), CACHE_TTL)?;

        Ok(response)
    }
}
