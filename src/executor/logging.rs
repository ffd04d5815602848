//! Logging decorator

use std::sync::Arc;

use async_trait::async_trait;

use super::{CapturedResponse, Executor};
use crate::context::Context;
use crate::error::Result;

/// Records every round trip through `tracing` and passes the result on untouched.
pub struct Logging {
    inner: Arc<dyn Executor>,
}

impl Logging {
    pub fn new(inner: Arc<dyn Executor>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Executor for Logging {
    async fn execute(
        &self,
        ctx: &Context,
        client: &reqwest::Client,
        request: &reqwest::Request,
    ) -> Result<CapturedResponse> {
        ctx.check()?;

        let result = self.inner.execute(ctx, client, request).await;

        let url = request.url();
        tracing::info!(target: "audify::http", url = %url, "request");
        match &result {
            Ok(response) => {
                tracing::info!(target: "audify::http", url = %url, status = %response.status_line(), "response");
            }
            Err(error) => {
                tracing::warn!(target: "audify::http", url = %url, err = %error, "request failed");
            }
        }

        result
    }
}
