//! Raw transport executor

use async_trait::async_trait;

use super::{CapturedResponse, Executor};
use crate::context::Context;
use crate::error::{AudifyError, Result};

/// Performs the actual round trip with the shared `reqwest::Client`.
///
/// The call is raced against the context so a cancellation or deadline
/// aborts an in-flight request instead of waiting for the upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpExecutor;

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(
        &self,
        ctx: &Context,
        client: &reqwest::Client,
        request: &reqwest::Request,
    ) -> Result<CapturedResponse> {
        ctx.check()?;

        let request = request.try_clone().ok_or_else(|| {
            AudifyError::InternalError("outbound request body cannot be replayed".to_string())
        })?;

        let call = async {
            let response = client.execute(request).await?;
            CapturedResponse::capture(response).await
        };

        tokio::select! {
            biased;
            _ = ctx.done() => Err(AudifyError::Cancelled),
            result = call => result,
        }
    }
}
