//! Search service
//!
//! [`AudifyService`] implements the three RPC operations independent of
//! the transport: a streaming search, a one-shot shutdown and a version
//! query. The HTTP surface in [`crate::server`] is a thin layer over it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::AudifyClient;
use crate::context::Context;
use crate::error::{AudifyError, Result};
use crate::types::SearchRequest;

pub mod messages;

pub use messages::{SearchReply, SearchRpcRequest, ShutdownReply, VersionInfo, VersionReply};

/// Server-side limit on one search, including retries and backoff.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(6);

/// Destination of streamed search replies.
#[async_trait]
pub trait SearchSink: Send {
    async fn send(&mut self, reply: SearchReply) -> Result<()>;
}

#[async_trait]
impl SearchSink for mpsc::Sender<Result<SearchReply>> {
    async fn send(&mut self, reply: SearchReply) -> Result<()> {
        mpsc::Sender::send(self, Ok(reply))
            .await
            .map_err(|_| AudifyError::StreamClosed("search consumer went away".to_string()))
    }
}

/// One-shot shutdown signal.
///
/// Only the first [`ShutdownSignal::trigger`] fires; later calls are no-ops
/// that report `false`.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Resolves once the signal has fired.
    pub async fn wait(&self) {
        self.token.cancelled().await
    }

    /// Token cancelled together with the signal, for background tasks.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

pub struct AudifyService {
    client: AudifyClient,
    version: VersionInfo,
    shutdown: ShutdownSignal,
    search_timeout: Duration,
}

impl AudifyService {
    pub fn new(client: AudifyClient, version: VersionInfo) -> Self {
        Self {
            client,
            version,
            shutdown: ShutdownSignal::new(),
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn with_shutdown_signal(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Run one search and stream every item to `sink` in upstream order.
    ///
    /// Nothing is sent when the search fails. A failed send stops the
    /// stream and is returned as is.
    pub async fn search<S>(&self, ctx: &Context, req: SearchRpcRequest, sink: &mut S) -> Result<()>
    where
        S: SearchSink + ?Sized,
    {
        let span = tracing::info_span!(
            target: "audify::service",
            "search",
            request_id = %Uuid::new_v4()
        );

        async move {
            let request = SearchRequest::from(req);
            tracing::info!(
                target: "audify::service",
                tags = ?request.tag_list(),
                source = request.source(),
                "search"
            );

            let ctx = ctx.with_timeout(self.search_timeout);
            let items = match self.client.search(&ctx, &request).await {
                Ok(items) => items,
                Err(error) => {
                    tracing::warn!(target: "audify::service", err = %error, "search failed");
                    return Err(error);
                }
            };

            let count = items.len();
            for item in items {
                sink.send(SearchReply::from(item)).await?;
            }
            tracing::info!(target: "audify::service", count, "search streamed");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Signal the process to stop. Safe to call any number of times.
    pub fn shutdown(&self) -> ShutdownReply {
        if self.shutdown.trigger() {
            tracing::info!(target: "audify::service", "shutdown requested");
        } else {
            tracing::warn!(target: "audify::service", "shutdown already requested");
        }
        ShutdownReply {}
    }

    pub fn version(&self) -> VersionReply {
        VersionReply::from(&self.version)
    }
}
