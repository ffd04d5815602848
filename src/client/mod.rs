//! Pipeline client
//!
//! [`AudifyClient`] turns a [`SearchRequest`] into the upstream GET request,
//! runs it through its executor stack and decodes the items.

use std::sync::Arc;

use reqwest::{Method, Url};

use crate::cache::ResponseCache;
use crate::context::Context;
use crate::error::{AudifyError, Result};
use crate::executor::{self, Executor, HttpExecutor};
use crate::types::{Item, SearchRequest, SearchResponse};

pub mod config;

pub use config::{ClientConfig, DEFAULT_API_URL};

/// Value of the `duration` query parameter sent with every search.
pub const DEFAULT_DURATION: &str = "1800";

/// Search client bound to one upstream endpoint.
#[derive(Clone)]
pub struct AudifyClient {
    base_url: Url,
    http_client: reqwest::Client,
    executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for AudifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudifyClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AudifyClient {
    /// Client that performs bare round trips with no decorators.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_executor(base_url, Arc::new(HttpExecutor))
    }

    pub fn with_executor(base_url: &str, executor: Arc<dyn Executor>) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http_client: reqwest::Client::new(),
            executor,
        })
    }

    /// Client over the production decorator stack.
    pub fn from_config(config: &ClientConfig, cache: Arc<dyn ResponseCache>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base_url: parse_base_url(&config.api_url)?,
            http_client: config.http_client()?,
            executor: executor::default_stack(cache, config.retry_attempts, config.backoff),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the outbound request for `req`.
    ///
    /// `duration` is always sent, `tag` only when there are tags (joined
    /// with commas, in order) and `source` only when it is non-empty.
    pub fn build_request(&self, req: &SearchRequest) -> Result<reqwest::Request> {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("duration", DEFAULT_DURATION);
            if !req.tag_list().is_empty() {
                query.append_pair("tag", &req.tag_list().join(","));
            }
            if !req.source().is_empty() {
                query.append_pair("source", req.source());
            }
        }
        Ok(reqwest::Request::new(Method::GET, url))
    }

    /// Run one search and return the items in upstream order.
    ///
    /// A non-success status is not an error by itself; the body is decoded
    /// either way and a decode failure is returned as
    /// [`AudifyError::ParseError`].
    pub async fn search(&self, ctx: &Context, req: &SearchRequest) -> Result<Vec<Item>> {
        let request = self.build_request(req)?;
        ctx.check()?;

        let response = self
            .executor
            .execute(ctx, &self.http_client, &request)
            .await?;

        if !response.status().is_success() {
            tracing::debug!(
                target: "audify::http",
                status = %response.status_line(),
                "upstream returned non-success status"
            );
        }

        let body: SearchResponse = response.json()?;
        Ok(body.items)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    Url::parse(raw)
        .map_err(|e| AudifyError::ConfigurationError(format!("invalid api url {raw:?}: {e}")))
}
