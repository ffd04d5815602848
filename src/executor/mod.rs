//! Request execution pipeline
//!
//! An [`Executor`] performs exactly one outbound HTTP round trip. The
//! decorators in this module each wrap another executor and add a single
//! concern while keeping the same contract, so they can be stacked in any
//! order:
//!
//! - [`Logging`] records the URL and outcome of every call
//! - [`Caching`] serves repeated URLs from a [`ResponseCache`]
//! - [`BackingOff`] sleeps a fixed delay after a failure
//! - [`Retrying`] re-runs the stack a bounded number of times
//!
//! [`ExecutorBuilder`] composes them explicitly, innermost first:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use audify::cache::{CacheConfig, TtlCache};
//! use audify::executor::{CapturedResponse, ExecutorBuilder, HttpExecutor};
//!
//! let cache = Arc::new(TtlCache::<CapturedResponse>::new(CacheConfig::default()));
//! let executor = ExecutorBuilder::new(HttpExecutor)
//!     .logging()
//!     .caching(cache)
//!     .backoff(Duration::from_secs(1))
//!     .retrying(3)
//!     .build();
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::ResponseCache;
use crate::context::Context;
use crate::error::Result;

pub mod backoff;
pub mod caching;
pub mod http;
pub mod logging;
pub mod response;
pub mod retry;

pub use backoff::BackingOff;
pub use caching::{CACHE_TTL, Caching};
pub use http::HttpExecutor;
pub use logging::Logging;
pub use response::CapturedResponse;
pub use retry::Retrying;

/// Perform one outbound HTTP call.
///
/// Implementations must fail with [`crate::error::AudifyError::Cancelled`]
/// without touching the layer below when `ctx` is already done.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(
        &self,
        ctx: &Context,
        client: &reqwest::Client,
        request: &reqwest::Request,
    ) -> Result<CapturedResponse>;
}

/// Stacks decorators around a transport, each call wrapping the current stack.
pub struct ExecutorBuilder {
    current: Arc<dyn Executor>,
}

impl ExecutorBuilder {
    pub fn new<E: Executor + 'static>(transport: E) -> Self {
        Self {
            current: Arc::new(transport),
        }
    }

    pub fn from_shared(transport: Arc<dyn Executor>) -> Self {
        Self { current: transport }
    }

    pub fn logging(self) -> Self {
        Self {
            current: Arc::new(Logging::new(self.current)),
        }
    }

    pub fn caching(self, cache: Arc<dyn ResponseCache>) -> Self {
        Self {
            current: Arc::new(Caching::new(self.current, cache)),
        }
    }

    pub fn backoff(self, delay: Duration) -> Self {
        Self {
            current: Arc::new(BackingOff::new(self.current, delay)),
        }
    }

    pub fn retrying(self, attempts: u32) -> Self {
        Self {
            current: Arc::new(Retrying::new(self.current, attempts)),
        }
    }

    pub fn build(self) -> Arc<dyn Executor> {
        self.current
    }
}

/// The production stack: Retrying ⊃ BackingOff ⊃ Caching ⊃ Logging ⊃ HTTP.
pub fn default_stack(
    cache: Arc<dyn ResponseCache>,
    attempts: u32,
    delay: Duration,
) -> Arc<dyn Executor> {
    ExecutorBuilder::new(HttpExecutor)
        .logging()
        .caching(cache)
        .backoff(delay)
        .retrying(attempts)
        .build()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted executors and request helpers shared by the decorator tests.

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use reqwest::{Method, StatusCode, Url};

    use super::{CapturedResponse, Executor};
    use crate::context::Context;
    use crate::error::Result;

    type Script = Box<dyn Fn(usize) -> Result<CapturedResponse> + Send + Sync>;

    /// Returns whatever its script produces for the 1-based call number.
    pub(crate) struct ScriptedExecutor {
        calls: AtomicUsize,
        script: Script,
    }

    impl ScriptedExecutor {
        pub(crate) fn new<F>(script: F) -> Arc<Self>
        where
            F: Fn(usize) -> Result<CapturedResponse> + Send + Sync + 'static,
        {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Box::new(script),
            })
        }

        pub(crate) fn always(result: Result<CapturedResponse>) -> Arc<Self> {
            Self::new(move |_| result.clone())
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Executor for ScriptedExecutor {
        async fn execute(
            &self,
            _ctx: &Context,
            _client: &reqwest::Client,
            _request: &reqwest::Request,
        ) -> Result<CapturedResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            (self.script)(call)
        }
    }

    pub(crate) fn get(url: &str) -> reqwest::Request {
        reqwest::Request::new(Method::GET, Url::parse(url).unwrap())
    }

    pub(crate) fn ok_response(body: &str) -> CapturedResponse {
        CapturedResponse::new(StatusCode::OK, body.to_string())
    }
}
