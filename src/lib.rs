//! # Audify
//!
//! A long-lived search service in front of the audify.fm content API.
//! Callers issue a streaming search; the service runs one upstream HTTP
//! search through a resilient execution pipeline and streams back every
//! result item in upstream order.
//!
//! ## Pipeline
//!
//! Each upstream call travels through a stack of [`executor::Executor`]
//! decorators, outermost first:
//!
//! - **Retrying**: up to N attempts, failures collected into one aggregate
//! - **BackingOff**: a fixed delay after every failed attempt
//! - **Caching**: responses cached by full URL for fifteen minutes
//! - **Logging**: URL and status of every round trip
//! - **HttpExecutor**: the raw `reqwest` call
//!
//! Every layer checks the request [`context::Context`] first, so a
//! cancelled or expired request never reaches the network.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use audify::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let cache = Arc::new(TtlCache::<CapturedResponse>::new(CacheConfig::default()));
//!     let client = AudifyClient::from_config(&ClientConfig::default(), cache)?;
//!
//!     let ctx = Context::background().with_timeout(std::time::Duration::from_secs(6));
//!     let items = client
//!         .search(&ctx, &SearchRequest::tags(["mars"]))
//!         .await?;
//!     for item in items {
//!         println!("{}", item.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `server` (default): the axum SSE surface and the `audify` binary

#![deny(unsafe_code)]

pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
#[cfg(feature = "server")]
pub mod server;
pub mod service;
pub mod telemetry;
pub mod types;

/// Commonly used types.
pub mod prelude {
    pub use crate::cache::{CacheConfig, ResponseCache, TtlCache};
    pub use crate::client::{AudifyClient, ClientConfig};
    pub use crate::config::ServiceConfig;
    pub use crate::context::Context;
    pub use crate::error::{AudifyError, Result, RetryError};
    pub use crate::executor::{CapturedResponse, Executor, ExecutorBuilder, HttpExecutor};
    #[cfg(feature = "server")]
    pub use crate::server::SseOptions;
    pub use crate::service::{AudifyService, SearchReply, SearchRpcRequest, VersionInfo};
    pub use crate::types::{Item, SearchRequest, SearchResponse};
}
