//! Response cache
//!
//! The pipeline only needs string-keyed get/set with an explicit expiry and
//! a way to report that the backing store cannot be reached. [`TtlCache`]
//! is the in-process implementation used by the binary.

use std::time::Duration;

use crate::error::Result;
use crate::executor::CapturedResponse;

mod ttl;

pub use ttl::{CacheConfig, TtlCache};

/// Strongly typed store for captured upstream responses.
///
/// `get` returns `Ok(None)` on a miss and an error only when the store
/// itself is unavailable.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CapturedResponse>>;

    fn set(&self, key: &str, value: CapturedResponse, ttl: Duration) -> Result<()>;
}
