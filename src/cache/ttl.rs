use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use lru::LruCache;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::ResponseCache;
use crate::error::{AudifyError, Result};
use crate::executor::CapturedResponse;

/// Sizing and expiry settings for [`TtlCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries before the least recently used is evicted
    pub capacity: usize,
    /// Expiry applied by [`TtlCache::set_default`]
    pub default_expiry: Duration,
    /// Period of the background sweep started by [`TtlCache::spawn_cleanup`]
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            default_expiry: Duration::from_secs(5 * 60),
            cleanup_interval: Duration::from_secs(10 * 60),
        }
    }
}

impl CacheConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_default_expiry(mut self, expiry: Duration) -> Self {
        self.default_expiry = expiry;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(AudifyError::ConfigurationError(
                "cache capacity must be greater than zero".to_string(),
            ));
        }
        if self.cleanup_interval.is_zero() {
            return Err(AudifyError::ConfigurationError(
                "cache cleanup interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// LRU cache with per-entry expiry.
///
/// Expired entries are dropped lazily on read and in bulk by
/// [`TtlCache::purge_expired`]. A poisoned lock makes the cache report
/// itself unavailable rather than panic.
pub struct TtlCache<V> {
    entries: Mutex<LruCache<String, Entry<V>>>,
    default_expiry: Duration,
    cleanup_interval: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_expiry: config.default_expiry,
            cleanup_interval: config.cleanup_interval,
        }
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<String, Entry<V>>>> {
        self.entries.lock().ok()
    }

    /// Fetch a live entry, removing it if it has expired.
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        let mut entries = self
            .lock()
            .ok_or_else(|| AudifyError::CacheUnavailable("cache lock poisoned".to_string()))?;

        let now = Instant::now();
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    /// Store `value` for `ttl`, replacing any previous entry.
    pub fn set(&self, key: &str, value: V, ttl: Duration) -> Result<()> {
        let mut entries = self
            .lock()
            .ok_or_else(|| AudifyError::CacheWriteError("cache lock poisoned".to_string()))?;
        entries.put(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    /// Store `value` with the configured default expiry.
    pub fn set_default(&self, key: &str, value: V) -> Result<()> {
        self.set(key, value, self.default_expiry)
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Some(mut entries) = self.lock() else {
            return 0;
        };
        let now = Instant::now();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone + Send + 'static> TtlCache<V> {
    /// Sweep expired entries every `cleanup_interval` until `token` is cancelled.
    pub fn spawn_cleanup(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = self.cleanup_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired();
                        if removed > 0 {
                            tracing::debug!(target: "audify::cache", removed, "purged expired entries");
                        }
                    }
                }
            }
        })
    }
}

impl ResponseCache for TtlCache<CapturedResponse> {
    fn get(&self, key: &str) -> Result<Option<CapturedResponse>> {
        TtlCache::get(self, key)
    }

    fn set(&self, key: &str, value: CapturedResponse, ttl: Duration) -> Result<()> {
        TtlCache::set(self, key, value, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> TtlCache<String> {
        TtlCache::new(CacheConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = cache();
        cache.set("k", "v".to_string(), Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn set_default_uses_configured_expiry() {
        let cache: TtlCache<String> =
            TtlCache::new(CacheConfig::default().with_default_expiry(Duration::from_secs(10)));
        cache.set_default("k", "v".to_string()).unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.get("k").unwrap().is_some());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("k").unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_removes_only_expired() {
        let cache = cache();
        cache.set("short", "a".to_string(), Duration::from_secs(1)).unwrap();
        cache.set("long", "b".to_string(), Duration::from_secs(600)).unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("long").unwrap().is_some());
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache: TtlCache<u32> = TtlCache::new(CacheConfig::default().with_capacity(2));
        let ttl = Duration::from_secs(60);
        cache.set("a", 1, ttl).unwrap();
        cache.set("b", 2, ttl).unwrap();
        cache.get("a").unwrap();
        cache.set("c", 3, ttl).unwrap();

        assert_eq!(cache.get("a").unwrap(), Some(1));
        assert_eq!(cache.get("b").unwrap(), None);
        assert_eq!(cache.get("c").unwrap(), Some(3));
    }

    #[test]
    fn poisoned_lock_reports_unavailable() {
        let cache = Arc::new(cache());
        let poisoner = Arc::clone(&cache);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("poison the cache lock");
        })
        .join();

        assert!(matches!(cache.get("k"), Err(AudifyError::CacheUnavailable(_))));
        assert!(matches!(
            cache.set("k", "v".to_string(), Duration::from_secs(1)),
            Err(AudifyError::CacheWriteError(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_task_sweeps_until_cancelled() {
        let cache = Arc::new(TtlCache::<String>::new(
            CacheConfig::default().with_cleanup_interval(Duration::from_secs(30)),
        ));
        cache.set("k", "v".to_string(), Duration::from_secs(5)).unwrap();

        let token = CancellationToken::new();
        let handle = cache.spawn_cleanup(token.clone());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(cache.is_empty());

        token.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn config_validation() {
        assert!(CacheConfig::default().validate().is_ok());
        assert!(CacheConfig::default().with_capacity(0).validate().is_err());
        assert!(
            CacheConfig::default()
                .with_cleanup_interval(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
