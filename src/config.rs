//! Process configuration
//!
//! Built once at startup from `AUDIFY_*` environment variables and passed
//! by value into the constructors that need it.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `AUDIFY_LISTEN` | `0.0.0.0:50051` |
//! | `AUDIFY_API_URL` | `https://api.audify.fm/streams/recent` |
//! | `AUDIFY_RETRY_ATTEMPTS` | `3` |
//! | `AUDIFY_BACKOFF_MS` | `1000` |
//! | `AUDIFY_HTTP_TIMEOUT_SECS` | unset |
//! | `AUDIFY_SEARCH_TIMEOUT_SECS` | `6` |
//! | `AUDIFY_MASK_ERRORS` | `true` |
//! | `AUDIFY_CACHE_CAPACITY` | `1024` |
//! | `AUDIFY_CACHE_EXPIRY_SECS` | `300` |
//! | `AUDIFY_CACHE_CLEANUP_SECS` | `600` |
//! | `AUDIFY_VERSION` | `dev-build` |
//! | `AUDIFY_DEPENDENCIES` | `dev-build null` |
//!
//! Logging variables are read by [`crate::telemetry::config_from_lookup`].

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::client::ClientConfig;
use crate::error::{AudifyError, Result};
use crate::service::{DEFAULT_SEARCH_TIMEOUT, VersionInfo};
use crate::telemetry::{self, SubscriberConfig};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:50051";

/// Everything the binary needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    /// Server-side limit on one search call
    pub search_timeout: Duration,
    /// Hide error details from RPC callers
    pub mask_errors: bool,
    pub version: VersionInfo,
    pub client: ClientConfig,
    pub cache: CacheConfig,
    pub telemetry: SubscriberConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 50051)),
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            mask_errors: true,
            version: VersionInfo::default(),
            client: ClientConfig::default(),
            cache: CacheConfig::default(),
            telemetry: SubscriberConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("AUDIFY_LISTEN") {
            config.listen_addr = parse_listen_addr(&addr)?;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "AUDIFY_SEARCH_TIMEOUT_SECS")? {
            config.search_timeout = Duration::from_secs(secs);
        }
        if let Some(mask) = parse_var::<bool, _>(&lookup, "AUDIFY_MASK_ERRORS")? {
            config.mask_errors = mask;
        }

        let binary = lookup("AUDIFY_VERSION");
        let dependencies = lookup("AUDIFY_DEPENDENCIES");
        if binary.is_some() || dependencies.is_some() {
            let defaults = VersionInfo::default();
            config.version = VersionInfo::new(
                binary.unwrap_or(defaults.binary),
                dependencies.as_deref().unwrap_or("dev-build null"),
            );
        }

        if let Some(url) = lookup("AUDIFY_API_URL") {
            config.client.api_url = url;
        }
        if let Some(attempts) = parse_var(&lookup, "AUDIFY_RETRY_ATTEMPTS")? {
            config.client.retry_attempts = attempts;
        }
        if let Some(ms) = parse_var(&lookup, "AUDIFY_BACKOFF_MS")? {
            config.client.backoff = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var(&lookup, "AUDIFY_HTTP_TIMEOUT_SECS")? {
            config.client.timeout = Some(Duration::from_secs(secs));
        }

        if let Some(capacity) = parse_var(&lookup, "AUDIFY_CACHE_CAPACITY")? {
            config.cache.capacity = capacity;
        }
        if let Some(secs) = parse_var(&lookup, "AUDIFY_CACHE_EXPIRY_SECS")? {
            config.cache.default_expiry = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "AUDIFY_CACHE_CLEANUP_SECS")? {
            config.cache.cleanup_interval = Duration::from_secs(secs);
        }

        config.telemetry = telemetry::config_from_lookup(&lookup)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.search_timeout.is_zero() {
            return Err(AudifyError::ConfigurationError(
                "search timeout must be greater than zero".to_string(),
            ));
        }
        self.client.validate()?;
        self.cache.validate()
    }
}

/// Accepts `host:port` or a bare `:port`, which listens on all interfaces.
fn parse_listen_addr(raw: &str) -> Result<SocketAddr> {
    let raw = raw.trim();
    let candidate = match raw.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => raw.to_string(),
    };
    candidate.parse().map_err(|e| {
        AudifyError::ConfigurationError(format!("invalid listen address {raw:?}: {e}"))
    })
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AudifyError::ConfigurationError(format!("invalid {key} {raw:?}: {e}"))),
    }
}
