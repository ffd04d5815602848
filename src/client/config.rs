//! Client configuration
//!
//! Everything the pipeline client needs to reach the upstream API, built
//! once at startup and handed to [`super::AudifyClient::from_config`].

use std::time::Duration;

use crate::error::{AudifyError, Result};

/// Upstream endpoint used when none is configured.
pub const DEFAULT_API_URL: &str = "https://api.audify.fm/streams/recent";

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Fully-qualified search endpoint; the query string is appended per call
    pub api_url: String,
    /// Total attempts per search, including the first
    pub retry_attempts: u32,
    /// Fixed delay after each failed attempt
    pub backoff: Duration,
    /// Transport-level timeout for a single round trip
    pub timeout: Option<Duration>,
    /// User agent sent upstream
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            retry_attempts: 3,
            backoff: Duration::from_secs(1),
            timeout: None,
            user_agent: Some(format!("audify/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Check the URL parses and the attempt count is usable.
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.api_url).map_err(|e| {
            AudifyError::ConfigurationError(format!("invalid api url {:?}: {e}", self.api_url))
        })?;
        if self.retry_attempts == 0 {
            return Err(AudifyError::ConfigurationError(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the shared transport from the timeout and user agent settings.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        builder.build().map_err(|e| {
            AudifyError::ConfigurationError(format!("failed to build HTTP client: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.backoff, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ClientConfig::new("not a url").validate().is_err());
        assert!(
            ClientConfig::default()
                .with_retry_attempts(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn builds_http_client() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(2))
            .with_user_agent("test-agent");
        assert!(config.http_client().is_ok());
    }
}
