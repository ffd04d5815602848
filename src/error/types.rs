use std::fmt;

use thiserror::Error;

/// Unified error type for the search pipeline and its RPC surface.
///
/// Foreign errors are stringified when they cross into this type so the
/// enum stays `Clone` and can be collected by [`RetryError`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudifyError {
    /// The request context was cancelled or its deadline passed
    #[error("context cancelled")]
    Cancelled,

    /// Transport-level failure performing the upstream call
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The upstream body could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Cache could not be read
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Cache could not be written
    #[error("Cache write failed: {0}")]
    CacheWriteError(String),

    /// Every retry attempt failed
    #[error("{0}")]
    RetryExhausted(RetryError),

    /// The RPC consumer went away while items were being sent
    #[error("Stream closed: {0}")]
    StreamClosed(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// I/O failure (listener, log file)
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AudifyError {
    /// True for the cancellation error raised at context checkpoints.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Short message safe to hand back to RPC callers.
    pub fn user_message(&self) -> String {
        match self {
            Self::Cancelled => "request cancelled or timed out".to_string(),
            Self::HttpError(_) | Self::RetryExhausted(_) => {
                "upstream search service is unavailable".to_string()
            }
            Self::ParseError(_) => "upstream search service returned an invalid response".to_string(),
            Self::StreamClosed(_) => "stream closed".to_string(),
            _ => "internal error".to_string(),
        }
    }
}

/// Aggregate produced by the retrying decorator once all attempts failed.
///
/// `errors` holds one entry per failed attempt, in attempt order, and never
/// grows beyond `attempts`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryError {
    pub attempts: u32,
    pub errors: Vec<AudifyError>,
    pub message: String,
}

impl RetryError {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            errors: Vec::new(),
            message: String::new(),
        }
    }

    /// Record the error of one failed attempt.
    pub fn append(&mut self, error: AudifyError) {
        if self.errors.len() < self.attempts as usize {
            self.errors.push(error);
        }
    }

    /// Error of the last failed attempt, if any.
    pub fn last(&self) -> Option<&AudifyError> {
        self.errors.last()
    }

    /// Seal the aggregate with its summary message.
    pub fn finish(mut self) -> Self {
        self.message = format!(
            "failed to make request, made {} attempts",
            self.errors.len()
        );
        self
    }
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "failed to make request, made {} attempts", self.attempts)?;
        } else {
            f.write_str(&self.message)?;
        }
        if let Some(last) = self.last() {
            write!(f, " (last error: {last})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_error_keeps_attempt_order() {
        let mut agg = RetryError::new(3);
        agg.append(AudifyError::HttpError("first".into()));
        agg.append(AudifyError::HttpError("second".into()));
        agg.append(AudifyError::HttpError("third".into()));
        let agg = agg.finish();

        assert_eq!(agg.errors.len(), 3);
        assert_eq!(agg.errors[0], AudifyError::HttpError("first".into()));
        assert_eq!(agg.errors[2], AudifyError::HttpError("third".into()));
        assert_eq!(agg.message, "failed to make request, made 3 attempts");
    }

    #[test]
    fn retry_error_never_exceeds_attempts() {
        let mut agg = RetryError::new(2);
        for i in 0..5 {
            agg.append(AudifyError::HttpError(format!("e{i}")));
        }
        assert_eq!(agg.errors.len(), 2);
    }

    #[test]
    fn display_mentions_last_error() {
        let mut agg = RetryError::new(1);
        agg.append(AudifyError::HttpError("boom".into()));
        let text = AudifyError::RetryExhausted(agg.finish()).to_string();
        assert!(text.contains("made 1 attempts"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn huge_attempt_count_allocates_lazily() {
        let mut agg = RetryError::new(u32::MAX);
        assert_eq!(agg.errors.capacity(), 0);

        agg.append(AudifyError::HttpError("only".into()));
        let agg = agg.finish();
        assert_eq!(agg.attempts, u32::MAX);
        assert_eq!(agg.errors.len(), 1);
        assert_eq!(agg.message, "failed to make request, made 1 attempts");
    }

    #[test]
    fn classification() {
        assert!(AudifyError::Cancelled.is_cancelled());
        assert!(!AudifyError::HttpError("x".into()).is_cancelled());
        assert_eq!(
            AudifyError::HttpError("secret host".into()).user_message(),
            "upstream search service is unavailable"
        );
    }
}
