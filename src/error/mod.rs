//! Error Handling Module
//!
//! This module provides the error type shared by every layer of the crate:
//! - Core error types (`AudifyError`, `RetryError`)
//! - `is_cancelled`, which the decorators use to stop early, and
//!   `user_message`, the caller-safe text of masked stream errors
//! - Type conversions from the foreign errors we meet at the boundaries
//!
//! # Example
//!
//! ```rust
//! use audify::error::AudifyError;
//!
//! let error = AudifyError::HttpError("connection reset".into());
//! assert!(!error.is_cancelled());
//! assert_eq!(error.user_message(), "upstream search service is unavailable");
//! ```

mod conversions;
pub mod types;

pub use types::*;

/// Result type alias for audify operations.
pub type Result<T> = std::result::Result<T, AudifyError>;
