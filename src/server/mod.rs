//! RPC surface over HTTP
//!
//! The search call is exposed as server-sent events: every result is an
//! `item` event and a failure ends the stream with a single `error` event.
//! Shutdown and version are plain JSON endpoints.
//!
//! | Route            | Reply                               |
//! |------------------|-------------------------------------|
//! | `POST /search`   | `text/event-stream` of `item` frames |
//! | `POST /shutdown` | `{}`                                |
//! | `GET /version`   | `{"version": .., "dependencies": [..]}` |

pub mod axum;

pub use self::axum::{router, serve, to_sse_response};

/// How errors are rendered into the event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SseOptions {
    /// Replace error details with a caller-safe message.
    ///
    /// Recommended outside development so upstream hostnames and transport
    /// details are not leaked to callers.
    pub mask_errors: bool,

    /// Message used for every error when `mask_errors` is set. Without it
    /// the error's [`AudifyError::user_message`] is used.
    ///
    /// [`AudifyError::user_message`]: crate::error::AudifyError::user_message
    pub masked_error_message: Option<String>,
}

impl Default for SseOptions {
    fn default() -> Self {
        Self::production()
    }
}

impl SseOptions {
    /// Full error text in `error` events.
    pub fn development() -> Self {
        Self {
            mask_errors: false,
            masked_error_message: None,
        }
    }

    pub fn production() -> Self {
        Self {
            mask_errors: true,
            masked_error_message: None,
        }
    }

    pub fn with_masked_error_message(mut self, message: impl Into<String>) -> Self {
        self.masked_error_message = Some(message.into());
        self
    }

    pub(crate) fn render_error(&self, error: &crate::error::AudifyError) -> String {
        if self.mask_errors {
            self.masked_error_message
                .clone()
                .unwrap_or_else(|| error.user_message())
        } else {
            error.to_string()
        }
    }
}
