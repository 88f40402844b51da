//! Model backend error types.

use thiserror::Error;

/// Transport failures of a model backend.
///
/// Unparseable model output is not an error; it comes back as
/// `ScoreOutcome::RawText`.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The completion envelope had no message content.
    #[error("empty completion: {0}")]
    EmptyCompletion(String),

    /// Building the request failed before anything was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
