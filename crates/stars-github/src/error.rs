//! GitHub API error types.

use thiserror::Error;

/// Errors from the GraphQL transport and the walkers built on it.
#[derive(Debug, Error)]
pub enum GithubError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The API returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The response carried a GraphQL `errors[]` array.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Every GraphQL error was of type `NOT_FOUND`.
    #[error("not found: {0}")]
    NotFound(String),

    /// The payload did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// A cancellation signal was observed between pages.
    #[error("cancelled")]
    Cancelled,
}
