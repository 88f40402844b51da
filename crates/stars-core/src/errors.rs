//! Cross-cutting error types for Starline.
//!
//! Component errors (`GithubError`, `LlmError`, `DatabaseError`, ...) live in
//! their own crates. The binary converges them through `anyhow`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}
