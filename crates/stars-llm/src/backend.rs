//! The model backend seam.

use async_trait::async_trait;

use crate::error::LlmError;

/// Per-call options. Backends may ignore either field.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    /// Full `Authorization` header value; overrides the backend's own key.
    pub auth_header: Option<String>,
    /// JSON schema the response should follow.
    pub schema_hint: Option<serde_json::Value>,
}

/// A chat-style completion backend.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Model identifier recorded with each scoring run.
    fn model(&self) -> &str;

    /// Return the model's text reply.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;
}
