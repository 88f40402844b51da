//! The GraphQL transport seam and its HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use stars_config::GithubConfig;

use crate::error::GithubError;
use crate::http::check_response;

/// Executes one GraphQL document and returns its `data` object.
///
/// Implementations surface `errors[]` as [`GithubError::GraphQl`] (or
/// [`GithubError::NotFound`]) and never retry.
#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, GithubError>;
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Split a GraphQL envelope into data or a typed error.
fn unwrap_envelope(envelope: GraphQlEnvelope) -> Result<Value, GithubError> {
    if !envelope.errors.is_empty() {
        let message = envelope
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let all_not_found = envelope
            .errors
            .iter()
            .all(|e| e.kind.as_deref() == Some("NOT_FOUND"));
        return Err(if all_not_found {
            GithubError::NotFound(message)
        } else {
            GithubError::GraphQl(message)
        });
    }
    envelope
        .data
        .ok_or_else(|| GithubError::Parse("response has neither data nor errors".into()))
}

/// HTTP client for the GitHub GraphQL endpoint.
pub struct GithubClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl GithubClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::Http`] if the underlying `reqwest::Client`
    /// cannot be built.
    pub fn new(config: &GithubConfig) -> Result<Self, GithubError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            token: config.token.trim().to_string(),
        })
    }
}

#[async_trait]
impl GraphQlTransport for GithubClient {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, GithubError> {
        tracing::debug!(endpoint = %self.endpoint, "graphql request");
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let resp = check_response(resp).await?;

        let envelope: GraphQlEnvelope = resp
            .json()
            .await
            .map_err(|e| GithubError::Parse(format!("graphql envelope: {e}")))?;
        unwrap_envelope(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(raw: &str) -> GraphQlEnvelope {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn data_passes_through() {
        let data = unwrap_envelope(envelope(r#"{"data": {"viewer": {}}}"#)).unwrap();
        assert!(data.get("viewer").is_some());
    }

    #[test]
    fn errors_are_joined() {
        let err = unwrap_envelope(envelope(
            r#"{"data": null, "errors": [{"message": "a"}, {"message": "b", "type": "FORBIDDEN"}]}"#,
        ))
        .unwrap_err();
        match err {
            GithubError::GraphQl(message) => assert_eq!(message, "a; b"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn not_found_is_distinguished() {
        let err = unwrap_envelope(envelope(
            r#"{"data": {"repository": null}, "errors": [{"message": "Could not resolve", "type": "NOT_FOUND"}]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, GithubError::NotFound(_)));
    }

    #[test]
    fn empty_envelope_is_parse_error() {
        let err = unwrap_envelope(envelope("{}")).unwrap_err();
        assert!(matches!(err, GithubError::Parse(_)));
    }

    #[test]
    fn client_builds_from_default_config() {
        let client = GithubClient::new(&GithubConfig::default()).unwrap();
        assert_eq!(client.endpoint, "https://api.github.com/graphql");
    }
}
