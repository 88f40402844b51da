//! OpenAI-compatible chat-completions backend.
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI, Ollama, vLLM, LM Studio).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stars_config::LlmConfig;

use crate::backend::{CompletionOptions, LlmBackend};
use crate::error::LlmError;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a serde_json::Value,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

pub struct OpenAiBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiBackend {
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    if resp.status() == 429 {
        let retry_after_secs = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(60);
        return Err(LlmError::RateLimited { retry_after_secs });
    }
    if !resp.status().is_success() {
        return Err(LlmError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

fn first_content(response: ChatResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::EmptyCompletion("no choices with content".into()))
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: options.schema_hint.as_ref().map(|schema| ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "list_scores",
                    schema,
                },
            }),
        };

        let mut builder = self.http.post(self.endpoint()).json(&request);
        builder = match options.auth_header.as_deref() {
            Some(header) => builder.header(reqwest::header::AUTHORIZATION, header),
            None if !self.api_key.is_empty() => builder.bearer_auth(&self.api_key),
            None => builder,
        };

        tracing::debug!(model = %self.model, "chat completion request");
        let resp = check_response(builder.send().await?).await?;
        let body: ChatResponse = resp.json().await?;
        first_content(body)
    }
}
