//! Language-model backend configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_temperature() -> f32 {
    0.0
}

const fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Bearer token for an OpenAI-compatible chat completions endpoint.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Ask the backend for schema-constrained JSON output.
    #[serde(default)]
    pub send_schema_hint: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            send_schema_hint: false,
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.model.trim().is_empty()
    }

    /// Fail with `NotConfigured` unless an API key and model are present.
    pub fn require(&self) -> Result<&Self, ConfigError> {
        if self.is_configured() {
            Ok(self)
        } else {
            Err(ConfigError::NotConfigured {
                section: "llm".into(),
                missing: "api_key/model (STARS_LLM__API_KEY, STARS_LLM__MODEL)".into(),
            })
        }
    }
}
