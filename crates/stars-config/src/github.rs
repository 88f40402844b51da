//! GitHub GraphQL configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_endpoint() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_user_agent() -> String {
    "starline/0.1".to_string()
}

/// Lists per outer page. GitHub caps connection pages at 100.
const fn default_lists_page_size() -> u32 {
    20
}

const fn default_items_page_size() -> u32 {
    100
}

const fn default_stars_page_size() -> u32 {
    100
}

const fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubConfig {
    /// Personal access token with `user` scope (list mutations need it).
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_lists_page_size")]
    pub lists_page_size: u32,

    #[serde(default = "default_items_page_size")]
    pub items_page_size: u32,

    #[serde(default = "default_stars_page_size")]
    pub stars_page_size: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            lists_page_size: default_lists_page_size(),
            items_page_size: default_items_page_size(),
            stars_page_size: default_stars_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GithubConfig {
    pub fn is_configured(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Fail with `NotConfigured` unless a token is present.
    pub fn require(&self) -> Result<&Self, ConfigError> {
        if self.is_configured() {
            Ok(self)
        } else {
            Err(ConfigError::NotConfigured {
                section: "github".into(),
                missing: "token (STARS_GITHUB__TOKEN)".into(),
            })
        }
    }
}
