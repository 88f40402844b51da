//! # stars-config
//!
//! Layered configuration loading for Starline using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`STARS_*` prefix, `__` as separator)
//! 2. Project-level `.stars/config.toml`
//! 3. User-level `~/.config/stars/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `STARS_GITHUB__TOKEN` -> `github.token`,
//! `STARS_POLICY__CURATION_REMOVE_THRESHOLD` -> `policy.curation_remove_threshold`, etc.
//!
//! ```no_run
//! use stars_config::StarsConfig;
//!
//! let config = StarsConfig::load_with_dotenv().expect("config");
//! if config.github.is_configured() {
//!     println!("GraphQL endpoint: {}", config.github.endpoint);
//! }
//! ```

mod error;
mod general;
mod github;
mod llm;

pub use error::ConfigError;
pub use general::GeneralConfig;
pub use github::GithubConfig;
pub use llm::LlmConfig;
pub use stars_core::PlannerPolicy;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-local config file, relative to the working directory.
pub const LOCAL_CONFIG_PATH: &str = ".stars/config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StarsConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub policy: PlannerPolicy,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl StarsConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the current directory (if any), then [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can add providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = Path::new(LOCAL_CONFIG_PATH);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("STARS_").split("__"))
    }

    /// Reject values that would make the planner or batch loop misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                field: "policy".into(),
                reason: e.to_string(),
            })?;

        if self.general.concurrency != 1 {
            return Err(ConfigError::InvalidValue {
                field: "general.concurrency".into(),
                reason: format!(
                    "only sequential operation (1) is supported, got {}",
                    self.general.concurrency
                ),
            });
        }

        for (field, size) in [
            ("github.lists_page_size", self.github.lists_page_size),
            ("github.items_page_size", self.github.items_page_size),
            ("github.stars_page_size", self.github.stars_page_size),
        ] {
            if !(1..=100).contains(&size) {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    reason: format!("page size must be within 1..=100, got {size}"),
                });
            }
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("stars").join("config.toml"))
    }
}
