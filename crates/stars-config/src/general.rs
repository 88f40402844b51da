//! General application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_database_path() -> PathBuf {
    PathBuf::from(".stars/stars.db")
}

fn default_blocked_csv_path() -> PathBuf {
    PathBuf::from(".stars/blocked-listless.csv")
}

/// Default number of repositories per scoring batch.
const fn default_limit() -> u32 {
    25
}

/// Requests in flight against the remote API and the model backend.
/// Only sequential operation (1) is supported.
const fn default_concurrency() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Where listless-blocked repositories are appended for manual review.
    #[serde(default = "default_blocked_csv_path")]
    pub blocked_csv_path: PathBuf,

    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            blocked_csv_path: default_blocked_csv_path(),
            default_limit: default_limit(),
            concurrency: default_concurrency(),
        }
    }
}
