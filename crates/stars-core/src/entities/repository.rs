use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Remote counters for a repository.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RepoMetrics {
    pub stars: i64,
    pub forks: i64,
    pub watchers: i64,
    pub open_issues: i64,
    pub open_prs: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RepoFlags {
    pub archived: bool,
    pub disabled: bool,
    pub fork: bool,
    pub mirror: bool,
    pub issues_enabled: bool,
}

/// Ranking signals computed upstream. Read-only inputs here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RepoSignals {
    pub popularity: Option<f64>,
    pub freshness: Option<f64>,
    pub activeness: Option<f64>,
}

/// Everything the remote API tells us about a repository.
///
/// `remote_id` is `None` for entities the API returned without a global id;
/// those cannot be diffed and are skipped by reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RepoFacts {
    pub remote_id: Option<String>,
    pub name_with_owner: String,
    pub url: String,
    pub description: Option<String>,
    pub homepage_url: Option<String>,
    pub primary_language: Option<String>,
    pub license: Option<String>,
    pub metrics: RepoMetrics,
    pub flags: RepoFlags,
    /// Ordered, duplicate-free.
    pub topics: Vec<String>,
    pub default_branch: Option<String>,
    pub last_commit_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub disk_usage: Option<i64>,
}

impl RepoFacts {
    /// Split `owner/name`. `None` if the value is not of that shape.
    #[must_use]
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        let (owner, name) = self.name_with_owner.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((owner, name))
    }
}

/// A repository row in the local catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Repository {
    pub id: i64,
    #[serde(flatten)]
    pub facts: RepoFacts,
    pub signals: RepoSignals,
    /// Produced by the external summary generator.
    pub summary: Option<String>,
}
