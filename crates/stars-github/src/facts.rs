//! Wire shapes shared by the list, item and starred-repository pages.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use stars_core::entities::{RepoFacts, RepoFlags, RepoMetrics};

use crate::error::GithubError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl PageInfo {
    /// The cursor for the next page, `None` when this was the last one.
    ///
    /// `hasNextPage` without an `endCursor` cannot be followed and is
    /// reported as a parse error.
    pub fn next_cursor(self, what: &str) -> Result<Option<String>, GithubError> {
        match (self.has_next_page, self.end_cursor) {
            (false, _) => Ok(None),
            (true, Some(cursor)) => Ok(Some(cursor)),
            (true, None) => Err(GithubError::Parse(format!(
                "{what}: hasNextPage is true but endCursor is missing"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitTarget {
    committed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    name: String,
    target: Option<CommitTarget>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicenseInfo {
    spdx_id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopicNode {
    topic: Named,
}

#[derive(Debug, Default, Deserialize)]
struct TopicConnection {
    #[serde(default)]
    nodes: Vec<Option<TopicNode>>,
}

/// A repository node. Every field is optional: list items that are not
/// repositories (gists) arrive as empty objects.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireRepository {
    id: Option<String>,
    name_with_owner: Option<String>,
    url: Option<String>,
    description: Option<String>,
    homepage_url: Option<String>,
    stargazer_count: Option<i64>,
    fork_count: Option<i64>,
    watchers: Option<TotalCount>,
    issues: Option<TotalCount>,
    pull_requests: Option<TotalCount>,
    default_branch_ref: Option<BranchRef>,
    primary_language: Option<Named>,
    license_info: Option<LicenseInfo>,
    is_archived: bool,
    is_disabled: bool,
    is_fork: bool,
    is_mirror: bool,
    has_issues_enabled: bool,
    pushed_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    disk_usage: Option<i64>,
    repository_topics: Option<TopicConnection>,
}

impl WireRepository {
    /// Convert to domain facts. `None` for nodes that are not repositories.
    pub fn into_facts(self) -> Option<RepoFacts> {
        let name_with_owner = self.name_with_owner.filter(|n| !n.is_empty())?;
        let url = self
            .url
            .unwrap_or_else(|| format!("https://github.com/{name_with_owner}"));

        let mut topics: Vec<String> = Vec::new();
        for node in self
            .repository_topics
            .unwrap_or_default()
            .nodes
            .into_iter()
            .flatten()
        {
            if !topics.contains(&node.topic.name) {
                topics.push(node.topic.name);
            }
        }

        let (default_branch, last_commit_at) = match self.default_branch_ref {
            Some(branch) => (
                Some(branch.name),
                branch.target.and_then(|t| t.committed_date),
            ),
            None => (None, None),
        };

        Some(RepoFacts {
            remote_id: self.id.filter(|id| !id.is_empty()),
            name_with_owner,
            url,
            description: self.description.filter(|d| !d.is_empty()),
            homepage_url: self.homepage_url.filter(|h| !h.is_empty()),
            primary_language: self.primary_language.map(|l| l.name),
            license: self.license_info.and_then(|l| l.spdx_id.or(l.name)),
            metrics: RepoMetrics {
                stars: self.stargazer_count.unwrap_or_default(),
                forks: self.fork_count.unwrap_or_default(),
                watchers: self.watchers.unwrap_or_default().total_count,
                open_issues: self.issues.unwrap_or_default().total_count,
                open_prs: self.pull_requests.unwrap_or_default().total_count,
            },
            flags: RepoFlags {
                archived: self.is_archived,
                disabled: self.is_disabled,
                fork: self.is_fork,
                mirror: self.is_mirror,
                issues_enabled: self.has_issues_enabled,
            },
            topics,
            default_branch,
            last_commit_at,
            pushed_at: self.pushed_at,
            updated_at: self.updated_at,
            created_at: self.created_at,
            disk_usage: self.disk_usage,
        })
    }
}

/// Decode a `data` payload into a wire struct.
pub fn decode<T: serde::de::DeserializeOwned>(
    data: serde_json::Value,
    what: &str,
) -> Result<T, GithubError> {
    serde_json::from_value(data).map_err(|e| GithubError::Parse(format!("{what}: {e}")))
}
