//! Repository rows: upsert from remote facts, ranking, lookups.

use chrono::Utc;
use stars_core::entities::{RepoFacts, RepoFlags, RepoMetrics, RepoSignals, Repository};

use crate::error::DatabaseError;
use crate::helpers::{get_flag, get_opt_datetime, get_opt_string, opt_datetime, opt_real, opt_text};
use crate::service::Catalogue;

const REPO_COLUMNS: &str = "id, remote_id, name_with_owner, url, description, homepage_url, \
     primary_language, license, stars, forks, watchers, open_issues, open_prs, \
     popularity, freshness, activeness, topics, summary, \
     is_archived, is_disabled, is_fork, is_mirror, has_issues, \
     default_branch, last_commit_at, pushed_at, updated_at, created_at, disk_usage";

fn row_to_repository(row: &libsql::Row) -> Result<Repository, DatabaseError> {
    let topics_raw = row.get::<String>(16)?;
    let topics: Vec<String> = serde_json::from_str(&topics_raw)
        .map_err(|e| DatabaseError::Query(format!("Invalid topics JSON: {e}")))?;

    Ok(Repository {
        id: row.get::<i64>(0)?,
        facts: RepoFacts {
            remote_id: get_opt_string(row, 1)?,
            name_with_owner: row.get::<String>(2)?,
            url: row.get::<String>(3)?,
            description: get_opt_string(row, 4)?,
            homepage_url: get_opt_string(row, 5)?,
            primary_language: get_opt_string(row, 6)?,
            license: get_opt_string(row, 7)?,
            metrics: RepoMetrics {
                stars: row.get::<i64>(8)?,
                forks: row.get::<i64>(9)?,
                watchers: row.get::<i64>(10)?,
                open_issues: row.get::<i64>(11)?,
                open_prs: row.get::<i64>(12)?,
            },
            flags: RepoFlags {
                archived: get_flag(row, 18)?,
                disabled: get_flag(row, 19)?,
                fork: get_flag(row, 20)?,
                mirror: get_flag(row, 21)?,
                issues_enabled: get_flag(row, 22)?,
            },
            topics,
            default_branch: get_opt_string(row, 23)?,
            last_commit_at: get_opt_datetime(row, 24)?,
            pushed_at: get_opt_datetime(row, 25)?,
            updated_at: get_opt_datetime(row, 26)?,
            created_at: get_opt_datetime(row, 27)?,
            disk_usage: row.get::<Option<i64>>(28)?,
        },
        signals: RepoSignals {
            popularity: row.get::<Option<f64>>(13)?,
            freshness: row.get::<Option<f64>>(14)?,
            activeness: row.get::<Option<f64>>(15)?,
        },
        summary: get_opt_string(row, 17)?,
    })
}

/// Topics stored as a JSON array, ordered and duplicate-free.
fn topics_json(topics: &[String]) -> Result<String, DatabaseError> {
    let mut seen = std::collections::HashSet::new();
    let ordered: Vec<&String> = topics.iter().filter(|t| seen.insert(t.as_str())).collect();
    serde_json::to_string(&ordered).map_err(|e| DatabaseError::Other(e.into()))
}

fn fact_params(facts: &RepoFacts, now: &str) -> Result<Vec<libsql::Value>, DatabaseError> {
    let m = &facts.metrics;
    let f = &facts.flags;
    Ok(vec![
        opt_text(facts.remote_id.as_deref()),
        facts.name_with_owner.clone().into(),
        facts.url.clone().into(),
        opt_text(facts.description.as_deref()),
        opt_text(facts.homepage_url.as_deref()),
        opt_text(facts.primary_language.as_deref()),
        opt_text(facts.license.as_deref()),
        m.stars.into(),
        m.forks.into(),
        m.watchers.into(),
        m.open_issues.into(),
        m.open_prs.into(),
        topics_json(&facts.topics)?.into(),
        i64::from(f.archived).into(),
        i64::from(f.disabled).into(),
        i64::from(f.fork).into(),
        i64::from(f.mirror).into(),
        i64::from(f.issues_enabled).into(),
        opt_text(facts.default_branch.as_deref()),
        opt_datetime(facts.last_commit_at),
        opt_datetime(facts.pushed_at),
        opt_datetime(facts.updated_at),
        opt_datetime(facts.created_at),
        facts.disk_usage.map_or(libsql::Value::Null, libsql::Value::Integer),
        now.to_string().into(),
    ])
}

impl Catalogue {
    /// Insert or refresh a repository from remote facts. Returns the local id.
    ///
    /// Matches on remote id first (survives renames), then on
    /// name-with-owner. A known remote id is never cleared by facts that
    /// lack one. Signals and summary are left untouched.
    pub async fn upsert_repository(&self, facts: &RepoFacts) -> Result<i64, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let params = fact_params(facts, &now)?;

        if let Some(remote_id) = facts.remote_id.as_deref() {
            if let Some(id) = self.repository_id_by_remote_id(remote_id).await? {
                let mut update = params;
                update.push(id.into());
                self.db()
                    .conn()
                    .execute(
                        "UPDATE repo SET remote_id = ?1, name_with_owner = ?2, url = ?3,
                            description = ?4, homepage_url = ?5, primary_language = ?6, license = ?7,
                            stars = ?8, forks = ?9, watchers = ?10, open_issues = ?11, open_prs = ?12,
                            topics = ?13, is_archived = ?14, is_disabled = ?15, is_fork = ?16,
                            is_mirror = ?17, has_issues = ?18, default_branch = ?19,
                            last_commit_at = ?20, pushed_at = ?21, updated_at = ?22,
                            created_at = ?23, disk_usage = ?24, synced_at = ?25
                         WHERE id = ?26",
                        libsql::params_from_iter(update),
                    )
                    .await?;
                return Ok(id);
            }
        }

        let mut rows = self
            .db()
            .conn()
            .query(
                "INSERT INTO repo (remote_id, name_with_owner, url, description, homepage_url,
                    primary_language, license, stars, forks, watchers, open_issues, open_prs,
                    topics, is_archived, is_disabled, is_fork, is_mirror, has_issues,
                    default_branch, last_commit_at, pushed_at, updated_at, created_at,
                    disk_usage, synced_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                    ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)
                 ON CONFLICT (name_with_owner) DO UPDATE SET
                    remote_id = COALESCE(excluded.remote_id, repo.remote_id),
                    url = excluded.url,
                    description = excluded.description,
                    homepage_url = excluded.homepage_url,
                    primary_language = excluded.primary_language,
                    license = excluded.license,
                    stars = excluded.stars,
                    forks = excluded.forks,
                    watchers = excluded.watchers,
                    open_issues = excluded.open_issues,
                    open_prs = excluded.open_prs,
                    topics = excluded.topics,
                    is_archived = excluded.is_archived,
                    is_disabled = excluded.is_disabled,
                    is_fork = excluded.is_fork,
                    is_mirror = excluded.is_mirror,
                    has_issues = excluded.has_issues,
                    default_branch = excluded.default_branch,
                    last_commit_at = excluded.last_commit_at,
                    pushed_at = excluded.pushed_at,
                    updated_at = excluded.updated_at,
                    created_at = excluded.created_at,
                    disk_usage = excluded.disk_usage,
                    synced_at = excluded.synced_at
                 RETURNING id",
                libsql::params_from_iter(params),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }

    async fn repository_id_by_remote_id(
        &self,
        remote_id: &str,
    ) -> Result<Option<i64>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT id FROM repo WHERE remote_id = ?1", [remote_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<i64>(0)?)),
            None => Ok(None),
        }
    }

    /// Persist a remote id resolved after the fact.
    pub async fn set_repository_remote_id(
        &self,
        repo_id: i64,
        remote_id: &str,
    ) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE repo SET remote_id = ?1 WHERE id = ?2",
                libsql::params![remote_id, repo_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }
        Ok(())
    }

    /// Store ranking signals computed by the upstream stage.
    pub async fn set_repository_signals(
        &self,
        repo_id: i64,
        signals: RepoSignals,
    ) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE repo SET popularity = ?1, freshness = ?2, activeness = ?3 WHERE id = ?4",
                libsql::params![
                    opt_real(signals.popularity),
                    opt_real(signals.freshness),
                    opt_real(signals.activeness),
                    repo_id
                ],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }
        Ok(())
    }

    /// Store the externally generated summary text.
    pub async fn set_repository_summary(
        &self,
        repo_id: i64,
        summary: Option<&str>,
    ) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE repo SET summary = ?1 WHERE id = ?2",
                libsql::params![opt_text(summary), repo_id],
            )
            .await?;
        Ok(())
    }

    pub async fn get_repository_by_name(
        &self,
        name_with_owner: &str,
    ) -> Result<Option<Repository>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {REPO_COLUMNS} FROM repo WHERE name_with_owner = ?1"),
                [name_with_owner],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_repository(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn repository_by_id(&self, id: i64) -> Result<Option<Repository>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {REPO_COLUMNS} FROM repo WHERE id = ?1"),
                [id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_repository(&row)?)),
            None => Ok(None),
        }
    }

    /// The `limit` highest-ranked repositories: popularity, then freshness,
    /// both descending with missing values last; ties by name.
    pub async fn top_repositories(&self, limit: u32) -> Result<Vec<Repository>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {REPO_COLUMNS} FROM repo
                     ORDER BY popularity DESC NULLS LAST, freshness DESC NULLS LAST, name_with_owner ASC
                     LIMIT ?1"
                ),
                [i64::from(limit)],
            )
            .await?;
        let mut repos = Vec::new();
        while let Some(row) = rows.next().await? {
            repos.push(row_to_repository(&row)?);
        }
        Ok(repos)
    }

    /// Every repository, ordered by name.
    pub async fn repositories(&self) -> Result<Vec<Repository>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {REPO_COLUMNS} FROM repo ORDER BY name_with_owner"),
                (),
            )
            .await?;
        let mut repos = Vec::new();
        while let Some(row) = rows.next().await? {
            repos.push(row_to_repository(&row)?);
        }
        Ok(repos)
    }
}
