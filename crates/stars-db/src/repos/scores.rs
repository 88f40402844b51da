//! Scoring runs and per-list score records.

use chrono::Utc;
use stars_core::entities::{ListScore, ScoreRecord, ScoringRun};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, opt_text, parse_datetime, parse_optional_json};
use crate::service::Catalogue;

/// Prefix for scoring run ids (`run-a3f8b2c1`).
pub const PREFIX_RUN: &str = "run";

fn row_to_record(row: &libsql::Row) -> Result<ScoreRecord, DatabaseError> {
    Ok(ScoreRecord {
        run_id: row.get::<String>(0)?,
        repo_id: row.get::<i64>(1)?,
        list_slug: row.get::<String>(2)?,
        score: row.get::<f64>(3)?,
        rationale: get_opt_string(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl Catalogue {
    /// Open a new scoring run. Score records can only be written under one.
    pub async fn start_scoring_run(
        &self,
        model: Option<&str>,
        policy: Option<&serde_json::Value>,
    ) -> Result<ScoringRun, DatabaseError> {
        let id = self.db().generate_id(PREFIX_RUN).await?;
        let now = Utc::now();
        let policy_text = policy
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DatabaseError::Other(e.into()))?;

        self.db()
            .conn()
            .execute(
                "INSERT INTO scoring_run (id, started_at, model, policy) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    id.as_str(),
                    now.to_rfc3339(),
                    opt_text(model),
                    opt_text(policy_text.as_deref())
                ],
            )
            .await?;
        tracing::info!(run_id = %id, "scoring run started");

        Ok(ScoringRun {
            id,
            started_at: now,
            model: model.map(str::to_string),
            policy: policy.cloned(),
        })
    }

    pub async fn get_scoring_run(&self, run_id: &str) -> Result<ScoringRun, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, started_at, model, policy FROM scoring_run WHERE id = ?1",
                [run_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(ScoringRun {
            id: row.get::<String>(0)?,
            started_at: parse_datetime(&row.get::<String>(1)?)?,
            model: get_opt_string(&row, 2)?,
            policy: parse_optional_json(get_opt_string(&row, 3)?.as_deref())?,
        })
    }

    /// Persist one repository's scores under `run_id`. Returns rows written.
    ///
    /// Re-recording the same `(run, repo, slug)` overwrites the earlier value.
    pub async fn record_scores(
        &self,
        run_id: &str,
        repo_id: i64,
        scores: &[ListScore],
    ) -> Result<u64, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let mut written = 0;
        for score in scores {
            if !(0.0..=1.0).contains(&score.score) {
                return Err(DatabaseError::InvalidState(format!(
                    "score {} for '{}' is outside [0, 1]",
                    score.score, score.list_slug
                )));
            }
            written += self
                .db()
                .conn()
                .execute(
                    "INSERT INTO repo_list_score (run_id, repo_id, list_slug, score, rationale, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT (run_id, repo_id, list_slug) DO UPDATE SET
                        score = excluded.score,
                        rationale = excluded.rationale,
                        created_at = excluded.created_at",
                    libsql::params![
                        run_id,
                        repo_id,
                        score.list_slug.as_str(),
                        score.score,
                        opt_text(score.rationale.as_deref()),
                        now.as_str()
                    ],
                )
                .await?;
        }
        Ok(written)
    }

    /// All records of one run, ordered by repository then slug.
    pub async fn scores_for_run(&self, run_id: &str) -> Result<Vec<ScoreRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT run_id, repo_id, list_slug, score, rationale, created_at
                 FROM repo_list_score WHERE run_id = ?1 ORDER BY repo_id, list_slug",
                [run_id],
            )
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }
}
