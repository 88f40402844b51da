//! Append-only run ledger.
//!
//! A row for `(subject, row_id, flag)` records that an operation ran; no row
//! means it never ran or was reset.

use chrono::{DateTime, Utc};
use stars_core::entities::RunEntry;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, opt_text, parse_datetime, parse_optional_json};
use crate::service::Catalogue;

/// `row_id IS ?` matches NULL against NULL, which `=` does not.
const MATCH_KEY: &str = "subject = ?1 AND row_id IS ?2 AND flag = ?3";

fn row_param(row_id: Option<i64>) -> libsql::Value {
    row_id.map_or(libsql::Value::Null, libsql::Value::Integer)
}

impl Catalogue {
    pub async fn log_run(
        &self,
        subject: &str,
        row_id: Option<i64>,
        flag: &str,
        meta: Option<&serde_json::Value>,
    ) -> Result<RunEntry, DatabaseError> {
        let now = Utc::now();
        let meta_text = meta
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DatabaseError::Other(e.into()))?;

        let mut rows = self
            .db()
            .conn()
            .query(
                "INSERT INTO runs (subject, row_id, flag, run_at, meta) VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING id",
                libsql::params![
                    subject,
                    row_param(row_id),
                    flag,
                    now.to_rfc3339(),
                    opt_text(meta_text.as_deref())
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;

        Ok(RunEntry {
            id: row.get::<i64>(0)?,
            subject: subject.to_string(),
            row_id,
            flag: flag.to_string(),
            run_at: now,
            meta: meta.cloned(),
        })
    }

    /// Delete every matching entry. Returns how many were removed.
    pub async fn reset_run(
        &self,
        subject: &str,
        row_id: Option<i64>,
        flag: &str,
    ) -> Result<u64, DatabaseError> {
        let deleted = self
            .db()
            .conn()
            .execute(
                &format!("DELETE FROM runs WHERE {MATCH_KEY}"),
                libsql::params![subject, row_param(row_id), flag],
            )
            .await?;
        Ok(deleted)
    }

    pub async fn latest_run(
        &self,
        subject: &str,
        row_id: Option<i64>,
        flag: &str,
    ) -> Result<Option<RunEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT id, subject, row_id, flag, run_at, meta FROM runs
                     WHERE {MATCH_KEY} ORDER BY run_at DESC, id DESC LIMIT 1"
                ),
                libsql::params![subject, row_param(row_id), flag],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(RunEntry {
            id: row.get::<i64>(0)?,
            subject: row.get::<String>(1)?,
            row_id: row.get::<Option<i64>>(2)?,
            flag: row.get::<String>(3)?,
            run_at: parse_datetime(&row.get::<String>(4)?)?,
            meta: parse_optional_json(get_opt_string(&row, 5)?.as_deref())?,
        }))
    }

    pub async fn latest_run_at(
        &self,
        subject: &str,
        row_id: Option<i64>,
        flag: &str,
    ) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        Ok(self
            .latest_run(subject, row_id, flag)
            .await?
            .map(|entry| entry.run_at))
    }

    /// Whether a matching entry exists at or after `since`.
    pub async fn has_run_since(
        &self,
        subject: &str,
        row_id: Option<i64>,
        flag: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        Ok(self
            .latest_run_at(subject, row_id, flag)
            .await?
            .is_some_and(|at| at >= since))
    }
}
