//! Membership edges between lists and repositories.
//!
//! Edge moves for one repository (or one list) happen inside a single
//! `BEGIN IMMEDIATE` transaction and are rolled back on any error.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use stars_core::entities::MembershipEdge;

use crate::error::DatabaseError;
use crate::service::Catalogue;

/// Row changes made by a set-replace of membership edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub inserted: u64,
    pub deleted: u64,
}

impl ReconcileReport {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.inserted == 0 && self.deleted == 0
    }
}

async fn query_ids(
    conn: &libsql::Connection,
    sql: &str,
    id: i64,
) -> Result<BTreeSet<i64>, DatabaseError> {
    let mut rows = conn.query(sql, [id]).await?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next().await? {
        ids.insert(row.get::<i64>(0)?);
    }
    Ok(ids)
}

/// Move `repo_id`'s edges to exactly `desired_list_ids`.
async fn replace_repo_edges(
    conn: &libsql::Connection,
    repo_id: i64,
    desired_list_ids: &BTreeSet<i64>,
) -> Result<ReconcileReport, DatabaseError> {
    let current = query_ids(
        conn,
        "SELECT list_id FROM list_repo WHERE repo_id = ?1",
        repo_id,
    )
    .await?;

    let mut report = ReconcileReport::default();
    for list_id in current.difference(desired_list_ids) {
        report.deleted += conn
            .execute(
                "DELETE FROM list_repo WHERE list_id = ?1 AND repo_id = ?2",
                libsql::params![*list_id, repo_id],
            )
            .await?;
    }
    for list_id in desired_list_ids.difference(&current) {
        report.inserted += conn
            .execute(
                "INSERT OR IGNORE INTO list_repo (list_id, repo_id) VALUES (?1, ?2)",
                libsql::params![*list_id, repo_id],
            )
            .await?;
    }
    Ok(report)
}

/// Move `list_id`'s edges to exactly `desired_repo_ids`.
async fn replace_list_edges(
    conn: &libsql::Connection,
    list_id: i64,
    desired_repo_ids: &BTreeSet<i64>,
) -> Result<ReconcileReport, DatabaseError> {
    let current = query_ids(
        conn,
        "SELECT repo_id FROM list_repo WHERE list_id = ?1",
        list_id,
    )
    .await?;

    let mut report = ReconcileReport::default();
    for repo_id in current.difference(desired_repo_ids) {
        report.deleted += conn
            .execute(
                "DELETE FROM list_repo WHERE list_id = ?1 AND repo_id = ?2",
                libsql::params![list_id, *repo_id],
            )
            .await?;
    }
    for repo_id in desired_repo_ids.difference(&current) {
        report.inserted += conn
            .execute(
                "INSERT OR IGNORE INTO list_repo (list_id, repo_id) VALUES (?1, ?2)",
                libsql::params![list_id, *repo_id],
            )
            .await?;
    }
    Ok(report)
}

async fn slugs_to_list_ids(
    conn: &libsql::Connection,
    slugs: &BTreeSet<String>,
) -> Result<BTreeSet<i64>, DatabaseError> {
    let mut ids = BTreeSet::new();
    for slug in slugs {
        let mut rows = conn
            .query("SELECT id FROM list WHERE slug = ?1", [slug.as_str()])
            .await?;
        let row = rows.next().await?.ok_or_else(|| {
            DatabaseError::InvalidState(format!("list '{slug}' is not in the catalogue"))
        })?;
        ids.insert(row.get::<i64>(0)?);
    }
    Ok(ids)
}

impl Catalogue {
    /// Slugs of every list `repo_id` is a member of.
    pub async fn membership_slugs(&self, repo_id: i64) -> Result<BTreeSet<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT l.slug FROM list_repo lr JOIN list l ON l.id = lr.list_id
                 WHERE lr.repo_id = ?1",
                [repo_id],
            )
            .await?;
        let mut slugs = BTreeSet::new();
        while let Some(row) = rows.next().await? {
            slugs.insert(row.get::<String>(0)?);
        }
        Ok(slugs)
    }

    /// Remote ids of every repository linked to at least one list.
    pub async fn listed_remote_ids(&self) -> Result<HashSet<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT DISTINCT r.remote_id FROM list_repo lr JOIN repo r ON r.id = lr.repo_id
                 WHERE r.remote_id IS NOT NULL",
                (),
            )
            .await?;
        let mut ids = HashSet::new();
        while let Some(row) = rows.next().await? {
            ids.insert(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    /// Every edge, ordered by list then repository.
    pub async fn membership_edges(&self) -> Result<Vec<MembershipEdge>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT list_id, repo_id FROM list_repo ORDER BY list_id, repo_id",
                (),
            )
            .await?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next().await? {
            edges.push(MembershipEdge {
                list_id: row.get::<i64>(0)?,
                repo_id: row.get::<i64>(1)?,
            });
        }
        Ok(edges)
    }

    /// Set-replace the items of one list.
    pub async fn set_list_items(
        &self,
        list_id: i64,
        repo_ids: &[i64],
    ) -> Result<ReconcileReport, DatabaseError> {
        let desired: BTreeSet<i64> = repo_ids.iter().copied().collect();
        let tx = self
            .db()
            .conn()
            .transaction_with_behavior(libsql::TransactionBehavior::Immediate)
            .await?;

        match replace_list_edges(&tx, list_id, &desired).await {
            Ok(report) => {
                tx.commit().await?;
                Ok(report)
            }
            Err(error) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(%rollback, list_id, "rollback failed");
                }
                Err(error)
            }
        }
    }

    /// Make `repo_id`'s local edges match `final_slugs` exactly.
    ///
    /// Scoped to lists present in the catalogue: a slug with no list is an
    /// error and nothing is written. Applying the same set twice changes no
    /// rows the second time.
    pub async fn reconcile_membership(
        &self,
        repo_id: i64,
        final_slugs: &BTreeSet<String>,
    ) -> Result<ReconcileReport, DatabaseError> {
        let tx = self
            .db()
            .conn()
            .transaction_with_behavior(libsql::TransactionBehavior::Immediate)
            .await?;

        let result = async {
            let desired = slugs_to_list_ids(&tx, final_slugs).await?;
            replace_repo_edges(&tx, repo_id, &desired).await
        }
        .await;

        match result {
            Ok(report) => {
                tx.commit().await?;
                tracing::debug!(repo_id, inserted = report.inserted, deleted = report.deleted, "membership reconciled");
                Ok(report)
            }
            Err(error) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(%rollback, repo_id, "rollback failed");
                }
                Err(error)
            }
        }
    }
}
