//! List repository: upsert with stable slugs, lookups by slug.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use stars_core::entities::{ListDefinition, StarList};
use stars_core::slug::{belongs_to_base, slugify, with_suffix};

use crate::error::DatabaseError;
use crate::helpers::{get_flag, get_opt_string, opt_text};
use crate::service::Catalogue;

const LIST_COLUMNS: &str = "id, remote_id, name, slug, description, is_private";

fn row_to_list(row: &libsql::Row) -> Result<StarList, DatabaseError> {
    Ok(StarList {
        id: row.get::<i64>(0)?,
        remote_id: get_opt_string(row, 1)?,
        name: row.get::<String>(2)?,
        slug: row.get::<String>(3)?,
        description: get_opt_string(row, 4)?,
        is_private: get_flag(row, 5)?,
    })
}

/// A list as the remote API reports it.
#[derive(Debug, Clone, Copy)]
pub struct ListUpsert<'a> {
    pub remote_id: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub is_private: bool,
}

impl Catalogue {
    /// Insert or update a list keyed on its remote id.
    ///
    /// An existing slug is kept as long as it still derives from the list's
    /// name, so an unchanged list never changes slug. New or renamed lists get
    /// the first free slug among `base`, `base-2`, `base-3`, ...
    pub async fn upsert_list(&self, list: ListUpsert<'_>) -> Result<StarList, DatabaseError> {
        let base = slugify(list.name);
        let now = Utc::now().to_rfc3339();

        if let Some(existing) = self.get_list_by_remote_id(list.remote_id).await? {
            let slug = if belongs_to_base(&existing.slug, &base) {
                existing.slug.clone()
            } else {
                self.free_slug(&base, Some(existing.id)).await?
            };

            self.db()
                .conn()
                .execute(
                    "UPDATE list SET name = ?1, slug = ?2, description = ?3, is_private = ?4, updated_at = ?5
                     WHERE id = ?6",
                    libsql::params![
                        list.name,
                        slug.as_str(),
                        opt_text(list.description),
                        i64::from(list.is_private),
                        now.as_str(),
                        existing.id
                    ],
                )
                .await?;

            if slug != existing.slug {
                tracing::info!(from = %existing.slug, to = %slug, "list slug changed after rename");
            }

            return Ok(StarList {
                id: existing.id,
                remote_id: existing.remote_id,
                name: list.name.to_string(),
                slug,
                description: list.description.map(str::to_string),
                is_private: list.is_private,
            });
        }

        let slug = self.free_slug(&base, None).await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                "INSERT INTO list (remote_id, name, slug, description, is_private, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 RETURNING id",
                libsql::params![
                    list.remote_id,
                    list.name,
                    slug.as_str(),
                    opt_text(list.description),
                    i64::from(list.is_private),
                    now.as_str()
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let id = row.get::<i64>(0)?;
        tracing::debug!(id, slug = %slug, "list inserted");

        Ok(StarList {
            id,
            remote_id: Some(list.remote_id.to_string()),
            name: list.name.to_string(),
            slug,
            description: list.description.map(str::to_string),
            is_private: list.is_private,
        })
    }

    /// First slug in the `base` family not taken by another list.
    async fn free_slug(&self, base: &str, exclude_id: Option<i64>) -> Result<String, DatabaseError> {
        let exclude = exclude_id.unwrap_or(-1);
        for n in 1_u32.. {
            let candidate = with_suffix(base, n);
            let mut rows = self
                .db()
                .conn()
                .query(
                    "SELECT 1 FROM list WHERE slug = ?1 AND id != ?2",
                    libsql::params![candidate.as_str(), exclude],
                )
                .await?;
            if rows.next().await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(DatabaseError::InvalidState(format!(
            "slug space exhausted for '{base}'"
        )))
    }

    pub async fn get_list_by_remote_id(
        &self,
        remote_id: &str,
    ) -> Result<Option<StarList>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {LIST_COLUMNS} FROM list WHERE remote_id = ?1"),
                [remote_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_list(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_list_by_slug(&self, slug: &str) -> Result<Option<StarList>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {LIST_COLUMNS} FROM list WHERE slug = ?1"),
                [slug],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_list(&row)?)),
            None => Ok(None),
        }
    }

    /// All lists, ordered by slug.
    pub async fn lists(&self) -> Result<Vec<StarList>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {LIST_COLUMNS} FROM list ORDER BY slug"),
                (),
            )
            .await?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next().await? {
            lists.push(row_to_list(&row)?);
        }
        Ok(lists)
    }

    /// The acceptance criteria the scorer is shown, ordered by slug.
    pub async fn list_definitions(&self) -> Result<Vec<ListDefinition>, DatabaseError> {
        Ok(self.lists().await?.iter().map(StarList::definition).collect())
    }

    /// Delete every list whose remote id is not in `seen_remote_ids`; their
    /// membership edges go with them. Returns the deleted lists.
    ///
    /// Only call this with the complete set from a finished walk.
    pub async fn prune_lists(
        &self,
        seen_remote_ids: &HashSet<String>,
    ) -> Result<Vec<StarList>, DatabaseError> {
        let stale: Vec<StarList> = self
            .lists()
            .await?
            .into_iter()
            .filter(|list| {
                list.remote_id
                    .as_ref()
                    .is_none_or(|id| !seen_remote_ids.contains(id))
            })
            .collect();
        if stale.is_empty() {
            return Ok(stale);
        }

        let tx = self
            .db()
            .conn()
            .transaction_with_behavior(libsql::TransactionBehavior::Immediate)
            .await?;
        let result = async {
            for list in &stale {
                tx.execute("DELETE FROM list WHERE id = ?1", [list.id]).await?;
            }
            Ok::<_, DatabaseError>(())
        }
        .await;

        match result {
            Ok(()) => {
                tx.commit().await?;
                Ok(stale)
            }
            Err(error) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(%rollback, "rollback failed");
                }
                Err(error)
            }
        }
    }

    /// Map each requested slug to the remote id of its list.
    ///
    /// Every requested slug is present in the result; slugs with no list, or
    /// whose list has no remote id, map to `None`.
    pub async fn remote_ids_for_slugs(
        &self,
        slugs: &[String],
    ) -> Result<BTreeMap<String, Option<String>>, DatabaseError> {
        let mut out = BTreeMap::new();
        for slug in slugs {
            let remote_id = self
                .get_list_by_slug(slug)
                .await?
                .and_then(|list| list.remote_id);
            out.insert(slug.clone(), remote_id);
        }
        Ok(out)
    }
}
