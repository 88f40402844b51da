//! Writes walker output into the catalogue.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::json;
use stars_db::Catalogue;
use stars_db::repos::lists::ListUpsert;
use stars_github::{GraphQlTransport, ListWalker, StarWalker};

use crate::error::SyncError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListSyncReport {
    pub lists: usize,
    pub items: usize,
    pub edges_inserted: u64,
    pub edges_deleted: u64,
    /// Catalogue lists no longer present remotely, deleted with their edges.
    pub lists_pruned: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StarSyncReport {
    pub starred: usize,
    pub upserted: usize,
    pub skipped_without_id: usize,
}

/// Upsert every remote list and its items, set-replacing each list's edges.
/// Once the walk has completed, catalogue lists the walk did not return are
/// deleted.
///
/// # Errors
///
/// Stops at the first transport or catalogue error. Lists synced before the
/// error stay synced and nothing is pruned.
pub async fn sync_lists<T: GraphQlTransport + ?Sized>(
    mut walker: ListWalker<'_, T>,
    catalogue: &Catalogue,
) -> Result<ListSyncReport, SyncError> {
    let mut report = ListSyncReport::default();
    let mut seen = HashSet::new();

    while let Some(remote) = walker.next().await? {
        seen.insert(remote.remote_id.clone());
        let list = catalogue
            .upsert_list(ListUpsert {
                remote_id: &remote.remote_id,
                name: &remote.name,
                description: remote.description.as_deref(),
                is_private: remote.is_private,
            })
            .await?;

        let mut repo_ids = Vec::with_capacity(remote.items.len());
        for facts in &remote.items {
            repo_ids.push(catalogue.upsert_repository(facts).await?);
        }
        let edges = catalogue.set_list_items(list.id, &repo_ids).await?;
        catalogue
            .log_run(
                "list",
                Some(list.id),
                "synced",
                Some(&json!({ "items": repo_ids.len() })),
            )
            .await?;

        tracing::info!(
            list = %list.slug,
            items = repo_ids.len(),
            inserted = edges.inserted,
            deleted = edges.deleted,
            "list synced"
        );
        report.lists += 1;
        report.items += repo_ids.len();
        report.edges_inserted += edges.inserted;
        report.edges_deleted += edges.deleted;
    }

    for list in catalogue.prune_lists(&seen).await? {
        tracing::info!(list = %list.slug, "list removed remotely, pruned");
        report.lists_pruned += 1;
    }
    Ok(report)
}

/// Upsert every starred repository that has a remote id.
///
/// # Errors
///
/// Transport, cancellation and catalogue errors.
pub async fn sync_stars<T: GraphQlTransport + ?Sized>(
    mut walker: StarWalker<'_, T>,
    catalogue: &Catalogue,
) -> Result<StarSyncReport, SyncError> {
    let mut report = StarSyncReport::default();
    while let Some(page) = walker.next_page().await? {
        for facts in page {
            report.starred += 1;
            if facts.remote_id.is_none() {
                report.skipped_without_id += 1;
                continue;
            }
            let id = catalogue.upsert_repository(&facts).await?;
            catalogue.log_run("repo", Some(id), "synced", None).await?;
            report.upserted += 1;
        }
    }
    tracing::info!(
        starred = report.starred,
        upserted = report.upserted,
        "stars synced"
    );
    Ok(report)
}
