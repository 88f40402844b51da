//! Diffs remote stars against local list membership.

use std::collections::HashSet;

use serde::Serialize;
use stars_core::entities::RepoFacts;
use stars_db::Catalogue;
use stars_github::{GraphQlTransport, StarWalker};

use crate::error::SyncError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnlistedReport {
    /// Starred repositories in no local list, in starred order.
    pub unlisted: Vec<RepoFacts>,
    pub starred: usize,
    pub listed: usize,
    /// Starred entities without a remote id: neither listed nor unlisted.
    pub skipped_without_id: usize,
}

/// Split `starred` against the remote ids already linked to a list.
#[must_use]
pub fn diff_unlisted(starred: Vec<RepoFacts>, listed_ids: &HashSet<String>) -> UnlistedReport {
    let mut report = UnlistedReport {
        starred: starred.len(),
        ..Default::default()
    };
    for facts in starred {
        match facts.remote_id.as_deref() {
            None => report.skipped_without_id += 1,
            Some(id) if listed_ids.contains(id) => report.listed += 1,
            Some(_) => report.unlisted.push(facts),
        }
    }
    report
}

/// Every starred repository that is not a member of any local list.
///
/// Walks all starred pages first; a cancellation observed between pages
/// aborts with [`SyncError::Cancelled`] and returns nothing.
///
/// # Errors
///
/// Transport, cancellation and catalogue errors.
pub async fn unlisted_stars<T: GraphQlTransport + ?Sized>(
    walker: StarWalker<'_, T>,
    catalogue: &Catalogue,
) -> Result<UnlistedReport, SyncError> {
    let starred = walker.collect_all().await?;
    let listed = catalogue.listed_remote_ids().await?;
    let report = diff_unlisted(starred, &listed);
    tracing::info!(
        starred = report.starred,
        unlisted = report.unlisted.len(),
        skipped = report.skipped_without_id,
        "unlisted stars computed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn facts(id: Option<&str>, name: &str) -> RepoFacts {
        RepoFacts {
            remote_id: id.map(str::to_string),
            name_with_owner: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn diff_removes_listed_and_skips_id_less() {
        let starred = vec![
            facts(Some("R1"), "o/r1"),
            facts(Some("R2"), "o/r2"),
            facts(None, "o/anon"),
            facts(Some("R3"), "o/r3"),
        ];
        let listed: HashSet<String> = HashSet::from(["R1".to_string()]);

        let report = diff_unlisted(starred, &listed);
        let ids: Vec<_> = report
            .unlisted
            .iter()
            .filter_map(|f| f.remote_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["R2", "R3"]);
        assert_eq!(report.starred, 4);
        assert_eq!(report.listed, 1);
        assert_eq!(report.skipped_without_id, 1);
    }
}
