//! Shared test utilities for stars-db unit tests.

use stars_core::entities::{RepoFacts, RepoMetrics};

use crate::service::Catalogue;

/// In-memory catalogue with the schema applied.
pub async fn test_catalogue() -> Catalogue {
    Catalogue::open_local(":memory:").await.unwrap()
}

/// Minimal facts for `owner/name` with a remote id derived from the name.
pub fn facts(name_with_owner: &str) -> RepoFacts {
    RepoFacts {
        remote_id: Some(format!("R_{}", name_with_owner.replace('/', "_"))),
        name_with_owner: name_with_owner.to_string(),
        url: format!("https://github.com/{name_with_owner}"),
        metrics: RepoMetrics {
            stars: 10,
            ..Default::default()
        },
        ..Default::default()
    }
}
