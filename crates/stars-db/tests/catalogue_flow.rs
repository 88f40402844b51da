//! End-to-end catalogue flow through the public API: ingest lists and
//! repositories, score, reconcile, and read everything back.

use std::collections::{BTreeSet, HashSet};

use pretty_assertions::assert_eq;
use stars_core::entities::{ListScore, RepoFacts};
use stars_db::Catalogue;
use stars_db::repos::lists::ListUpsert;

fn facts(name_with_owner: &str, remote_id: Option<&str>) -> RepoFacts {
    RepoFacts {
        remote_id: remote_id.map(str::to_string),
        name_with_owner: name_with_owner.to_string(),
        url: format!("https://github.com/{name_with_owner}"),
        ..Default::default()
    }
}

#[tokio::test]
async fn ingest_score_and_reconcile() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("catalogue.db");
    let cat = Catalogue::open_local(path.to_str().unwrap()).await.unwrap();

    let alpha = cat
        .upsert_list(ListUpsert {
            remote_id: "UL_alpha",
            name: "Alpha",
            description: Some("async runtimes"),
            is_private: false,
        })
        .await
        .unwrap();
    let beta = cat
        .upsert_list(ListUpsert {
            remote_id: "UL_beta",
            name: "Beta",
            description: Some("parsers"),
            is_private: false,
        })
        .await
        .unwrap();

    let r1 = cat.upsert_repository(&facts("o/r1", Some("R1"))).await.unwrap();
    let r2 = cat.upsert_repository(&facts("o/r2", Some("R2"))).await.unwrap();
    cat.set_list_items(beta.id, &[r1]).await.unwrap();

    assert_eq!(
        cat.listed_remote_ids().await.unwrap(),
        HashSet::from(["R1".to_string()])
    );

    let run = cat.start_scoring_run(Some("test-model"), None).await.unwrap();
    cat.record_scores(
        &run.id,
        r1,
        &[ListScore::new("alpha", 0.9), ListScore::new("beta", 0.1)],
    )
    .await
    .unwrap();

    let target: BTreeSet<String> = ["alpha".to_string(), "beta".to_string()].into();
    let report = cat.reconcile_membership(r1, &target).await.unwrap();
    assert_eq!((report.inserted, report.deleted), (1, 0));
    let again = cat.reconcile_membership(r1, &target).await.unwrap();
    assert!(again.is_noop());

    assert_eq!(cat.membership_slugs(r1).await.unwrap(), target);
    assert!(cat.membership_slugs(r2).await.unwrap().is_empty());
    assert_eq!(cat.scores_for_run(&run.id).await.unwrap().len(), 2);
    assert_eq!(alpha.slug, "alpha");
}
