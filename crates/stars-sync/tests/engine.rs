//! End-to-end engine behaviour over the in-memory GraphQL transport and a
//! scripted model backend.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use stars_core::entities::ListScore;
use stars_core::{CancelSignal, PlannerPolicy};
use stars_db::Catalogue;
use stars_github::mock::{FakeGithub, FakeList, repo_node};
use stars_github::{ListWalker, StarWalker};
use stars_llm::{CompletionOptions, LlmBackend, LlmError, Scorer};
use stars_sync::{
    Applier, ApplyError, BatchOptions, BlockedLog, ItemOutcome, ScoringBatch, SkipReason,
    SCORED_FLAG, SyncError, UNPARSED_FLAG, plan_membership, sync_lists, sync_stars,
    unlisted_stars,
};

/// Replies per repository, keyed by `owner/name`. Unknown repositories get
/// an unparseable reply.
struct ScriptedLlm {
    replies: HashMap<String, String>,
}

impl ScriptedLlm {
    fn new(replies: &[(&str, &str)]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _system: &str,
        user: &str,
        _options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let name = user
            .lines()
            .find_map(|line| line.strip_prefix("Repository: "))
            .unwrap_or_default();
        Ok(self
            .replies
            .get(name)
            .cloned()
            .unwrap_or_else(|| "I am not sure.".to_string()))
    }
}

fn fake_github() -> FakeGithub {
    FakeGithub::new()
        .with_list(FakeList::new("UL_a", "Alpha").items(vec![repo_node(Some("R1"), "o/r1")]))
        .with_list(FakeList::new("UL_b", "Beta").items(vec![repo_node(Some("R2"), "o/r2")]))
        .with_list(FakeList::new("UL_c", "Gamma"))
        .with_star(repo_node(Some("R1"), "o/r1"))
        .with_star(repo_node(Some("R2"), "o/r2"))
        .with_star(repo_node(Some("R3"), "o/r3"))
        .with_star(repo_node(None, "o/anon"))
}

async fn synced(fake: &FakeGithub) -> Catalogue {
    let catalogue = Catalogue::open_local(":memory:").await.unwrap();
    sync_lists(ListWalker::new(fake, 2, 10), &catalogue)
        .await
        .unwrap();
    sync_stars(StarWalker::new(fake, 2), &catalogue)
        .await
        .unwrap();
    catalogue
}

fn slugs(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn ingest_populates_lists_repos_and_edges() {
    let fake = fake_github();
    let catalogue = synced(&fake).await;

    let lists: Vec<_> = catalogue
        .lists()
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.slug)
        .collect();
    assert_eq!(lists, vec!["alpha", "beta", "gamma"]);

    let r1 = catalogue.get_repository_by_name("o/r1").await.unwrap().unwrap();
    assert_eq!(catalogue.membership_slugs(r1.id).await.unwrap(), slugs(&["alpha"]));
    assert!(catalogue.get_repository_by_name("o/r3").await.unwrap().is_some());
    assert!(catalogue.get_repository_by_name("o/anon").await.unwrap().is_none());

    // Re-syncing changes nothing.
    let again = sync_lists(ListWalker::new(&fake, 2, 10), &catalogue)
        .await
        .unwrap();
    assert_eq!((again.edges_inserted, again.edges_deleted), (0, 0));
}

#[tokio::test]
async fn lists_deleted_remotely_are_pruned() {
    let before = fake_github();
    let catalogue = synced(&before).await;

    let after = FakeGithub::new()
        .with_list(FakeList::new("UL_b", "Beta").items(vec![repo_node(Some("R2"), "o/r2")]))
        .with_star(repo_node(Some("R1"), "o/r1"))
        .with_star(repo_node(Some("R2"), "o/r2"));

    // A failed walk prunes nothing.
    after.fail_next("bad gateway");
    assert!(sync_lists(ListWalker::new(&after, 2, 10), &catalogue).await.is_err());
    assert_eq!(catalogue.lists().await.unwrap().len(), 3);

    let report = sync_lists(ListWalker::new(&after, 2, 10), &catalogue)
        .await
        .unwrap();
    assert_eq!(report.lists_pruned, 2);

    let lists: Vec<_> = catalogue
        .lists()
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.slug)
        .collect();
    assert_eq!(lists, vec!["beta"]);
    assert_eq!(
        catalogue.listed_remote_ids().await.unwrap(),
        std::collections::HashSet::from(["R2".to_string()])
    );

    let unlisted = unlisted_stars(StarWalker::new(&after, 10), &catalogue)
        .await
        .unwrap();
    let names: Vec<_> = unlisted
        .unlisted
        .iter()
        .map(|f| f.name_with_owner.as_str())
        .collect();
    assert_eq!(names, vec!["o/r1"]);
}

#[tokio::test]
async fn unlisted_is_starred_minus_listed() {
    let fake = FakeGithub::new()
        .with_list(FakeList::new("UL_a", "Alpha").items(vec![repo_node(Some("R1"), "o/r1")]))
        .with_star(repo_node(Some("R1"), "o/r1"))
        .with_star(repo_node(Some("R2"), "o/r2"))
        .with_star(repo_node(Some("R3"), "o/r3"))
        .with_star(repo_node(None, "o/anon"));
    let catalogue = Catalogue::open_local(":memory:").await.unwrap();
    sync_lists(ListWalker::new(&fake, 10, 10), &catalogue)
        .await
        .unwrap();

    let report = unlisted_stars(StarWalker::new(&fake, 3), &catalogue)
        .await
        .unwrap();
    let ids: BTreeSet<_> = report
        .unlisted
        .iter()
        .filter_map(|f| f.remote_id.clone())
        .collect();
    assert_eq!(ids, slugs(&["R2", "R3"]));
    assert_eq!(report.skipped_without_id, 1);
}

#[tokio::test]
async fn unlisted_aborts_on_cancel() {
    let fake = fake_github();
    let catalogue = synced(&fake).await;
    let signal = CancelSignal::new();
    signal.cancel();

    let err = unlisted_stars(StarWalker::new(&fake, 2).with_cancel(signal), &catalogue)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Cancelled));
}

#[tokio::test]
async fn apply_is_idempotent() {
    let fake = fake_github();
    let catalogue = synced(&fake).await;
    let r1 = catalogue.get_repository_by_name("o/r1").await.unwrap().unwrap();

    let plan = plan_membership(
        &slugs(&["alpha"]),
        &[ListScore::new("beta", 0.9)],
        &PlannerPolicy::default(),
    );
    let applier = Applier::new(&fake, &catalogue);

    let first = applier.apply(&r1, &plan).await.unwrap();
    assert_eq!(first.list_ids, vec!["UL_a", "UL_b"]);
    assert_eq!((first.local.inserted, first.local.deleted), (1, 0));
    assert!(!first.echo_mismatch);

    let second = applier.apply(&r1, &plan).await.unwrap();
    assert!(second.local.is_noop());
    assert_eq!(fake.mutations().len(), 2);
    assert_eq!(fake.mutations()[1], ("R1".to_string(), vec!["UL_a".to_string(), "UL_b".to_string()]));
}

#[tokio::test]
async fn blocked_plan_is_never_applied() {
    let fake = fake_github();
    let catalogue = synced(&fake).await;
    let r3 = catalogue.get_repository_by_name("o/r3").await.unwrap().unwrap();

    let plan = plan_membership(&BTreeSet::new(), &[], &PlannerPolicy::default());
    assert!(plan.blocked);

    let err = Applier::new(&fake, &catalogue)
        .apply(&r3, &plan)
        .await
        .unwrap_err();
    assert!(matches!(err, ApplyError::Blocked(_)));
    assert!(fake.mutations().is_empty());
}

#[tokio::test]
async fn apply_resolves_and_persists_missing_remote_id() {
    let fake = fake_github().with_repository("o/late", "R_late");
    let catalogue = synced(&fake).await;
    let facts = stars_core::entities::RepoFacts {
        remote_id: None,
        name_with_owner: "o/late".into(),
        url: "https://github.com/o/late".into(),
        ..Default::default()
    };
    let id = catalogue.upsert_repository(&facts).await.unwrap();
    let repo = catalogue.repository_by_id(id).await.unwrap().unwrap();

    let plan = plan_membership(
        &BTreeSet::new(),
        &[ListScore::new("gamma", 0.8)],
        &PlannerPolicy::default(),
    );
    let report = Applier::new(&fake, &catalogue).apply(&repo, &plan).await.unwrap();
    assert_eq!(report.remote_id, "R_late");

    let stored = catalogue.repository_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.facts.remote_id.as_deref(), Some("R_late"));
}

#[tokio::test]
async fn apply_step_failures_are_typed() {
    let fake = fake_github();
    let catalogue = synced(&fake).await;

    let ghost = stars_core::entities::RepoFacts {
        name_with_owner: "o/ghost".into(),
        url: "https://github.com/o/ghost".into(),
        ..Default::default()
    };
    let id = catalogue.upsert_repository(&ghost).await.unwrap();
    let ghost = catalogue.repository_by_id(id).await.unwrap().unwrap();
    let plan = plan_membership(
        &BTreeSet::new(),
        &[ListScore::new("alpha", 0.9)],
        &PlannerPolicy::default(),
    );
    let err = Applier::new(&fake, &catalogue)
        .apply(&ghost, &plan)
        .await
        .unwrap_err();
    assert!(matches!(err, ApplyError::UnknownRepository(ref n) if n == "o/ghost"));

    let r1 = catalogue.get_repository_by_name("o/r1").await.unwrap().unwrap();
    let plan = plan_membership(
        &slugs(&["alpha"]),
        &[ListScore::new("retired", 0.9)],
        &PlannerPolicy::default(),
    );
    let err = Applier::new(&fake, &catalogue)
        .apply(&r1, &plan)
        .await
        .unwrap_err();
    assert!(matches!(err, ApplyError::UnresolvedList(ref s) if s == &vec!["retired".to_string()]));
    assert!(fake.mutations().is_empty());
    assert_eq!(catalogue.membership_slugs(r1.id).await.unwrap(), slugs(&["alpha"]));
}

#[tokio::test]
async fn batch_applies_and_records_blocked_repositories() {
    let fake = fake_github();
    let catalogue = synced(&fake).await;
    let dir = tempfile::TempDir::new().unwrap();
    let csv_path = dir.path().join("blocked.csv");

    let llm = ScriptedLlm::new(&[
        ("o/r1", r#"{"alpha": 0.9, "beta": 0.8}"#),
        ("o/r2", r#"{"beta": 0.9}"#),
        ("o/r3", r#"{"alpha": 0.1}"#),
    ]);
    let batch = ScoringBatch::new(
        &catalogue,
        Scorer::new(&llm),
        Some(&fake),
        PlannerPolicy::default(),
        BlockedLog::new(&csv_path),
    );
    let options = BatchOptions {
        apply: true,
        repos: vec!["o/r1".into(), "o/r2".into(), "o/r3".into(), "o/missing".into()],
        ..Default::default()
    };

    let mut seen = Vec::new();
    let report = batch
        .run(&options, |item| seen.push(item.name_with_owner.clone()))
        .await
        .unwrap();
    assert_eq!(seen, vec!["o/r1", "o/r2", "o/r3", "o/missing"]);

    assert!(matches!(report.items[0].result, Ok(ItemOutcome::Applied { .. })));
    assert!(matches!(
        report.items[1].result,
        Ok(ItemOutcome::Skipped {
            reason: SkipReason::Unchanged
        })
    ));
    assert!(matches!(report.items[2].result, Ok(ItemOutcome::Blocked { .. })));
    assert!(matches!(report.items[3].result, Err(SyncError::NotFound(_))));

    let summary = report.summary();
    assert_eq!((summary.applied, summary.blocked, summary.failed), (1, 1, 1));

    // Only r1 reached the remote.
    assert_eq!(fake.mutations().len(), 1);

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].contains("o/r3"));
    assert!(rows[0].contains("listless"));

    let run_id = report.run_id.unwrap();
    let scores = catalogue.scores_for_run(&run_id).await.unwrap();
    assert_eq!(scores.len(), 4);
}

#[tokio::test]
async fn dry_run_persists_nothing() {
    let fake = fake_github();
    let catalogue = synced(&fake).await;
    let dir = tempfile::TempDir::new().unwrap();
    let csv_path = dir.path().join("blocked.csv");

    let llm = ScriptedLlm::new(&[("o/r1", r#"{"beta": 0.95}"#), ("o/r3", "[]")]);
    let batch = ScoringBatch::new(
        &catalogue,
        Scorer::new(&llm),
        Some(&fake),
        PlannerPolicy::default(),
        BlockedLog::new(&csv_path),
    );
    let options = BatchOptions {
        dry_run: true,
        apply: true,
        limit: 10,
        ..Default::default()
    };
    let report = batch.run(&options, |_| {}).await.unwrap();

    assert!(report.run_id.is_none());
    assert_eq!(report.items.len(), 3);
    let summary = report.summary();
    assert_eq!(
        (summary.scored, summary.unparsed, summary.blocked),
        (1, 1, 1)
    );
    assert!(fake.mutations().is_empty());
    assert!(!csv_path.exists());

    let r1 = catalogue.get_repository_by_name("o/r1").await.unwrap().unwrap();
    assert_eq!(catalogue.latest_run_at("repo", Some(r1.id), "scored").await.unwrap(), None);
    assert_eq!(catalogue.membership_slugs(r1.id).await.unwrap(), slugs(&["alpha"]));
}

#[tokio::test]
async fn apply_without_transport_is_a_config_error() {
    let catalogue = Catalogue::open_local(":memory:").await.unwrap();
    let llm = ScriptedLlm::new(&[]);
    let batch = ScoringBatch::new(
        &catalogue,
        Scorer::new(&llm),
        None::<&FakeGithub>,
        PlannerPolicy::default(),
        BlockedLog::new("unused.csv"),
    );
    let options = BatchOptions {
        apply: true,
        limit: 5,
        ..Default::default()
    };
    let err = batch.run(&options, |_| {}).await.unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
}

#[tokio::test]
async fn recently_scored_repositories_are_skipped() {
    let fake = fake_github();
    let catalogue = synced(&fake).await;
    let dir = tempfile::TempDir::new().unwrap();
    let llm = ScriptedLlm::new(&[("o/r1", r#"{"alpha": 0.9}"#)]);
    let batch = ScoringBatch::new(
        &catalogue,
        Scorer::new(&llm),
        None::<&FakeGithub>,
        PlannerPolicy::default(),
        BlockedLog::new(dir.path().join("blocked.csv")),
    );

    let cutoff = chrono::Utc::now() - chrono::Duration::minutes(1);
    let options = BatchOptions {
        repos: vec!["o/r1".into()],
        skip_scored_since: Some(cutoff),
        ..Default::default()
    };

    let first = batch.run(&options, |_| {}).await.unwrap();
    assert!(matches!(
        first.items[0].result,
        Ok(ItemOutcome::Skipped {
            reason: SkipReason::Unchanged
        })
    ));

    let second = batch.run(&options, |_| {}).await.unwrap();
    assert!(matches!(
        second.items[0].result,
        Ok(ItemOutcome::Skipped {
            reason: SkipReason::ScoredRecently
        })
    ));
}

#[tokio::test]
async fn unparseable_replies_are_reported_verbatim() {
    let fake = fake_github();
    let catalogue = synced(&fake).await;
    let dir = tempfile::TempDir::new().unwrap();
    let csv_path = dir.path().join("blocked.csv");

    // r1 is in alpha, r3 is in no list; neither reply is usable.
    let llm = ScriptedLlm::new(&[("o/r1", "[1, 2]")]);
    let batch = ScoringBatch::new(
        &catalogue,
        Scorer::new(&llm),
        None::<&FakeGithub>,
        PlannerPolicy::default(),
        BlockedLog::new(&csv_path),
    );
    let cutoff = chrono::Utc::now() - chrono::Duration::minutes(1);
    let options = BatchOptions {
        repos: vec!["o/r1".into(), "o/r3".into()],
        skip_scored_since: Some(cutoff),
        ..Default::default()
    };

    let report = batch.run(&options, |_| {}).await.unwrap();
    let raws: Vec<_> = report
        .items
        .iter()
        .map(|item| match &item.result {
            Ok(ItemOutcome::Unparsed { raw }) => raw.as_str(),
            other => panic!("{}: unexpected {other:?}", item.name_with_owner),
        })
        .collect();
    assert_eq!(raws, vec!["[1, 2]", "I am not sure."]);
    assert_eq!(report.summary().unparsed, 2);

    assert!(!csv_path.exists());
    assert!(
        catalogue
            .scores_for_run(report.run_id.as_deref().unwrap())
            .await
            .unwrap()
            .is_empty()
    );

    let r1 = catalogue.get_repository_by_name("o/r1").await.unwrap().unwrap();
    assert_eq!(catalogue.membership_slugs(r1.id).await.unwrap(), slugs(&["alpha"]));
    assert!(catalogue.latest_run_at("repo", Some(r1.id), SCORED_FLAG).await.unwrap().is_none());
    assert!(catalogue.latest_run_at("repo", Some(r1.id), UNPARSED_FLAG).await.unwrap().is_some());

    // Not marked as scored, so the cutoff does not skip them.
    let again = batch.run(&options, |_| {}).await.unwrap();
    assert_eq!(again.summary().unparsed, 2);
}
