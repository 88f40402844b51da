//! Sequential score → plan → apply loop over a batch of repositories.
//!
//! Every repository yields its own `Result`; one failure never stops the
//! batch. Dry runs open no scoring run, persist no scores or ledger entries,
//! write no CSV rows and never call the mutation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use stars_core::PlannerPolicy;
use stars_core::entities::{ListDefinition, ListScore, Repository};
use stars_db::Catalogue;
use stars_github::GraphQlTransport;
use stars_llm::{LlmBackend, ScoreOutcome, Scorer};

use crate::applier::{ApplyReport, Applier};
use crate::error::SyncError;
use crate::escape_hatch::BlockedLog;
use crate::planner::{MembershipPlan, plan_membership};

/// Ledger flag written for every repository scored in a non-dry run.
pub const SCORED_FLAG: &str = "scored";

/// Ledger flag for a model reply that could not be parsed. Distinct from
/// [`SCORED_FLAG`] so `skip_scored_since` retries these repositories.
pub const UNPARSED_FLAG: &str = "unparsed";

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub dry_run: bool,
    pub apply: bool,
    /// Size of the top-N selection when `repos` is empty.
    pub limit: u32,
    /// Explicit `owner/name` selection.
    pub repos: Vec<String>,
    /// Skip repositories scored at or after this instant.
    pub skip_scored_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Already scored since the cutoff.
    ScoredRecently,
    /// The plan matches current membership.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Planned with changes, not applied.
    Scored { plan: MembershipPlan },
    /// The model reply could not be parsed; nothing was planned.
    Unparsed { raw: String },
    /// The plan would leave the repository listless.
    Blocked { plan: MembershipPlan },
    Applied {
        plan: MembershipPlan,
        report: ApplyReport,
    },
    Skipped { reason: SkipReason },
}

#[derive(Debug)]
pub struct BatchItem {
    pub name_with_owner: String,
    pub result: Result<ItemOutcome, SyncError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub scored: usize,
    pub unparsed: usize,
    pub blocked: usize,
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// `None` for dry runs.
    pub run_id: Option<String>,
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.items.len(),
            ..Default::default()
        };
        for item in &self.items {
            match &item.result {
                Ok(ItemOutcome::Scored { .. }) => summary.scored += 1,
                Ok(ItemOutcome::Unparsed { .. }) => summary.unparsed += 1,
                Ok(ItemOutcome::Blocked { .. }) => summary.blocked += 1,
                Ok(ItemOutcome::Applied { .. }) => summary.applied += 1,
                Ok(ItemOutcome::Skipped { .. }) => summary.skipped += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

pub struct ScoringBatch<'a, B: LlmBackend + ?Sized, T: GraphQlTransport + ?Sized> {
    catalogue: &'a Catalogue,
    scorer: Scorer<'a, B>,
    transport: Option<&'a T>,
    policy: PlannerPolicy,
    blocked_log: BlockedLog,
}

impl<'a, B: LlmBackend + ?Sized, T: GraphQlTransport + ?Sized> ScoringBatch<'a, B, T> {
    pub const fn new(
        catalogue: &'a Catalogue,
        scorer: Scorer<'a, B>,
        transport: Option<&'a T>,
        policy: PlannerPolicy,
        blocked_log: BlockedLog,
    ) -> Self {
        Self {
            catalogue,
            scorer,
            transport,
            policy,
            blocked_log,
        }
    }

    async fn select(&self, options: &BatchOptions) -> Result<Vec<Result<Repository, String>>, SyncError> {
        if options.repos.is_empty() {
            return Ok(self
                .catalogue
                .top_repositories(options.limit)
                .await?
                .into_iter()
                .map(Ok)
                .collect());
        }
        let mut selected = Vec::with_capacity(options.repos.len());
        for name in &options.repos {
            match self.catalogue.get_repository_by_name(name).await? {
                Some(repo) => selected.push(Ok(repo)),
                None => selected.push(Err(name.clone())),
            }
        }
        Ok(selected)
    }

    /// Run the batch.
    ///
    /// `on_item` is called after each repository finishes.
    ///
    /// # Errors
    ///
    /// Only errors that prevent any work: applying without a remote
    /// transport, or failing to read the selection and list definitions.
    pub async fn run(
        &self,
        options: &BatchOptions,
        mut on_item: impl FnMut(&BatchItem),
    ) -> Result<BatchReport, SyncError> {
        let applying = options.apply && !options.dry_run;
        if applying && self.transport.is_none() {
            return Err(SyncError::Config(
                "applying changes requires a GitHub token".into(),
            ));
        }

        let lists = self.catalogue.list_definitions().await?;
        let selection = self.select(options).await?;

        let run_id = if options.dry_run {
            None
        } else {
            let policy = serde_json::to_value(self.policy)
                .map_err(|e| SyncError::Config(format!("policy: {e}")))?;
            let run = self
                .catalogue
                .start_scoring_run(Some(self.scorer.model()), Some(&policy))
                .await?;
            Some(run.id)
        };

        tracing::info!(
            repos = selection.len(),
            lists = lists.len(),
            dry_run = options.dry_run,
            apply = applying,
            "scoring batch started"
        );

        let mut report = BatchReport {
            run_id,
            items: Vec::with_capacity(selection.len()),
        };
        for entry in selection {
            let item = match entry {
                Ok(repo) => {
                    let result = self
                        .process(&repo, &lists, options, report.run_id.as_deref(), applying)
                        .await;
                    if let Err(error) = &result {
                        tracing::warn!(repo = %repo.facts.name_with_owner, %error, "repository failed");
                    }
                    BatchItem {
                        name_with_owner: repo.facts.name_with_owner,
                        result,
                    }
                }
                Err(name) => {
                    tracing::warn!(repo = %name, "repository is not in the catalogue");
                    BatchItem {
                        result: Err(SyncError::NotFound(name.clone())),
                        name_with_owner: name,
                    }
                }
            };
            on_item(&item);
            report.items.push(item);
        }

        let summary = report.summary();
        tracing::info!(
            scored = summary.scored,
            unparsed = summary.unparsed,
            blocked = summary.blocked,
            applied = summary.applied,
            skipped = summary.skipped,
            failed = summary.failed,
            "scoring batch finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        repo: &Repository,
        lists: &[ListDefinition],
        options: &BatchOptions,
        run_id: Option<&str>,
        applying: bool,
    ) -> Result<ItemOutcome, SyncError> {
        if let Some(cutoff) = options.skip_scored_since {
            if self
                .catalogue
                .has_run_since("repo", Some(repo.id), SCORED_FLAG, cutoff)
                .await?
            {
                return Ok(ItemOutcome::Skipped {
                    reason: SkipReason::ScoredRecently,
                });
            }
        }

        let scores = match self.scorer.score(repo, lists).await? {
            ScoreOutcome::Structured(scores) => scores,
            ScoreOutcome::RawText(raw) => {
                tracing::warn!(
                    repo = %repo.facts.name_with_owner,
                    reply = %raw,
                    "unparseable reply, repository left as is"
                );
                if let Some(run_id) = run_id {
                    self.catalogue
                        .log_run(
                            "repo",
                            Some(repo.id),
                            UNPARSED_FLAG,
                            Some(&json!({ "run_id": run_id })),
                        )
                        .await?;
                }
                return Ok(ItemOutcome::Unparsed { raw });
            }
        };
        let scores = scores.as_slice();

        if let Some(run_id) = run_id {
            self.catalogue.record_scores(run_id, repo.id, scores).await?;
            self.catalogue
                .log_run(
                    "repo",
                    Some(repo.id),
                    SCORED_FLAG,
                    Some(&json!({ "run_id": run_id, "scores": scores.len() })),
                )
                .await?;
        }

        let current = self.catalogue.membership_slugs(repo.id).await?;
        let plan = plan_membership(&current, scores, &self.policy);

        if plan.blocked {
            tracing::warn!(
                repo = %repo.facts.name_with_owner,
                reason = plan.block_reason.as_deref().unwrap_or_default(),
                "plan blocked"
            );
            if !options.dry_run {
                self.record_blocked(repo, &current, scores, &plan)?;
            }
            return Ok(ItemOutcome::Blocked { plan });
        }
        if !plan.changed {
            return Ok(ItemOutcome::Skipped {
                reason: SkipReason::Unchanged,
            });
        }

        match self.transport {
            Some(transport) if applying => {
                let report = Applier::new(transport, self.catalogue)
                    .apply(repo, &plan)
                    .await?;
                Ok(ItemOutcome::Applied { plan, report })
            }
            _ => Ok(ItemOutcome::Scored { plan }),
        }
    }

    fn record_blocked(
        &self,
        repo: &Repository,
        current: &BTreeSet<String>,
        scores: &[ListScore],
        plan: &MembershipPlan,
    ) -> Result<(), SyncError> {
        let note = plan.block_reason.as_deref().unwrap_or_default();
        self.blocked_log.record(repo, current, scores, note)
    }
}
