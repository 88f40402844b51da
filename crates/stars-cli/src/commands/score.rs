use anyhow::Context;
use serde::Serialize;
use stars_llm::{OpenAiBackend, Scorer};
use stars_sync::{BatchOptions, BatchReport, BatchSummary, BlockedLog, ItemOutcome, ScoringBatch};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ScoreArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct ItemView<'a> {
    name_with_owner: &'a str,
    #[serde(flatten)]
    outcome: Option<&'a ItemOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScoreOutput<'a> {
    run_id: Option<&'a str>,
    dry_run: bool,
    summary: BatchSummary,
    items: Vec<ItemView<'a>>,
}

impl<'a> ScoreOutput<'a> {
    fn new(report: &'a BatchReport, dry_run: bool) -> Self {
        let items = report
            .items
            .iter()
            .map(|item| ItemView {
                name_with_owner: &item.name_with_owner,
                outcome: item.result.as_ref().ok(),
                error: item.result.as_ref().err().map(|e| format!("{e:#}")),
            })
            .collect();
        Self {
            run_id: report.run_id.as_deref(),
            dry_run,
            summary: report.summary(),
            items,
        }
    }
}

/// Handle `stars score`.
pub async fn handle(args: &ScoreArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let llm = ctx.config.llm.require()?;
    let backend = OpenAiBackend::new(llm).context("failed to build model backend")?;
    let mut scorer = Scorer::new(&backend);
    if llm.send_schema_hint {
        scorer = scorer.with_schema_hint();
    }

    // Credentials for the mutation are checked before any model call.
    let client = if args.apply && !args.dry_run {
        Some(ctx.github()?)
    } else {
        None
    };

    let options = BatchOptions {
        dry_run: args.dry_run,
        apply: args.apply,
        limit: args.limit.unwrap_or(ctx.config.general.default_limit),
        repos: args.repos.clone(),
        skip_scored_since: args.skip_scored_since,
    };
    let batch = ScoringBatch::new(
        &ctx.catalogue,
        scorer,
        client.as_ref(),
        ctx.config.policy,
        BlockedLog::new(&ctx.config.general.blocked_csv_path),
    );

    let expected = if options.repos.is_empty() {
        u64::from(options.limit)
    } else {
        u64::try_from(options.repos.len()).unwrap_or(u64::MAX)
    };
    let progress = Progress::bar(expected, "scoring");
    let report = batch
        .run(&options, |item| {
            progress.inc(1);
            progress.set_message(&item.name_with_owner);
        })
        .await;
    progress.finish_clear();
    let report = report.context("scoring batch failed")?;

    output(&ScoreOutput::new(&report, options.dry_run), flags.format)
}
