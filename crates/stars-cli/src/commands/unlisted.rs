use anyhow::Context;
use stars_github::StarWalker;
use stars_sync::unlisted_stars;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `stars unlisted`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let client = ctx.github()?;
    let walker = StarWalker::new(&client, ctx.config.github.stars_page_size)
        .with_cancel(ctx.cancel.clone());

    let progress = Progress::spinner("walking stars");
    let report = unlisted_stars(walker, &ctx.catalogue).await;
    progress.finish_clear();
    let report = report.context("failed to compute unlisted stars")?;

    output(&report, flags.format)
}
