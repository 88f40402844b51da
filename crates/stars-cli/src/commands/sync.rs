use anyhow::Context;
use serde::Serialize;
use stars_github::{ListWalker, StarWalker};
use stars_sync::{ListSyncReport, StarSyncReport, sync_lists, sync_stars};

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct SyncOutput {
    lists: ListSyncReport,
    stars: StarSyncReport,
}

/// Handle `stars sync`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let client = ctx.github()?;
    let github = &ctx.config.github;

    let progress = Progress::spinner("syncing lists");
    let lists = match sync_lists(
        ListWalker::new(&client, github.lists_page_size, github.items_page_size),
        &ctx.catalogue,
    )
    .await
    {
        Ok(report) => report,
        Err(error) => {
            progress.finish_err("list sync failed");
            return Err(error).context("list sync failed");
        }
    };

    progress.set_message("syncing stars");
    let walker = StarWalker::new(&client, github.stars_page_size).with_cancel(ctx.cancel.clone());
    let stars = match sync_stars(walker, &ctx.catalogue).await {
        Ok(report) => report,
        Err(error) => {
            progress.finish_err("star sync failed");
            return Err(error).context("star sync failed");
        }
    };
    progress.finish_clear();

    output(&SyncOutput { lists, stars }, flags.format)
}
