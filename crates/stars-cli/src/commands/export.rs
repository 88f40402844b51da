use std::fs::File;
use std::io::BufWriter;

use anyhow::Context;
use serde_json::json;
use serde_jsonlines::JsonLinesWriter;
use stars_github::StarWalker;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `stars export`: one JSON object per starred repository, in
/// starred order, written page by page.
pub async fn handle(args: &ExportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let client = ctx.github()?;
    let file = File::create(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let mut writer = JsonLinesWriter::new(BufWriter::new(file));
    let mut walker = StarWalker::new(&client, ctx.config.github.stars_page_size)
        .with_cancel(ctx.cancel.clone());

    let progress = Progress::spinner("exporting stars");
    let mut written = 0usize;
    loop {
        let page = match walker.next_page().await {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(error) => {
                progress.finish_err("export failed");
                return Err(error).context("star walk failed");
            }
        };
        writer
            .write_all(&page)
            .with_context(|| format!("failed to write {}", args.out.display()))?;
        written += page.len();
        progress.set_message(&format!("exported {written}"));
    }
    writer.flush().context("failed to flush export")?;
    progress.finish_clear();
    tracing::info!(written, out = %args.out.display(), "stars exported");

    output(&json!({ "out": args.out, "written": written }), flags.format)
}
