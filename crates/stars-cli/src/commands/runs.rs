use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::RunsCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `stars runs`.
pub async fn handle(action: &RunsCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        RunsCommands::Latest(key) => {
            let entry = ctx
                .catalogue
                .latest_run(&key.subject, key.row, &key.flag)
                .await?;
            output(&entry, flags.format)
        }
        RunsCommands::Reset(key) => {
            let deleted = ctx
                .catalogue
                .reset_run(&key.subject, key.row, &key.flag)
                .await?;
            output(
                &json!({
                    "subject": key.subject,
                    "row": key.row,
                    "flag": key.flag,
                    "deleted": deleted,
                }),
                flags.format,
            )
        }
    }
}
