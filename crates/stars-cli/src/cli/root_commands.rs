use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Pull every list, its items and all starred repositories into the catalogue.
    Sync,
    /// Starred repositories that are in none of your lists.
    Unlisted,
    /// Score repositories against your lists and plan membership changes.
    Score(ScoreArgs),
    /// Write every starred repository to a JSON Lines file.
    Export(ExportArgs),
    /// Inspect or reset the run ledger.
    Runs {
        #[command(subcommand)]
        action: RunsCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct ScoreArgs {
    /// Number of top-ranked repositories to score (defaults to general.default_limit).
    #[arg(long)]
    pub limit: Option<u32>,

    /// Score only these repositories (owner/name). Repeatable.
    #[arg(long = "repo", value_name = "OWNER/NAME")]
    pub repos: Vec<String>,

    /// Plan only: persist nothing and never call the mutation.
    #[arg(long)]
    pub dry_run: bool,

    /// Apply non-blocked plans to GitHub and the catalogue.
    #[arg(long)]
    pub apply: bool,

    /// Skip repositories already scored at or after this RFC 3339 instant.
    #[arg(long, value_name = "RFC3339")]
    pub skip_scored_since: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    /// Destination file, overwritten if it exists.
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct LedgerKey {
    /// Subject kind, e.g. `repo` or `list`.
    #[arg(long)]
    pub subject: String,

    /// Catalogue row id; omit for subject-wide entries.
    #[arg(long)]
    pub row: Option<i64>,

    /// Run flag, e.g. `scored` or `synced`.
    #[arg(long)]
    pub flag: String,
}

#[derive(Clone, Debug, Subcommand)]
pub enum RunsCommands {
    /// Most recent ledger entry for a key.
    Latest(LedgerKey),
    /// Delete every ledger entry for a key.
    Reset(LedgerKey),
}
