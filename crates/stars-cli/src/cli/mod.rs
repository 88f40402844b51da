use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::{Commands, RunsCommands};

/// Top-level CLI parser for the `stars` binary.
#[derive(Debug, Parser)]
#[command(
    name = "stars",
    version,
    about = "Starline - keep GitHub star lists in sync and score repositories into them"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only, no progress)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Catalogue database path (overrides general.database_path)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            db: self.db.clone(),
        }
    }
}
