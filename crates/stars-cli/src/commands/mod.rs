pub mod export;
pub mod runs;
pub mod score;
pub mod sync;
pub mod unlisted;

use crate::cli::{Commands, GlobalFlags};
use crate::context::AppContext;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Sync => sync::handle(ctx, flags).await,
        Commands::Unlisted => unlisted::handle(ctx, flags).await,
        Commands::Score(args) => score::handle(&args, ctx, flags).await,
        Commands::Export(args) => export::handle(&args, ctx, flags).await,
        Commands::Runs { action } => runs::handle(&action, ctx, flags).await,
    }
}
