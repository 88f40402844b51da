use anyhow::Context;
use clap::Parser;
use stars_config::StarsConfig;
use stars_core::CancelSignal;

mod cli;
mod commands;
mod context;
mod output;
mod progress;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("stars error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let flags = cli.global_flags();
    init_tracing(flags.quiet, flags.verbose)?;
    ui::init(&flags);

    let config = StarsConfig::load_with_dotenv().context("failed to load configuration")?;
    context::warn_unconfigured(&config);

    let cancel = CancelSignal::new();
    watch_ctrl_c(cancel.clone());

    let ctx = context::AppContext::init(config, flags.db.as_deref(), cancel).await?;
    commands::dispatch(cli.command, &ctx, &flags).await
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("STARS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// First Ctrl-C asks walks to stop at the next page boundary; a second one
/// exits immediately.
fn watch_ctrl_c(cancel: CancelSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("interrupt received, stopping after the current page");
        cancel.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("stars error: interrupted");
            std::process::exit(130);
        }
    });
}
