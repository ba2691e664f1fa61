//! relflow CLI

mod cli;

use anstream::eprintln;
use clap::Parser;
use cli::style::Stylize;
use cli::{Cli, Commands, ReleaseCommand, ReviewCommand, StoryCommand};
use relflow::Error;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable overriding the log filter
const LOG_ENV: &str = "RELFLOW_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Cancelled) => {
            eprintln!("{}", "Aborted".muted());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {e}", "error:".error());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "relflow=debug" } else { "relflow=info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> relflow::Result<()> {
    let path = cli.path;
    match cli.command {
        Commands::Release { command } => match command {
            ReleaseCommand::Status { version } => {
                cli::release::run_status(&path, version.as_deref()).await
            }
            ReleaseCommand::Start { yes } => cli::release::run_start(&path, yes).await,
            ReleaseCommand::Stage { version, yes } => {
                cli::release::run_stage(&path, version.as_deref(), yes).await
            }
            ReleaseCommand::Close { version, yes } => {
                cli::release::run_close(&path, version.as_deref(), yes).await
            }
        },
        Commands::Story { command } => match command {
            StoryCommand::Start { id } => cli::story::run_start(&path, &id).await,
        },
        Commands::Review { command } => match command {
            ReviewCommand::Post { draft } => cli::review::run_post(&path, draft).await,
        },
    }
}
