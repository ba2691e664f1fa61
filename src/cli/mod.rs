//! Command-line interface

pub mod context;
pub mod release;
pub mod review;
pub mod story;
pub mod style;

use anstream::println;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use relflow::error::{Error, Result};
use relflow::progress::{ProgressCallback, StepStatus};
use std::path::PathBuf;
use style::{Stylize, check, cross};

/// Release workflow automation for git + GitHub/GitLab
#[derive(Debug, Parser)]
#[command(name = "relflow", version, about)]
pub struct Cli {
    /// Path to the repository
    #[arg(long, global = true, default_value = ".")]
    pub path: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start, stage and close releases
    Release {
        #[command(subcommand)]
        command: ReleaseCommand,
    },
    /// Work on stories
    Story {
        #[command(subcommand)]
        command: StoryCommand,
    },
    /// Review requests
    Review {
        #[command(subcommand)]
        command: ReviewCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReleaseCommand {
    /// Show the state of a release and its stories
    Status {
        /// Release version (defaults to the running release)
        version: Option<String>,
    },
    /// Cut a release branch from trunk
    Start {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Deploy the release branch to the stage branch
    Stage {
        /// Release version (defaults to the running release)
        version: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Tag the release and close its milestone
    Close {
        /// Release version (defaults to the running release)
        version: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum StoryCommand {
    /// Create the story branch and mark the story being implemented
    Start {
        /// Story id
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReviewCommand {
    /// Push the current branch and open a review request
    Post {
        /// Open the review request as a draft
        #[arg(long)]
        draft: bool,
    },
}

/// Progress printer for workflow steps
pub struct CliProgress;

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_step(&self, step: &str, status: StepStatus) {
        match status {
            StepStatus::Running => println!("  {} {step}", "run ".muted()),
            StepStatus::Done => println!("  {} {step}", check()),
            StepStatus::Failed => println!("  {} {step}", cross()),
        }
    }

    async fn on_message(&self, message: &str) {
        println!("  {}", message.muted());
    }
}

/// Ask before a mutating command unless `--yes` was given
pub fn confirm(prompt: &str, yes: bool) -> Result<()> {
    if yes {
        return Ok(());
    }
    let proceed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| Error::Internal(format!("failed to read confirmation: {e}")))?;
    if proceed { Ok(()) } else { Err(Error::Cancelled) }
}
