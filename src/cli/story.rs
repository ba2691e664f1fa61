//! Story commands

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check};
use anstream::println;
use relflow::error::Result;
use std::path::Path;

/// Start work on story `id`
pub async fn run_start(path: &Path, id: &str) -> Result<()> {
    let ctx = CommandContext::new(path)?;

    println!("{} {}", "Starting story".emphasis(), id.accent());
    let started = ctx.workflow.start_story(id).await?;

    println!();
    println!(
        "{} {} {} on {}",
        check(),
        started.story.accent(),
        started.story.title,
        started.branch.accent()
    );
    Ok(())
}
