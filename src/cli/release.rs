//! Release commands - status, start, stage, close

use crate::cli::confirm;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, arrow, check};
use anstream::println;
use relflow::error::Result;
use relflow::tracker::{StoryState, blocking_stories};
use relflow::types::Story;
use relflow::workflow::{ReleaseState, RunningRelease, Workflow, parse_version};
use semver::Version;
use std::path::Path;

fn parse_version_arg(version: Option<&str>) -> Result<Option<Version>> {
    version
        .map(|v| parse_version(v.trim_start_matches('v')))
        .transpose()
}

fn running_release<'a>(
    workflow: &'a Workflow,
    version: Option<&str>,
) -> Result<RunningRelease<'a>> {
    let version = parse_version_arg(version)?;
    workflow.running_release(version.as_ref())
}

/// Print the state of a release and of each of its stories
pub async fn run_status(path: &Path, version: Option<&str>) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let workflow = &ctx.workflow;

    let version = match parse_version_arg(version)? {
        Some(version) => version,
        None => workflow.running_release(None)?.version().clone(),
    };
    let state = workflow.release_state(&version)?;
    println!(
        "{} {} {}",
        "Release".emphasis(),
        version.accent(),
        format!("({state})").muted()
    );
    if state == ReleaseState::NotStarted {
        return Ok(());
    }

    let tracker = workflow.tracker();
    let stories = tracker.release_stories(&version.to_string()).await?;
    if stories.is_empty() {
        println!("  {}", "No stories".muted());
        return Ok(());
    }
    for story in &stories {
        println!(
            "  {} {:<8} {:<18} {}",
            arrow(),
            format!("#{}", story.id),
            tracker.abstract_state(story).to_string(),
            story.title
        );
    }

    println!();
    let skip = &tracker.labels().skip_check;
    let state_of = |story: &Story| tracker.abstract_state(story);
    for (operation, allowed) in [
        ("stage", StoryState::is_stageable as fn(StoryState) -> bool),
        ("close", StoryState::is_closable),
    ] {
        let report = blocking_stories(&stories, state_of, allowed, skip);
        if report.rows.is_empty() {
            println!("  {} ready to {operation}", check());
        } else {
            println!(
                "  {} {} blocking {operation}",
                "!".warn(),
                format!("{} story(ies)", report.rows.len()).warn()
            );
        }
    }
    Ok(())
}

/// Start the next release
pub async fn run_start(path: &Path, yes: bool) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let next = ctx.workflow.next_release()?;

    println!(
        "{} {} {} trunk moves to {}",
        "Starting release".emphasis(),
        next.version().accent(),
        arrow(),
        next.trunk_version().accent()
    );
    confirm("Start the release?", yes)?;

    let started = next.start().await?;
    println!();
    println!(
        "{} Release {} started on {} with {} story(ies)",
        check(),
        started.version.accent(),
        started.branch.accent(),
        started.stories.len()
    );
    Ok(())
}

/// Stage a running release
pub async fn run_stage(path: &Path, version: Option<&str>, yes: bool) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let release = running_release(&ctx.workflow, version)?;

    println!(
        "{} {} {}",
        "Staging release".emphasis(),
        release.version().accent(),
        format!("({})", release.state()).muted()
    );
    confirm("Stage the release?", yes)?;

    let staged = release.stage().await?;
    println!();
    println!(
        "{} Release {} staged, {} story(ies) marked staged",
        check(),
        staged.version.accent(),
        staged.staged.len()
    );
    Ok(())
}

/// Close a running release
pub async fn run_close(path: &Path, version: Option<&str>, yes: bool) -> Result<()> {
    let ctx = CommandContext::new(path)?;
    let release = running_release(&ctx.workflow, version)?;

    println!(
        "{} {}",
        "Closing release".emphasis(),
        release.version().accent()
    );
    confirm("Close the release?", yes)?;

    let closed = release.close().await?;
    println!();
    println!("{} Release {} tagged {}", check(), closed.version.accent(), closed.tag.accent());
    println!();
    println!("{}", closed.notes.muted());
    Ok(())
}
