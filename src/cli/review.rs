//! Review commands

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check};
use anstream::println;
use relflow::error::Result;
use std::path::Path;

/// Push the current branch and open (or reuse) its review request
pub async fn run_post(path: &Path, draft: bool) -> Result<()> {
    let ctx = CommandContext::new(path)?.with_review_tool()?;

    println!("{}", "Posting review request".emphasis());
    let posted = ctx.workflow.post_review(draft).await?;

    println!();
    let verb = if posted.created { "Opened" } else { "Updated" };
    println!(
        "{} {verb} #{} {}",
        check(),
        posted.pull_request.number,
        posted.pull_request.html_url.accent()
    );
    if !posted.stories.is_empty() {
        let ids: Vec<String> = posted.stories.iter().map(ToString::to_string).collect();
        println!("  {} {}", "Stories:".muted(), ids.join(", "));
    }
    Ok(())
}
