//! Shared command context for CLI commands
//!
//! Builds every collaborator a workflow needs from the repository at `path`
//! and its `.relflow.toml`.

use crate::cli::CliProgress;
use relflow::auth::{Token, get_token};
use relflow::bulk::BulkUpdater;
use relflow::config::{Config, load_config};
use relflow::error::Result;
use relflow::git::SystemGit;
use relflow::review::create_review_tool;
use relflow::tracker::create_issue_tracker;
use relflow::workflow::Workflow;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Shared context for CLI commands
pub struct CommandContext {
    /// Parsed configuration
    pub config: Config,
    /// Workflow wired to the configured tracker
    pub workflow: Workflow,
    tracker_token: Token,
}

impl CommandContext {
    /// Open the repository, load its config and connect to the tracker
    pub fn new(path: &Path) -> Result<Self> {
        let git = SystemGit::open(path)?;
        let repo_root = git.work_tree().to_path_buf();
        let config = load_config(&repo_root)?;
        debug!(root = %repo_root.display(), tracker = %config.tracker.platform, "loaded config");

        let tracker_token = get_token(config.tracker.platform)?;
        let tracker =
            create_issue_tracker(&config.tracker, config.labels(), tracker_token.value.clone())?;

        let workflow = Workflow::new(Arc::new(git), tracker, config.settings.clone())
            .with_bulk_updater(BulkUpdater::new(config.concurrency))
            .with_progress(Arc::new(CliProgress));

        Ok(Self {
            config,
            workflow,
            tracker_token,
        })
    }

    /// Connect the configured code review tool as well
    pub fn with_review_tool(mut self) -> Result<Self> {
        let review_config = self.config.review_platform();
        let token = if review_config.platform == self.config.tracker.platform
            && review_config.host == self.config.tracker.host
        {
            self.tracker_token.clone()
        } else {
            get_token(review_config.platform)?
        };
        let review = create_review_tool(review_config, token.value)?;
        self.workflow = self.workflow.with_review_tool(review);
        Ok(self)
    }
}
