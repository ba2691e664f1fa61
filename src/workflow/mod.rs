//! Release, story and review workflows
//!
//! Every workflow follows the same shape: validate locally, then run the
//! mutating steps in order, pushing one [`Action`](crate::action::Action) per
//! completed step onto an [`ActionChain`](crate::action::ActionChain). The
//! chain is finished with `rollback_on_error`, so a failure in any later step
//! undoes the earlier ones in reverse order.

mod actions;
mod notes;
mod release;
mod review;
mod story;
mod version;

pub use notes::render_release_notes;
pub use release::{
    ClosedRelease, NextRelease, ReleaseState, RunningRelease, StagedRelease, StartedRelease,
};
pub use review::PostedReview;
pub use story::{StartedStory, branch_slug};
pub use version::{next_trunk_version, parse_version, release_version};

use crate::bulk::BulkUpdater;
use crate::error::Result;
use crate::git::Git;
use crate::progress::{NoopProgress, ProgressCallback, StepStatus};
use crate::review::CodeReviewTool;
use crate::tracker::IssueTracker;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// Branch, tag and file naming used by the workflows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Remote to push to
    pub remote: String,
    /// Main development branch
    pub trunk: String,
    /// Branch tracking what is deployed to staging
    pub stage_branch: String,
    /// Release branches are `<release_prefix><version>`
    pub release_prefix: String,
    /// Story branches are `<story_prefix><id>-<slug>`
    pub story_prefix: String,
    /// Release tags are `<tag_prefix><version>`
    pub tag_prefix: String,
    /// File holding the trunk version, relative to the repository root
    pub version_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            trunk: "main".to_string(),
            stage_branch: "stage".to_string(),
            release_prefix: "release/".to_string(),
            story_prefix: "story/".to_string(),
            tag_prefix: "v".to_string(),
            version_file: PathBuf::from("VERSION"),
        }
    }
}

/// Explicit dependencies shared by all workflows
pub struct Workflow {
    git: Arc<dyn Git>,
    tracker: Arc<dyn IssueTracker>,
    review: Option<Arc<dyn CodeReviewTool>>,
    bulk: BulkUpdater,
    settings: Settings,
    progress: Arc<dyn ProgressCallback>,
}

impl Workflow {
    /// Create a workflow over `git` and `tracker`
    pub fn new(git: Arc<dyn Git>, tracker: Arc<dyn IssueTracker>, settings: Settings) -> Self {
        Self {
            git,
            tracker,
            review: None,
            bulk: BulkUpdater::default(),
            settings,
            progress: Arc::new(NoopProgress),
        }
    }

    /// Use `review` for posting review requests
    #[must_use]
    pub fn with_review_tool(mut self, review: Arc<dyn CodeReviewTool>) -> Self {
        self.review = Some(review);
        self
    }

    /// Use `bulk` for tracker bulk updates
    #[must_use]
    pub const fn with_bulk_updater(mut self, bulk: BulkUpdater) -> Self {
        self.bulk = bulk;
        self
    }

    /// Report progress to `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Naming settings
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The issue tracker
    pub fn tracker(&self) -> &Arc<dyn IssueTracker> {
        &self.tracker
    }

    fn release_branch(&self, version: &semver::Version) -> String {
        format!("{}{version}", self.settings.release_prefix)
    }

    fn release_tag(&self, version: &semver::Version) -> String {
        format!("{}{version}", self.settings.tag_prefix)
    }

    /// Run one step, reporting run/done/fail around it
    async fn step<T, F>(&self, name: &str, step: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.progress.on_step(name, StepStatus::Running).await;
        let result = step.await;
        let status = if result.is_ok() {
            StepStatus::Done
        } else {
            StepStatus::Failed
        };
        self.progress.on_step(name, status).await;
        result
    }
}
