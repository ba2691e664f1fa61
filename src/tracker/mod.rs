//! Issue trackers for GitHub and GitLab
//!
//! Provides one interface over the trackers' stories, labels and milestones,
//! plus the bulk label operations the release workflow is built from.

mod github;
mod gitlab;
mod state;

pub use github::GitHubTracker;
pub use gitlab::GitLabTracker;
pub use state::{
    BlockingStory, StateReport, StoryState, WorkflowLabels, blocking_stories, ensure_closable,
    ensure_stageable,
};

use crate::bulk::{BulkUpdate, BulkUpdater, MutationFn, mutation};
use crate::error::Result;
use crate::types::{Milestone, Platform, PlatformConfig, Story};
use async_trait::async_trait;
use std::sync::Arc;

/// Issue tracker operations
///
/// Mutating methods are idempotent: when the story or milestone is already in
/// the requested state they return `Ok(None)` without calling the remote API.
/// They may be called concurrently for different targets.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Platform backing this tracker
    fn platform(&self) -> Platform;

    /// Label vocabulary in use
    fn labels(&self) -> &WorkflowLabels;

    /// Abstract state of a story; pure
    fn abstract_state(&self, story: &Story) -> StoryState {
        self.labels().state_of(story)
    }

    /// Fetch stories by id; unknown ids are an error
    async fn stories_by_ids(&self, ids: &[String]) -> Result<Vec<Story>>;

    /// All stories carrying the release label for `version`
    async fn release_stories(&self, version: &str) -> Result<Vec<Story>>;

    /// Attach `label`
    async fn add_label(&self, story: Story, label: &str) -> Result<Option<Story>>;

    /// Detach `label`
    async fn remove_label(&self, story: Story, label: &str) -> Result<Option<Story>>;

    /// Find the milestone titled `title`
    async fn find_milestone(&self, title: &str) -> Result<Option<Milestone>>;

    /// Create an open milestone titled `title`
    async fn create_milestone(&self, title: &str) -> Result<Milestone>;

    /// Delete a milestone
    async fn delete_milestone(&self, milestone: &Milestone) -> Result<()>;

    /// Open or close a milestone
    async fn set_milestone_open(&self, milestone: Milestone, open: bool)
    -> Result<Option<Milestone>>;
}

/// Create the tracker described by `config`
pub fn create_issue_tracker(
    config: &PlatformConfig,
    labels: WorkflowLabels,
    token: String,
) -> Result<Arc<dyn IssueTracker>> {
    match config.platform {
        Platform::GitHub => Ok(Arc::new(GitHubTracker::new(
            token,
            config.owner.clone(),
            config.repo.clone(),
            config.host.clone(),
            labels,
        )?)),
        Platform::GitLab => Ok(Arc::new(GitLabTracker::new(
            token,
            config.owner.clone(),
            config.repo.clone(),
            config.host.clone(),
            labels,
        )?)),
    }
}

/// Attach `label` to every story; the returned action detaches it again
pub async fn label_stories(
    tracker: &Arc<dyn IssueTracker>,
    bulk: &BulkUpdater,
    stories: Vec<Story>,
    label: &str,
) -> Result<BulkUpdate<Story>> {
    bulk.update_all(
        stories,
        add_label_fn(tracker, label),
        Some(remove_label_fn(tracker, label)),
    )
    .await
}

/// Detach `label` from every story; the returned action re-attaches it
pub async fn unlabel_stories(
    tracker: &Arc<dyn IssueTracker>,
    bulk: &BulkUpdater,
    stories: Vec<Story>,
    label: &str,
) -> Result<BulkUpdate<Story>> {
    bulk.update_all(
        stories,
        remove_label_fn(tracker, label),
        Some(add_label_fn(tracker, label)),
    )
    .await
}

/// Close every milestone; the returned action reopens them
pub async fn close_milestones(
    tracker: &Arc<dyn IssueTracker>,
    bulk: &BulkUpdater,
    milestones: Vec<Milestone>,
) -> Result<BulkUpdate<Milestone>> {
    bulk.update_all(
        milestones,
        milestone_open_fn(tracker, false),
        Some(milestone_open_fn(tracker, true)),
    )
    .await
}

fn milestone_open_fn(tracker: &Arc<dyn IssueTracker>, open: bool) -> MutationFn<Milestone> {
    let tracker = Arc::clone(tracker);
    mutation(move |milestone| {
        let tracker = Arc::clone(&tracker);
        async move { tracker.set_milestone_open(milestone, open).await }
    })
}

fn add_label_fn(tracker: &Arc<dyn IssueTracker>, label: &str) -> MutationFn<Story> {
    let tracker = Arc::clone(tracker);
    let label = label.to_string();
    mutation(move |story| {
        let tracker = Arc::clone(&tracker);
        let label = label.clone();
        async move { tracker.add_label(story, &label).await }
    })
}

fn remove_label_fn(tracker: &Arc<dyn IssueTracker>, label: &str) -> MutationFn<Story> {
    let tracker = Arc::clone(tracker);
    let label = label.to_string();
    mutation(move |story| {
        let tracker = Arc::clone(&tracker);
        let label = label.clone();
        async move { tracker.remove_label(story, &label).await }
    })
}
