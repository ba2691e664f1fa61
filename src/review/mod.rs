//! Code review tools for GitHub and GitLab
//!
//! Review requests are pull requests (GitHub) or merge requests (GitLab).

mod github;
mod gitlab;

pub use github::GitHubReviewTool;
pub use gitlab::GitLabReviewTool;

use crate::error::Result;
use crate::types::{Platform, PlatformConfig, PullRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Review request operations
#[async_trait]
pub trait CodeReviewTool: Send + Sync {
    /// Platform backing this tool
    fn platform(&self) -> Platform;

    /// Find an open review request for `head`
    async fn find_review_request(&self, head: &str) -> Result<Option<PullRequest>>;

    /// Open a review request merging `head` into `base`
    async fn post_review_request(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest>;

    /// Close a review request without merging
    async fn close_review_request(&self, number: u64) -> Result<()>;
}

/// Create the review tool described by `config`
pub fn create_review_tool(
    config: &PlatformConfig,
    token: String,
) -> Result<Arc<dyn CodeReviewTool>> {
    match config.platform {
        Platform::GitHub => Ok(Arc::new(GitHubReviewTool::new(
            &token,
            config.owner.clone(),
            config.repo.clone(),
            config.host.clone(),
        )?)),
        Platform::GitLab => Ok(Arc::new(GitLabReviewTool::new(
            token,
            config.owner.clone(),
            config.repo.clone(),
            config.host.clone(),
        )?)),
    }
}
