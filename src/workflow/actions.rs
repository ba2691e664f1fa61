//! Rollback actions for workflow steps

use crate::action::RollbackFn;
use crate::git::Git;
use crate::review::CodeReviewTool;
use crate::tracker::IssueTracker;
use crate::types::Milestone;
use std::sync::Arc;

pub fn delete_branch(git: &Arc<dyn Git>, name: &str) -> RollbackFn {
    let git = Arc::clone(git);
    let name = name.to_string();
    RollbackFn::new(format!("delete branch {name}"), move || {
        let git = Arc::clone(&git);
        let name = name.clone();
        async move { git.delete_branch(&name) }
    })
}

pub fn reset_branch(git: &Arc<dyn Git>, name: &str, sha: &str) -> RollbackFn {
    let git = Arc::clone(git);
    let name = name.to_string();
    let sha = sha.to_string();
    RollbackFn::new(format!("reset {name} to {}", short_sha(&sha)), move || {
        let git = Arc::clone(&git);
        let name = name.clone();
        let sha = sha.clone();
        async move { git.reset_branch(&name, &sha) }
    })
}

pub fn checkout(git: &Arc<dyn Git>, name: &str) -> RollbackFn {
    let git = Arc::clone(git);
    let name = name.to_string();
    RollbackFn::new(format!("check out {name}"), move || {
        let git = Arc::clone(&git);
        let name = name.clone();
        async move { git.checkout(&name) }
    })
}

pub fn delete_tag(git: &Arc<dyn Git>, name: &str) -> RollbackFn {
    let git = Arc::clone(git);
    let name = name.to_string();
    RollbackFn::new(format!("delete tag {name}"), move || {
        let git = Arc::clone(&git);
        let name = name.clone();
        async move { git.delete_tag(&name) }
    })
}

pub fn delete_remote_branch(git: &Arc<dyn Git>, remote: &str, name: &str) -> RollbackFn {
    let git = Arc::clone(git);
    let remote = remote.to_string();
    let name = name.to_string();
    RollbackFn::new(format!("delete {remote}/{name}"), move || {
        let git = Arc::clone(&git);
        let remote = remote.clone();
        let name = name.clone();
        async move { git.delete_remote_branch(&remote, &name) }
    })
}

pub fn delete_milestone(tracker: &Arc<dyn IssueTracker>, milestone: Milestone) -> RollbackFn {
    let tracker = Arc::clone(tracker);
    RollbackFn::new(format!("delete {milestone}"), move || {
        let tracker = Arc::clone(&tracker);
        let milestone = milestone.clone();
        async move { tracker.delete_milestone(&milestone).await }
    })
}

pub fn close_review_request(review: &Arc<dyn CodeReviewTool>, number: u64) -> RollbackFn {
    let review = Arc::clone(review);
    RollbackFn::new(format!("close review request #{number}"), move || {
        let review = Arc::clone(&review);
        async move { review.close_review_request(number).await }
    })
}

pub fn short_sha(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}
