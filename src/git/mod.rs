//! Git collaborator
//!
//! Workflows talk to git through the synchronous [`Git`] trait so tests can
//! substitute an in-memory repository. [`SystemGit`] shells out to `git`.

mod system;
mod trailers;

pub use system::SystemGit;
pub use trailers::{STORY_ID_TRAILER, story_ids};

use crate::error::Result;
use std::path::Path;

/// Blocking git operations used by the workflows
pub trait Git: Send + Sync {
    /// Name of the checked-out branch (`HEAD` when detached)
    fn current_branch(&self) -> Result<String>;

    /// Whether the worktree has no uncommitted changes
    fn is_clean(&self) -> Result<bool>;

    /// Whether local branch `name` exists
    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Whether tag `name` exists
    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Local branches starting with `prefix`
    fn branches(&self, prefix: &str) -> Result<Vec<String>>;

    /// Resolve a revision to a commit sha
    fn rev_parse(&self, rev: &str) -> Result<String>;

    /// Create branch `name` at `start` without checking it out
    fn create_branch(&self, name: &str, start: &str) -> Result<()>;

    /// Force-delete local branch `name`
    fn delete_branch(&self, name: &str) -> Result<()>;

    /// Check out branch `name`
    fn checkout(&self, name: &str) -> Result<()>;

    /// Point branch `name` at `sha`, resetting the worktree if it is checked out
    fn reset_branch(&self, name: &str, sha: &str) -> Result<()>;

    /// Contents of `path` at `rev`
    fn read_file(&self, rev: &str, path: &Path) -> Result<String>;

    /// Commit `contents` to `path` on `branch`, returning the new sha
    ///
    /// Leaves `branch` checked out.
    fn commit_file(
        &self,
        branch: &str,
        path: &Path,
        contents: &str,
        message: &str,
    ) -> Result<String>;

    /// Full messages of the commits in `range` (e.g. `v1.0.0..main`), newest first
    fn commit_messages(&self, range: &str) -> Result<Vec<String>>;

    /// Names of all local tags starting with `prefix`
    fn tags(&self, prefix: &str) -> Result<Vec<String>>;

    /// Create annotated tag `name` on `target`
    fn create_tag(&self, name: &str, target: &str, message: &str) -> Result<()>;

    /// Delete local tag `name`
    fn delete_tag(&self, name: &str) -> Result<()>;

    /// Push `refspecs` to `remote` atomically
    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()>;

    /// Whether `remote` has branch `name`
    fn remote_branch_exists(&self, remote: &str, name: &str) -> Result<bool>;

    /// Delete branch `name` on `remote`
    fn delete_remote_branch(&self, remote: &str, name: &str) -> Result<()>;
}
