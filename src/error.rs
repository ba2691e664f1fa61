//! Error types for relflow

use crate::bulk::BatchReport;
use crate::tracker::StateReport;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by relflow operations
#[derive(Debug, Error)]
pub enum Error {
    /// A git command failed
    #[error("git error: {0}")]
    Git(String),

    /// GitHub API call failed
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// GitLab API call failed
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration missing or malformed
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// Version string could not be parsed
    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    /// Release precondition violated (branch exists, dirty worktree, ...)
    #[error("release error: {0}")]
    Release(String),

    /// Story lookup failed
    #[error("story not found: {0}")]
    StoryNotFound(String),

    /// Story-level precondition violated
    #[error("story error: {0}")]
    Story(String),

    /// Stories block the requested transition
    #[error("cannot {operation} release {version}, blocking stories:\n{report}")]
    NotReady {
        /// Operation that was attempted ("stage", "close")
        operation: &'static str,
        /// Release version
        version: String,
        /// One row per blocking story
        report: StateReport,
    },

    /// Some items of a bulk update failed
    #[error("batch update failed\n{0}")]
    Batch(BatchReport),

    /// Rolling back a single action failed
    #[error("rollback of '{task}' failed: {cause}")]
    Rollback {
        /// Task whose effect could not be reversed
        task: String,
        /// Underlying failure
        cause: Box<Error>,
    },

    /// A nested chain could not be fully rolled back
    #[error("{} rollback step(s) failed:{}", .0.len(), bullet_list(.0))]
    ChainRollback(Vec<String>),

    /// The workflow failed and its rollback left effects behind
    #[error("{cause}\nrollback incomplete, manual repair may be needed:{}", bullet_list(.failures))]
    RollbackIncomplete {
        /// The error that triggered the rollback
        cause: Box<Error>,
        /// Every rollback failure, most recent action first
        failures: Vec<String>,
    },

    /// The operator declined to continue
    #[error("operation cancelled")]
    Cancelled,

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<octocrab::Error> for Error {
    fn from(e: octocrab::Error) -> Self {
        Self::GitHubApi(e.to_string())
    }
}

impl Error {
    /// The error that started a failed workflow, looking through rollback wrappers.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::RollbackIncomplete { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("\n  - {}", item.replace('\n', "\n    ")))
        .collect()
}
