//! Core types for relflow

use serde::{Deserialize, Serialize};

/// A story (issue) as seen by an issue tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Tracker-side identifier (issue number / iid)
    pub id: String,
    /// Issue title
    pub title: String,
    /// Web URL
    pub url: String,
    /// Labels currently attached
    pub labels: Vec<String>,
    /// Whether the issue is open
    pub open: bool,
}

impl Story {
    /// Whether `label` is attached
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Whether any of `labels` is attached
    pub fn has_any_label(&self, labels: &[String]) -> bool {
        labels.iter().any(|l| self.has_label(l))
    }
}

impl std::fmt::Display for Story {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// Tracker-side release object (GitHub/GitLab milestone)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Milestone number (GitHub) or id (GitLab)
    pub id: u64,
    /// Title, equal to the release version
    pub title: String,
    /// Whether the milestone is open
    pub open: bool,
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "milestone {}", self.title)
    }
}

/// A review request (pull request / merge request)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR/MR number
    pub number: u64,
    /// Web URL for the PR/MR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// PR/MR title
    pub title: String,
    /// Whether the PR is a draft
    pub is_draft: bool,
}

/// Supported hosting platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// GitHub or GitHub Enterprise
    GitHub,
    /// GitLab or self-hosted GitLab
    GitLab,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitHub => write!(f, "GitHub"),
            Self::GitLab => write!(f, "GitLab"),
        }
    }
}

/// Where a tracker or review tool lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Platform type
    #[serde(rename = "kind")]
    pub platform: Platform,
    /// Repository owner (user, organization or group path)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com/gitlab.com)
    #[serde(default)]
    pub host: Option<String>,
}
