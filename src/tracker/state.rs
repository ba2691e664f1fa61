//! Tracker-agnostic story lifecycle and release gating

use crate::error::{Error, Result};
use crate::types::Story;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Normalized lifecycle stage of a story
///
/// Variants are declared in lifecycle order; the derived ordering is used to
/// decide how far along a story is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoryState {
    /// Freshly created
    New,
    /// Approved for implementation
    Approved,
    /// Someone is working on it
    BeingImplemented,
    /// Implementation finished, review pending
    Implemented,
    /// Code review passed
    Reviewed,
    /// QA passed
    Tested,
    /// Deployed to staging
    Staged,
    /// Accepted by the client
    Accepted,
    /// Rejected by the client
    Rejected,
    /// Closed without further classification
    Closed,
    /// Not a valid story
    Invalid,
}

impl StoryState {
    /// States a story may be in for its release to be staged
    pub const STAGEABLE: [Self; 4] = [Self::Tested, Self::Staged, Self::Accepted, Self::Closed];

    /// Whether the story allows staging its release
    pub fn is_stageable(self) -> bool {
        Self::STAGEABLE.contains(&self)
    }

    /// Whether the story allows closing its release (closed counts as accepted)
    pub const fn is_closable(self) -> bool {
        matches!(self, Self::Accepted | Self::Closed)
    }
}

impl Display for StoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::Approved => "approved",
            Self::BeingImplemented => "being implemented",
            Self::Implemented => "implemented",
            Self::Reviewed => "reviewed",
            Self::Tested => "tested",
            Self::Staged => "staged",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Closed => "closed",
            Self::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

/// Label vocabulary a tracker uses to encode story states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowLabels {
    /// Approved for implementation
    pub approved: String,
    /// Implementation started
    pub being_implemented: String,
    /// Implementation finished
    pub implemented: String,
    /// Review passed
    pub reviewed: String,
    /// QA passed
    pub tested: String,
    /// Deployed to staging
    pub staged: String,
    /// Accepted by the client
    pub accepted: String,
    /// Rejected by the client
    pub rejected: String,
    /// Not a valid story
    pub invalid: String,
    /// Prefix of the per-release label
    pub release_prefix: String,
    /// Labels exempting a story from release gating
    pub skip_check: Vec<String>,
}

impl Default for WorkflowLabels {
    fn default() -> Self {
        Self::plain()
    }
}

impl WorkflowLabels {
    /// Plain label names, used by GitHub
    pub fn plain() -> Self {
        Self::with_prefix("", "release/")
    }

    /// Scoped label names, used by GitLab
    pub fn scoped() -> Self {
        Self::with_prefix("workflow::", "release::")
    }

    fn with_prefix(prefix: &str, release_prefix: &str) -> Self {
        let label = |name: &str| format!("{prefix}{name}");
        Self {
            approved: label("approved"),
            being_implemented: label("being-implemented"),
            implemented: label("implemented"),
            reviewed: label("reviewed"),
            tested: label("tested"),
            staged: label("staged"),
            accepted: label("accepted"),
            rejected: label("rejected"),
            invalid: label("invalid"),
            release_prefix: release_prefix.to_string(),
            skip_check: vec!["no-release-check".to_string()],
        }
    }

    /// Label marking membership in release `version`
    pub fn release_label(&self, version: &impl Display) -> String {
        format!("{}{version}", self.release_prefix)
    }

    /// Label encoding `state`, if the state has one
    pub fn label_for(&self, state: StoryState) -> Option<&str> {
        let label = match state {
            StoryState::Approved => &self.approved,
            StoryState::BeingImplemented => &self.being_implemented,
            StoryState::Implemented => &self.implemented,
            StoryState::Reviewed => &self.reviewed,
            StoryState::Tested => &self.tested,
            StoryState::Staged => &self.staged,
            StoryState::Accepted => &self.accepted,
            StoryState::Rejected => &self.rejected,
            StoryState::Invalid => &self.invalid,
            StoryState::New | StoryState::Closed => return None,
        };
        Some(label)
    }

    /// Map labels and open/closed status onto a state
    ///
    /// The highest-ranked workflow label wins. A closed issue without a
    /// terminal label is `Closed`. Pure; safe to call from anywhere.
    pub fn state_of(&self, story: &Story) -> StoryState {
        let labelled = [
            StoryState::Invalid,
            StoryState::Rejected,
            StoryState::Accepted,
            StoryState::Staged,
            StoryState::Tested,
            StoryState::Reviewed,
            StoryState::Implemented,
            StoryState::BeingImplemented,
            StoryState::Approved,
        ]
        .into_iter()
        .find(|state| self.label_for(*state).is_some_and(|l| story.has_label(l)));

        match labelled {
            Some(state @ (StoryState::Invalid | StoryState::Rejected | StoryState::Accepted)) => {
                state
            }
            _ if !story.open => StoryState::Closed,
            Some(state) => state,
            None => StoryState::New,
        }
    }
}

/// A story blocking a release transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockingStory {
    /// Story identifier
    pub id: String,
    /// Web URL
    pub url: String,
    /// Current abstract state
    pub state: StoryState,
}

/// Every story blocking a release transition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateReport {
    /// One row per blocking story
    pub rows: Vec<BlockingStory>,
}

impl Display for StateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id_width = self.rows.iter().map(|r| r.id.len() + 1).max().unwrap_or(0);
        let state_width = self
            .rows
            .iter()
            .map(|r| r.state.to_string().len())
            .max()
            .unwrap_or(0);
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let id = format!("#{}", row.id);
            let state = row.state.to_string();
            write!(f, "  {id:<id_width$}  {state:<state_width$}  {}", row.url)?;
        }
        Ok(())
    }
}

/// Collect stories whose state fails `allowed`, ignoring skip-labelled ones
pub fn blocking_stories(
    stories: &[Story],
    state_of: impl Fn(&Story) -> StoryState,
    allowed: impl Fn(StoryState) -> bool,
    skip_labels: &[String],
) -> StateReport {
    let rows = stories
        .iter()
        .filter(|story| !story.has_any_label(skip_labels))
        .filter_map(|story| {
            let state = state_of(story);
            (!allowed(state)).then(|| BlockingStory {
                id: story.id.clone(),
                url: story.url.clone(),
                state,
            })
        })
        .collect();
    StateReport { rows }
}

/// Fail unless every story allows staging
pub fn ensure_stageable(
    version: &impl Display,
    stories: &[Story],
    state_of: impl Fn(&Story) -> StoryState,
    skip_labels: &[String],
) -> Result<()> {
    let report = blocking_stories(stories, state_of, StoryState::is_stageable, skip_labels);
    if report.rows.is_empty() {
        Ok(())
    } else {
        Err(Error::NotReady {
            operation: "stage",
            version: version.to_string(),
            report,
        })
    }
}

/// Fail unless every story is accepted
pub fn ensure_closable(
    version: &impl Display,
    stories: &[Story],
    state_of: impl Fn(&Story) -> StoryState,
    skip_labels: &[String],
) -> Result<()> {
    let report = blocking_stories(stories, state_of, StoryState::is_closable, skip_labels);
    if report.rows.is_empty() {
        Ok(())
    } else {
        Err(Error::NotReady {
            operation: "close",
            version: version.to_string(),
            report,
        })
    }
}
