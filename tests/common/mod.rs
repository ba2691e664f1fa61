//! Shared test utilities

#![allow(dead_code)]

mod mock_git;
mod mock_review;
mod mock_tracker;

pub use mock_git::MockGit;
pub use mock_review::{MockReviewTool, PostReviewCall};
pub use mock_tracker::{LabelCall, MockTracker};

use relflow::types::Story;
use relflow::workflow::{Settings, Workflow};
use std::sync::Arc;

/// Story with the given labels, open
pub fn make_story(id: &str, title: &str, labels: &[&str]) -> Story {
    Story {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://github.com/acme/app/issues/{id}"),
        labels: labels.iter().map(ToString::to_string).collect(),
        open: true,
    }
}

/// Closed story with the given labels
pub fn make_closed_story(id: &str, title: &str, labels: &[&str]) -> Story {
    Story {
        open: false,
        ..make_story(id, title, labels)
    }
}

/// Workflow over the mocks with default settings
pub fn make_workflow(git: &Arc<MockGit>, tracker: &Arc<MockTracker>) -> Workflow {
    Workflow::new(git.clone(), tracker.clone(), Settings::default())
}
