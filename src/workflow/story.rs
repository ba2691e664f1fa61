//! Starting work on a story

use super::{Workflow, actions};
use crate::action::ActionChain;
use crate::error::{Error, Result};
use crate::tracker::{StoryState, label_stories};
use crate::types::Story;

/// Longest slug appended to story branch names
const MAX_SLUG_LEN: usize = 40;

/// Outcome of `story start`
#[derive(Debug, Clone)]
pub struct StartedStory {
    /// The story, labelled being-implemented
    pub story: Story,
    /// Story branch, now checked out
    pub branch: String,
    /// Whether the branch was created by this run
    pub created: bool,
}

/// Branch-name-safe slug of a story title
///
/// Lowercase ASCII alphanumerics separated by single dashes.
pub fn branch_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
    }
    slug.trim_end_matches('-').to_string()
}

impl Workflow {
    /// Start implementing story `id`
    ///
    /// Creates and checks out the story branch, then labels the story
    /// being-implemented.
    pub async fn start_story(&self, id: &str) -> Result<StartedStory> {
        let mut chain = ActionChain::new();
        let result = self.start_story_steps(id, &mut chain).await;
        chain.rollback_on_error(result).await
    }

    async fn start_story_steps(&self, id: &str, chain: &mut ActionChain) -> Result<StartedStory> {
        let id = id.trim_start_matches('#');
        let story = self
            .tracker
            .stories_by_ids(&[id.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::StoryNotFound(format!("#{id}")))?;

        let state = self.tracker.abstract_state(&story);
        if state > StoryState::BeingImplemented {
            return Err(Error::Story(format!(
                "story {story} is {state} and cannot be started"
            )));
        }
        if !self.git.is_clean()? {
            return Err(Error::Story(
                "working tree has uncommitted changes".to_string(),
            ));
        }

        let slug = branch_slug(&story.title);
        let branch = if slug.is_empty() {
            format!("{}{}", self.settings.story_prefix, story.id)
        } else {
            format!("{}{}-{slug}", self.settings.story_prefix, story.id)
        };
        let previous = self.git.current_branch()?;

        let created = !self.git.branch_exists(&branch)?;
        if created {
            let trunk = &self.settings.trunk;
            self.step(&format!("Create branch {branch}"), async {
                self.git.create_branch(&branch, trunk)
            })
            .await?;
            chain.push(actions::delete_branch(&self.git, &branch));
        } else {
            self.progress
                .on_message(&format!("Branch {branch} already exists, reusing it"))
                .await;
        }

        if previous != branch {
            self.step(&format!("Check out {branch}"), async {
                self.git.checkout(&branch)
            })
            .await?;
            chain.push(actions::checkout(&self.git, &previous));
        }

        let label = self.tracker.labels().being_implemented.clone();
        let mut labelled = self
            .step(
                &format!("Label {story} {label}"),
                label_stories(&self.tracker, &self.bulk, vec![story.clone()], &label),
            )
            .await?;
        chain.push(labelled.action);

        Ok(StartedStory {
            story: labelled.updated.pop().unwrap_or(story),
            branch,
            created,
        })
    }
}
