//! Posting review requests for story branches

use super::{Workflow, actions};
use crate::action::ActionChain;
use crate::error::{Error, Result};
use crate::git::story_ids;
use crate::tracker::label_stories;
use crate::types::{PullRequest, Story};
use std::fmt::Write;

/// Outcome of `review post`
#[derive(Debug, Clone)]
pub struct PostedReview {
    /// The open review request for the branch
    pub pull_request: PullRequest,
    /// Whether this run opened it
    pub created: bool,
    /// Referenced stories, labelled implemented
    pub stories: Vec<Story>,
}

impl Workflow {
    /// Push the current branch and open a review request against trunk
    pub async fn post_review(&self, draft: bool) -> Result<PostedReview> {
        let mut chain = ActionChain::new();
        let result = self.post_review_steps(draft, &mut chain).await;
        chain.rollback_on_error(result).await
    }

    async fn post_review_steps(
        &self,
        draft: bool,
        chain: &mut ActionChain,
    ) -> Result<PostedReview> {
        let review = self
            .review
            .clone()
            .ok_or_else(|| Error::Config("no code review tool configured".to_string()))?;
        let settings = &self.settings;

        let branch = self.git.current_branch()?;
        if branch == settings.trunk || branch == "HEAD" {
            return Err(Error::Story(format!(
                "cannot post a review request from {branch}"
            )));
        }
        let messages = self
            .git
            .commit_messages(&format!("{}..{branch}", settings.trunk))?;
        if messages.is_empty() {
            return Err(Error::Story(format!(
                "{branch} has no commits on top of {}",
                settings.trunk
            )));
        }
        let ids = story_ids(&messages);
        let stories = if ids.is_empty() {
            Vec::new()
        } else {
            self.tracker.stories_by_ids(&ids).await?
        };

        let existed = self.git.remote_branch_exists(&settings.remote, &branch)?;
        self.step(&format!("Push {branch} to {}", settings.remote), async {
            self.git.push(&settings.remote, &[branch.clone()])
        })
        .await?;
        if !existed {
            chain.push(actions::delete_remote_branch(&self.git, &settings.remote, &branch));
        }

        let (pull_request, created) = match review.find_review_request(&branch).await? {
            Some(pr) => {
                self.progress
                    .on_message(&format!("Review request already open: {}", pr.html_url))
                    .await;
                (pr, false)
            }
            None => {
                let title = review_title(&stories, &messages);
                let body = review_body(&stories);
                let pr = self
                    .step(&format!("Open review request for {branch}"), async {
                        review
                            .post_review_request(
                                &branch,
                                &settings.trunk,
                                &title,
                                body.as_deref(),
                                draft,
                            )
                            .await
                    })
                    .await?;
                chain.push(actions::close_review_request(&review, pr.number));
                (pr, true)
            }
        };

        let label = self.tracker.labels().implemented.clone();
        let labelled = self
            .step(
                &format!("Label {} stories {label}", stories.len()),
                label_stories(&self.tracker, &self.bulk, stories, &label),
            )
            .await?;
        chain.push(labelled.action);

        Ok(PostedReview {
            pull_request,
            created,
            stories: labelled.updated,
        })
    }
}

/// Title of a new review request: the story title when there is exactly one
/// story, else the subject of the branch's first commit
fn review_title(stories: &[Story], messages: &[String]) -> String {
    if let [story] = stories {
        return story.title.clone();
    }
    messages
        .last()
        .and_then(|message| message.lines().next())
        .unwrap_or_default()
        .to_string()
}

fn review_body(stories: &[Story]) -> Option<String> {
    if stories.is_empty() {
        return None;
    }
    let mut body = String::from("Stories:\n");
    for story in stories {
        let _ = writeln!(body, "- [#{}]({}) {}", story.id, story.url, story.title);
    }
    Some(body)
}
