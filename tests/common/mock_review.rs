//! Mock code review tool

use async_trait::async_trait;
use relflow::error::{Error, Result};
use relflow::review::CodeReviewTool;
use relflow::types::{Platform, PullRequest};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `post_review_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReviewCall {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: Option<String>,
    pub draft: bool,
}

/// Mock review tool with auto-incrementing request numbers
pub struct MockReviewTool {
    next_number: AtomicU64,
    find_responses: Mutex<HashMap<String, PullRequest>>,
    post_calls: Mutex<Vec<PostReviewCall>>,
    close_calls: Mutex<Vec<u64>>,
    error_on_post: Mutex<Option<String>>,
}

impl Default for MockReviewTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReviewTool {
    pub fn new() -> Self {
        Self {
            next_number: AtomicU64::new(1),
            find_responses: Mutex::new(HashMap::new()),
            post_calls: Mutex::new(Vec::new()),
            close_calls: Mutex::new(Vec::new()),
            error_on_post: Mutex::new(None),
        }
    }

    /// Make `find_review_request` return `pr` for its head branch
    pub fn set_existing(&self, pr: PullRequest) {
        self.find_responses
            .lock()
            .unwrap()
            .insert(pr.head_ref.clone(), pr);
    }

    /// Make `post_review_request` return an error
    pub fn fail_post(&self, msg: &str) {
        *self.error_on_post.lock().unwrap() = Some(msg.to_string());
    }

    pub fn get_post_calls(&self) -> Vec<PostReviewCall> {
        self.post_calls.lock().unwrap().clone()
    }

    pub fn get_close_calls(&self) -> Vec<u64> {
        self.close_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeReviewTool for MockReviewTool {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    async fn find_review_request(&self, head: &str) -> Result<Option<PullRequest>> {
        Ok(self.find_responses.lock().unwrap().get(head).cloned())
    }

    async fn post_review_request(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest> {
        self.post_calls.lock().unwrap().push(PostReviewCall {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.map(ToString::to_string),
            draft,
        });
        if let Some(msg) = self.error_on_post.lock().unwrap().clone() {
            return Err(Error::GitHubApi(msg));
        }
        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequest {
            number,
            html_url: format!("https://github.com/acme/app/pull/{number}"),
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            title: title.to_string(),
            is_draft: draft,
        })
    }

    async fn close_review_request(&self, number: u64) -> Result<()> {
        self.close_calls.lock().unwrap().push(number);
        Ok(())
    }
}
