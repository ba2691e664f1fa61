//! GitLab merge request review tool

use crate::error::{Error, Result};
use crate::review::CodeReviewTool;
use crate::types::{Platform, PullRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct MergeRequest {
    iid: u64,
    web_url: String,
    source_branch: String,
    target_branch: String,
    title: String,
    #[serde(default)]
    draft: bool,
}

impl From<MergeRequest> for PullRequest {
    fn from(mr: MergeRequest) -> Self {
        Self {
            number: mr.iid,
            html_url: mr.web_url,
            base_ref: mr.target_branch,
            head_ref: mr.source_branch,
            title: mr.title,
            is_draft: mr.draft,
        }
    }
}

#[derive(Serialize)]
struct CreateMrPayload<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// GitLab review tool using reqwest
pub struct GitLabReviewTool {
    client: Client,
    token: String,
    api_base: String,
    project_path: String,
}

impl GitLabReviewTool {
    /// Create a new GitLab review tool
    pub fn new(token: String, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let host = host.unwrap_or_else(|| "gitlab.com".to_string());

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::GitLabApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            api_base: format!("https://{host}/api/v4"),
            project_path: format!("{owner}/{repo}"),
        })
    }

    /// Point the tool at a different API root
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn mr_url(&self, suffix: &str) -> String {
        format!(
            "{}/projects/{}/merge_requests{suffix}",
            self.api_base,
            urlencoding::encode(&self.project_path)
        )
    }
}

#[async_trait]
impl CodeReviewTool for GitLabReviewTool {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    async fn find_review_request(&self, head: &str) -> Result<Option<PullRequest>> {
        debug!(head, "finding existing MR");
        let mrs: Vec<MergeRequest> = self
            .client
            .get(self.mr_url(""))
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[("source_branch", head), ("state", "opened")])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(mrs.into_iter().next().map(Into::into))
    }

    async fn post_review_request(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest> {
        debug!(head, base, draft, "creating MR");
        // GitLab marks drafts through the title prefix
        let title = if draft {
            format!("Draft: {title}")
        } else {
            title.to_string()
        };
        let payload = CreateMrPayload {
            source_branch: head,
            target_branch: base,
            title,
            description: body,
        };

        let mr: MergeRequest = self
            .client
            .post(self.mr_url(""))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(mr.into())
    }

    async fn close_review_request(&self, number: u64) -> Result<()> {
        debug!(mr_iid = number, "closing MR");
        self.client
            .put(self.mr_url(&format!("/{number}")))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&serde_json::json!({ "state_event": "close" }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?;
        Ok(())
    }
}
