//! GitHub pull request review tool

use crate::error::{Error, Result};
use crate::review::CodeReviewTool;
use crate::types::{Platform, PullRequest};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::Client;
use tracing::debug;

/// GitHub review tool using octocrab
pub struct GitHubReviewTool {
    client: Octocrab,
    owner: String,
    repo: String,
    /// Token for raw HTTP requests (closing PRs)
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// API host for raw requests
    api_host: String,
}

impl GitHubReviewTool {
    /// Create a new GitHub review tool
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        let api_host = if let Some(ref h) = host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
            format!("{h}/api/v3")
        } else {
            "api.github.com".to_string()
        };

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("relflow")
            .build()
            .map_err(|e| Error::GitHubApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            owner,
            repo,
            token: token.to_string(),
            http_client,
            api_host,
        })
    }
}

/// Convert an octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        is_draft: pr.draft.unwrap_or(false),
    }
}

#[async_trait]
impl CodeReviewTool for GitHubReviewTool {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    async fn find_review_request(&self, head: &str) -> Result<Option<PullRequest>> {
        debug!(head, "finding existing PR");
        let prs = self
            .client
            .pulls(&self.owner, &self.repo)
            .list()
            .head(format!("{}:{head}", self.owner))
            .state(octocrab::params::State::Open)
            .send()
            .await?;
        Ok(prs.items.first().map(pr_from_octocrab))
    }

    async fn post_review_request(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest> {
        debug!(head, base, draft, "creating PR");
        let pulls = self.client.pulls(&self.owner, &self.repo);
        let mut builder = pulls.create(title, head, base).draft(draft);

        if let Some(body_text) = body {
            builder = builder.body(body_text);
        }

        let pr = builder.send().await?;
        let result = pr_from_octocrab(&pr);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn close_review_request(&self, number: u64) -> Result<()> {
        debug!(pr_number = number, "closing PR");
        let url = format!(
            "https://{}/repos/{}/{}/pulls/{number}",
            self.api_host, self.owner, self.repo
        );
        self.http_client
            .patch(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(&serde_json::json!({ "state": "closed" }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitHubApi(format!("failed to close PR #{number}: {e}")))?;
        Ok(())
    }
}
