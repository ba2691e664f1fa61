//! GitHub issue tracker implementation

use crate::error::{Error, Result};
use crate::tracker::{IssueTracker, WorkflowLabels};
use crate::types::{Milestone, Platform, Story};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Page size for list endpoints
const PER_PAGE: usize = 100;

#[derive(Deserialize)]
struct Issue {
    number: u64,
    title: String,
    html_url: String,
    state: String, // "open", "closed"
    #[serde(default)]
    labels: Vec<Label>,
    /// Present when the "issue" is really a pull request
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Label {
    name: String,
}

#[derive(Deserialize)]
struct GitHubMilestone {
    number: u64,
    title: String,
    state: String, // "open", "closed"
}

#[derive(Serialize)]
struct AddLabelsPayload<'a> {
    labels: [&'a str; 1],
}

impl From<Issue> for Story {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.number.to_string(),
            title: issue.title,
            url: issue.html_url,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            open: issue.state == "open",
        }
    }
}

impl From<GitHubMilestone> for Milestone {
    fn from(m: GitHubMilestone) -> Self {
        Self {
            id: m.number,
            title: m.title,
            open: m.state == "open",
        }
    }
}

/// GitHub Issues tracker using the REST API
pub struct GitHubTracker {
    client: Client,
    token: String,
    api_base: String,
    owner: String,
    repo: String,
    labels: WorkflowLabels,
}

impl GitHubTracker {
    /// Create a new GitHub tracker
    pub fn new(
        token: String,
        owner: String,
        repo: String,
        host: Option<String>,
        labels: WorkflowLabels,
    ) -> Result<Self> {
        let api_base = host.map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );

        let client = Client::builder()
            .user_agent("relflow")
            .build()
            .map_err(|e| Error::GitHubApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            api_base,
            owner,
            repo,
            labels,
        })
    }

    /// Point the tracker at a different API root
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!(
            "{}/repos/{}/{}{path}",
            self.api_base, self.owner, self.repo
        );
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!("{status}: {body}")));
        }
        Ok(response.json().await?)
    }

    async fn get_issue(&self, id: &str) -> Result<Story> {
        debug!(id, "fetching issue");
        let response = self
            .request(Method::GET, &format!("/issues/{id}"))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::StoryNotFound(format!("#{id}")));
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!("{status}: {body}")));
        }
        let issue: Issue = response.json().await?;
        Ok(issue.into())
    }
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    fn labels(&self) -> &WorkflowLabels {
        &self.labels
    }

    async fn stories_by_ids(&self, ids: &[String]) -> Result<Vec<Story>> {
        let mut stories = Vec::with_capacity(ids.len());
        for id in ids {
            stories.push(self.get_issue(id).await?);
        }
        Ok(stories)
    }

    async fn release_stories(&self, version: &str) -> Result<Vec<Story>> {
        let label = self.labels.release_label(&version);
        debug!(label, "listing release issues");

        let mut stories = Vec::new();
        for page in 1.. {
            let issues: Vec<Issue> = Self::send(
                self.request(Method::GET, "/issues").query(&[
                    ("labels", label.as_str()),
                    ("state", "all"),
                    ("per_page", &PER_PAGE.to_string()),
                    ("page", &page.to_string()),
                ]),
            )
            .await?;
            let count = issues.len();
            stories.extend(
                issues
                    .into_iter()
                    .filter(|i| i.pull_request.is_none())
                    .map(Story::from),
            );
            if count < PER_PAGE {
                break;
            }
        }

        debug!(count = stories.len(), "found release issues");
        Ok(stories)
    }

    async fn add_label(&self, mut story: Story, label: &str) -> Result<Option<Story>> {
        if story.has_label(label) {
            return Ok(None);
        }
        debug!(story = %story, label, "adding label");
        let labels: Vec<Label> = Self::send(
            self.request(Method::POST, &format!("/issues/{}/labels", story.id))
                .json(&AddLabelsPayload { labels: [label] }),
        )
        .await?;
        story.labels = labels.into_iter().map(|l| l.name).collect();
        Ok(Some(story))
    }

    async fn remove_label(&self, mut story: Story, label: &str) -> Result<Option<Story>> {
        if !story.has_label(label) {
            return Ok(None);
        }
        debug!(story = %story, label, "removing label");
        let path = format!(
            "/issues/{}/labels/{}",
            story.id,
            urlencoding::encode(label)
        );
        let response = self.request(Method::DELETE, &path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(story = %story, label, "label already gone");
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!("{status}: {body}")));
        }
        story.labels.retain(|l| l != label);
        Ok(Some(story))
    }

    async fn find_milestone(&self, title: &str) -> Result<Option<Milestone>> {
        debug!(title, "finding milestone");
        let milestones: Vec<GitHubMilestone> = Self::send(
            self.request(Method::GET, "/milestones")
                .query(&[("state", "all"), ("per_page", "100")]),
        )
        .await?;
        Ok(milestones
            .into_iter()
            .find(|m| m.title == title)
            .map(Milestone::from))
    }

    async fn create_milestone(&self, title: &str) -> Result<Milestone> {
        debug!(title, "creating milestone");
        let milestone: GitHubMilestone = Self::send(
            self.request(Method::POST, "/milestones")
                .json(&serde_json::json!({ "title": title })),
        )
        .await?;
        Ok(milestone.into())
    }

    async fn delete_milestone(&self, milestone: &Milestone) -> Result<()> {
        debug!(id = milestone.id, "deleting milestone");
        let response = self
            .request(Method::DELETE, &format!("/milestones/{}", milestone.id))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!("{status}: {body}")));
        }
        Ok(())
    }

    async fn set_milestone_open(
        &self,
        milestone: Milestone,
        open: bool,
    ) -> Result<Option<Milestone>> {
        if milestone.open == open {
            return Ok(None);
        }
        let state = if open { "open" } else { "closed" };
        debug!(id = milestone.id, state, "updating milestone");
        let updated: GitHubMilestone = Self::send(
            self.request(Method::PATCH, &format!("/milestones/{}", milestone.id))
                .json(&serde_json::json!({ "state": state })),
        )
        .await?;
        Ok(Some(updated.into()))
    }
}
