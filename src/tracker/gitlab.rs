//! GitLab issue tracker implementation

use crate::error::{Error, Result};
use crate::tracker::{IssueTracker, WorkflowLabels};
use crate::types::{Milestone, Platform, Story};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for list endpoints
const PER_PAGE: usize = 100;

#[derive(Deserialize)]
struct GitLabIssue {
    iid: u64,
    title: String,
    web_url: String,
    state: String, // "opened", "closed"
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Deserialize)]
struct GitLabMilestone {
    id: u64,
    title: String,
    state: String, // "active", "closed"
}

#[derive(Serialize)]
struct EditIssuePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    add_labels: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remove_labels: Option<&'a str>,
}

impl From<GitLabIssue> for Story {
    fn from(issue: GitLabIssue) -> Self {
        Self {
            id: issue.iid.to_string(),
            title: issue.title,
            url: issue.web_url,
            labels: issue.labels,
            open: issue.state == "opened",
        }
    }
}

impl From<GitLabMilestone> for Milestone {
    fn from(m: GitLabMilestone) -> Self {
        Self {
            id: m.id,
            title: m.title,
            open: m.state == "active",
        }
    }
}

/// GitLab issues tracker using the REST API
pub struct GitLabTracker {
    client: Client,
    token: String,
    api_base: String,
    project_path: String,
    labels: WorkflowLabels,
}

impl GitLabTracker {
    /// Create a new GitLab tracker
    pub fn new(
        token: String,
        owner: String,
        repo: String,
        host: Option<String>,
        labels: WorkflowLabels,
    ) -> Result<Self> {
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
            "{}/projects/{}{path}",
            self.api_base,
            urlencoding::encode(&self.project_path)
        );
        self.client
            .request(method, url)
            .header("PRIVATE-TOKEN", &self.token)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        Ok(request
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?)
    }

    async fn edit_labels(&self, story: &Story, payload: &EditIssuePayload<'_>) -> Result<Story> {
        let issue: GitLabIssue = Self::send(
            self.request(Method::PUT, &format!("/issues/{}", story.id))
                .json(payload),
        )
        .await?;
        Ok(issue.into())
    }
}

#[async_trait]
impl IssueTracker for GitLabTracker {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    fn labels(&self) -> &WorkflowLabels {
        &self.labels
    }

    async fn stories_by_ids(&self, ids: &[String]) -> Result<Vec<Story>> {
        let mut stories = Vec::with_capacity(ids.len());
        for id in ids {
            debug!(id, "fetching issue");
            let response = self
                .request(Method::GET, &format!("/issues/{id}"))
                .send()
                .await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Err(Error::StoryNotFound(format!("#{id}")));
            }
            let issue: GitLabIssue = response
                .error_for_status()
                .map_err(|e| Error::GitLabApi(e.to_string()))?
                .json()
                .await?;
            stories.push(issue.into());
        }
        Ok(stories)
    }

    async fn release_stories(&self, version: &str) -> Result<Vec<Story>> {
        let label = self.labels.release_label(&version);
        debug!(label, "listing release issues");

        let mut stories = Vec::new();
        for page in 1.. {
            let issues: Vec<GitLabIssue> = Self::send(
                self.request(Method::GET, "/issues").query(&[
                    ("labels", label.as_str()),
                    ("scope", "all"),
                    ("per_page", &PER_PAGE.to_string()),
                    ("page", &page.to_string()),
                ]),
            )
            .await?;
            let count = issues.len();
            stories.extend(issues.into_iter().map(Story::from));
            if count < PER_PAGE {
                break;
            }
        }
        Ok(stories)
    }

    async fn add_label(&self, story: Story, label: &str) -> Result<Option<Story>> {
        if story.has_label(label) {
            return Ok(None);
        }
        debug!(story = %story, label, "adding label");
        let payload = EditIssuePayload {
            add_labels: Some(label),
            remove_labels: None,
        };
        self.edit_labels(&story, &payload).await.map(Some)
    }

    async fn remove_label(&self, story: Story, label: &str) -> Result<Option<Story>> {
        if !story.has_label(label) {
            return Ok(None);
        }
        debug!(story = %story, label, "removing label");
        let payload = EditIssuePayload {
            add_labels: None,
            remove_labels: Some(label),
        };
        self.edit_labels(&story, &payload).await.map(Some)
    }

    async fn find_milestone(&self, title: &str) -> Result<Option<Milestone>> {
        debug!(title, "finding milestone");
        let milestones: Vec<GitLabMilestone> = Self::send(
            self.request(Method::GET, "/milestones")
                .query(&[("title", title)]),
        )
        .await?;
        Ok(milestones.into_iter().next().map(Milestone::from))
    }

    async fn create_milestone(&self, title: &str) -> Result<Milestone> {
        debug!(title, "creating milestone");
        let milestone: GitLabMilestone = Self::send(
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
        if response.status() != StatusCode::NOT_FOUND {
            response
                .error_for_status()
                .map_err(|e| Error::GitLabApi(e.to_string()))?;
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
        let state_event = if open { "activate" } else { "close" };
        debug!(id = milestone.id, state_event, "updating milestone");
        let updated: GitLabMilestone = Self::send(
            self.request(Method::PUT, &format!("/milestones/{}", milestone.id))
                .json(&serde_json::json!({ "state_event": state_event })),
        )
        .await?;
        Ok(Some(updated.into()))
    }
}
