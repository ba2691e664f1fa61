//! Mock issue tracker for workflow tests

use async_trait::async_trait;
use relflow::error::{Error, Result};
use relflow::tracker::{IssueTracker, WorkflowLabels};
use relflow::types::{Milestone, Platform, Story};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `add_label` / `remove_label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCall {
    pub story: String,
    pub label: String,
}

impl LabelCall {
    pub fn new(story: &str, label: &str) -> Self {
        Self {
            story: story.to_string(),
            label: label.to_string(),
        }
    }
}

/// In-memory issue tracker using the plain (GitHub) label vocabulary
///
/// Features:
/// - Stories and milestones kept in memory, mutated by the label calls
/// - Call tracking for verification
/// - Error injection per story for label calls
pub struct MockTracker {
    labels: WorkflowLabels,
    next_milestone_id: AtomicU64,
    stories: Mutex<BTreeMap<String, Story>>,
    milestones: Mutex<BTreeMap<String, Milestone>>,
    // Call tracking
    add_label_calls: Mutex<Vec<LabelCall>>,
    remove_label_calls: Mutex<Vec<LabelCall>>,
    created_milestones: Mutex<Vec<String>>,
    deleted_milestones: Mutex<Vec<String>>,
    // Error injection
    error_on_add_label: Mutex<HashMap<String, String>>,
    error_on_remove_label: Mutex<HashMap<String, String>>,
    error_on_set_milestone: Mutex<Option<String>>,
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTracker {
    pub fn new() -> Self {
        Self {
            labels: WorkflowLabels::plain(),
            next_milestone_id: AtomicU64::new(1),
            stories: Mutex::new(BTreeMap::new()),
            milestones: Mutex::new(BTreeMap::new()),
            add_label_calls: Mutex::new(Vec::new()),
            remove_label_calls: Mutex::new(Vec::new()),
            created_milestones: Mutex::new(Vec::new()),
            deleted_milestones: Mutex::new(Vec::new()),
            error_on_add_label: Mutex::new(HashMap::new()),
            error_on_remove_label: Mutex::new(HashMap::new()),
            error_on_set_milestone: Mutex::new(None),
        }
    }

    // === Setup ===

    pub fn add_story(&self, story: Story) {
        self.stories.lock().unwrap().insert(story.id.clone(), story);
    }

    pub fn add_milestone(&self, title: &str, open: bool) -> Milestone {
        let milestone = Milestone {
            id: self.next_milestone_id.fetch_add(1, Ordering::SeqCst),
            title: title.to_string(),
            open,
        };
        self.milestones
            .lock()
            .unwrap()
            .insert(title.to_string(), milestone.clone());
        milestone
    }

    // === Error injection ===

    /// Make `add_label` fail for story `id`
    pub fn fail_add_label(&self, id: &str, msg: &str) {
        self.error_on_add_label
            .lock()
            .unwrap()
            .insert(id.to_string(), msg.to_string());
    }

    /// Make `remove_label` fail for story `id`
    pub fn fail_remove_label(&self, id: &str, msg: &str) {
        self.error_on_remove_label
            .lock()
            .unwrap()
            .insert(id.to_string(), msg.to_string());
    }

    /// Make `set_milestone_open` fail
    pub fn fail_set_milestone(&self, msg: &str) {
        *self.error_on_set_milestone.lock().unwrap() = Some(msg.to_string());
    }

    // === Inspection ===

    pub fn story(&self, id: &str) -> Story {
        self.stories.lock().unwrap()[id].clone()
    }

    pub fn milestone(&self, title: &str) -> Option<Milestone> {
        self.milestones.lock().unwrap().get(title).cloned()
    }

    pub fn get_add_label_calls(&self) -> Vec<LabelCall> {
        self.add_label_calls.lock().unwrap().clone()
    }

    pub fn get_remove_label_calls(&self) -> Vec<LabelCall> {
        self.remove_label_calls.lock().unwrap().clone()
    }

    pub fn get_created_milestones(&self) -> Vec<String> {
        self.created_milestones.lock().unwrap().clone()
    }

    pub fn get_deleted_milestones(&self) -> Vec<String> {
        self.deleted_milestones.lock().unwrap().clone()
    }

    /// Assert no label was added or removed
    pub fn assert_no_label_calls(&self) {
        assert!(self.get_add_label_calls().is_empty(), "unexpected add_label calls");
        assert!(
            self.get_remove_label_calls().is_empty(),
            "unexpected remove_label calls"
        );
    }

    fn stored(&self, story: &Story) -> Result<Story> {
        self.stories
            .lock()
            .unwrap()
            .get(&story.id)
            .cloned()
            .ok_or_else(|| Error::StoryNotFound(format!("#{}", story.id)))
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    fn labels(&self) -> &WorkflowLabels {
        &self.labels
    }

    async fn stories_by_ids(&self, ids: &[String]) -> Result<Vec<Story>> {
        let stories = self.stories.lock().unwrap();
        ids.iter()
            .map(|id| {
                stories
                    .get(id)
                    .cloned()
                    .ok_or_else(|| Error::StoryNotFound(format!("#{id}")))
            })
            .collect()
    }

    async fn release_stories(&self, version: &str) -> Result<Vec<Story>> {
        let label = self.labels.release_label(&version);
        Ok(self
            .stories
            .lock()
            .unwrap()
            .values()
            .filter(|story| story.has_label(&label))
            .cloned()
            .collect())
    }

    async fn add_label(&self, story: Story, label: &str) -> Result<Option<Story>> {
        let mut stored = self.stored(&story)?;
        if stored.has_label(label) {
            return Ok(None);
        }
        self.add_label_calls
            .lock()
            .unwrap()
            .push(LabelCall::new(&story.id, label));
        tokio::task::yield_now().await;
        if let Some(msg) = self.error_on_add_label.lock().unwrap().get(&story.id) {
            return Err(Error::GitHubApi(msg.clone()));
        }
        stored.labels.push(label.to_string());
        self.add_story(stored.clone());
        Ok(Some(stored))
    }

    async fn remove_label(&self, story: Story, label: &str) -> Result<Option<Story>> {
        let mut stored = self.stored(&story)?;
        if !stored.has_label(label) {
            return Ok(None);
        }
        self.remove_label_calls
            .lock()
            .unwrap()
            .push(LabelCall::new(&story.id, label));
        if let Some(msg) = self.error_on_remove_label.lock().unwrap().get(&story.id) {
            return Err(Error::GitHubApi(msg.clone()));
        }
        stored.labels.retain(|l| l != label);
        self.add_story(stored.clone());
        Ok(Some(stored))
    }

    async fn find_milestone(&self, title: &str) -> Result<Option<Milestone>> {
        Ok(self.milestone(title))
    }

    async fn create_milestone(&self, title: &str) -> Result<Milestone> {
        self.created_milestones
            .lock()
            .unwrap()
            .push(title.to_string());
        Ok(self.add_milestone(title, true))
    }

    async fn delete_milestone(&self, milestone: &Milestone) -> Result<()> {
        self.deleted_milestones
            .lock()
            .unwrap()
            .push(milestone.title.clone());
        self.milestones.lock().unwrap().remove(&milestone.title);
        Ok(())
    }

    async fn set_milestone_open(
        &self,
        milestone: Milestone,
        open: bool,
    ) -> Result<Option<Milestone>> {
        if let Some(msg) = self.error_on_set_milestone.lock().unwrap().clone() {
            return Err(Error::GitHubApi(msg));
        }
        let mut milestones = self.milestones.lock().unwrap();
        let Some(stored) = milestones.get_mut(&milestone.title) else {
            return Err(Error::GitHubApi(format!("no {milestone}")));
        };
        if stored.open == open {
            return Ok(None);
        }
        stored.open = open;
        Ok(Some(stored.clone()))
    }
}
