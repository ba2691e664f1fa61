//! Progress reporting for workflow steps

use async_trait::async_trait;

/// Outcome of a workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step started
    Running,
    /// Step finished
    Done,
    /// Step failed
    Failed,
}

/// Receives progress updates while a workflow runs
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// A step changed status
    async fn on_step(&self, step: &str, status: StepStatus);

    /// Free-form informational message
    async fn on_message(&self, message: &str);
}

/// Progress sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_step(&self, _step: &str, _status: StepStatus) {}

    async fn on_message(&self, _message: &str) {}
}
