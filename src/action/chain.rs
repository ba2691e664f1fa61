//! Ordered action sequences with reverse-order rollback

use super::Action;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{info, warn};

/// Growable list of completed actions for a workflow in progress
///
/// Push order is the order in which the effects happened. Rollback walks the
/// list backwards so later effects are undone before the ones they depend on.
/// A chain is itself an [`Action`], so a sub-workflow can push its whole chain
/// onto a parent chain as one entry.
#[derive(Default)]
pub struct ActionChain {
    actions: Vec<Box<dyn Action>>,
}

impl ActionChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed step
    pub fn push<A: Action + 'static>(&mut self, action: A) {
        self.actions.push(Box::new(action));
    }

    /// Number of recorded steps
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Finish a workflow: roll back every step if `result` is an error
    ///
    /// Call this once at the end of a workflow with the workflow's result.
    /// `Ok` passes through untouched. On `Err` every recorded action is rolled
    /// back, most recent first; a failing rollback does not stop the unwind.
    /// The original error is returned, wrapped in
    /// [`Error::RollbackIncomplete`] when any rollback failed.
    pub async fn rollback_on_error<T>(self, result: Result<T>) -> Result<T> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if self.is_empty() {
            return Err(err);
        }

        warn!(error = %err, steps = self.len(), "workflow failed, rolling back");
        let failures = self.unwind().await;
        if failures.is_empty() {
            info!(steps = self.len(), "rollback complete");
            Err(err)
        } else {
            Err(Error::RollbackIncomplete {
                cause: Box::new(err),
                failures,
            })
        }
    }

    async fn unwind(&self) -> Vec<String> {
        let mut failures = Vec::new();
        for action in self.actions.iter().rev() {
            if let Err(e) = action.rollback().await {
                failures.push(e.to_string());
            }
        }
        failures
    }
}

impl std::fmt::Debug for ActionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionChain")
            .field("steps", &self.actions.len())
            .finish()
    }
}

#[async_trait]
impl Action for ActionChain {
    async fn rollback(&self) -> Result<()> {
        let failures = self.unwind().await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::ChainRollback(failures))
        }
    }
}
