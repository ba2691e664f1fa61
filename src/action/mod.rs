//! Reversible units of completed work
//!
//! An [`Action`] is a handle to an effect that has already happened. Calling
//! [`Action::rollback`] tries to reverse it. Workflows push one action per
//! completed step onto an [`ActionChain`] so that a later failure can undo
//! everything in reverse order.

mod chain;

pub use chain::ActionChain;

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use tracing::{info, warn};

/// Boxed future produced by rollback closures
pub type RollbackFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// A completed effect that can be reversed
///
/// Rollback is best-effort: it reports failure through the returned error and
/// never panics. Failed rollbacks are not retried.
#[async_trait]
pub trait Action: Send + Sync {
    /// Attempt to undo the effect
    async fn rollback(&self) -> Result<()>;
}

#[async_trait]
impl<A: Action + ?Sized> Action for Box<A> {
    async fn rollback(&self) -> Result<()> {
        (**self).rollback().await
    }
}

/// Action for steps that left nothing to undo
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

#[async_trait]
impl Action for Noop {
    async fn rollback(&self) -> Result<()> {
        Ok(())
    }
}

/// Action backed by a named undo closure
pub struct RollbackFn {
    task: String,
    undo: Box<dyn Fn() -> RollbackFuture + Send + Sync>,
}

impl RollbackFn {
    /// Create an action that runs `undo` on rollback
    ///
    /// `task` names the undo step in log lines and rollback reports.
    pub fn new<F, Fut>(task: impl Into<String>, undo: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            task: task.into(),
            undo: Box::new(move || -> RollbackFuture { Box::pin(undo()) }),
        }
    }

    /// Name of the undo step
    pub fn task(&self) -> &str {
        &self.task
    }
}

impl std::fmt::Debug for RollbackFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollbackFn").field("task", &self.task).finish()
    }
}

#[async_trait]
impl Action for RollbackFn {
    async fn rollback(&self) -> Result<()> {
        info!(task = %self.task, "rollback");
        match (self.undo)().await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(task = %self.task, error = %e, "rollback failed");
                Err(Error::Rollback {
                    task: self.task.clone(),
                    cause: Box::new(e),
                })
            }
        }
    }
}
