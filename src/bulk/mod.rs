//! Bounded-concurrency bulk updates with compensation
//!
//! [`BulkUpdater::update_all`] applies one mutation to many independent remote
//! entities at once. The batch is atomic from the caller's point of view:
//! either every item succeeds and an [`Action`] reversing the whole batch is
//! returned, or the items that did succeed are compensated and a single
//! [`Error::Batch`] carries the report of everything that went wrong.

mod report;

pub use report::{BatchReport, ItemFailure};

use crate::action::{Action, Noop};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Default number of remote calls allowed in flight at once
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Boxed future produced by a mutation
pub type MutationFuture<T> = Pin<Box<dyn Future<Output = Result<Option<T>>> + Send>>;

/// Per-item mutation: `Ok(Some(new))` when the item changed, `Ok(None)` when it
/// was already in the desired state
pub type MutationFn<T> = Arc<dyn Fn(T) -> MutationFuture<T> + Send + Sync>;

/// Wrap an async closure as a [`MutationFn`]
pub fn mutation<T, F, Fut>(f: F) -> MutationFn<T>
where
    T: 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<T>>> + Send + 'static,
{
    Arc::new(move |target| -> MutationFuture<T> { Box::pin(f(target)) })
}

/// Successful outcome of a bulk update
pub struct BulkUpdate<T> {
    /// Every target in its post-update state (unchanged targets included)
    pub updated: Vec<T>,
    /// Reverses the batch; [`Noop`] when there is nothing to reverse
    pub action: Box<dyn Action>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for BulkUpdate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkUpdate")
            .field("updated", &self.updated)
            .finish_non_exhaustive()
    }
}

/// Runs bulk updates under a fixed permit budget
#[derive(Debug, Clone, Copy)]
pub struct BulkUpdater {
    concurrency: usize,
}

impl Default for BulkUpdater {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

struct ItemOutcome<T> {
    original: T,
    result: Result<Option<T>>,
}

impl BulkUpdater {
    /// Create an updater allowing `concurrency` in-flight calls (at least one)
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Permit budget
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Apply `update` to every target concurrently
    ///
    /// Returns only once every item has finished. If any item fails and
    /// `rollback` is given, the items that were actually changed get the
    /// inverse mutation (same permit budget) and its failures are appended to
    /// the report. Passing `None` disables compensation.
    ///
    /// On success the returned action re-runs this engine with the two
    /// functions swapped, over the items that were changed.
    pub async fn update_all<T>(
        &self,
        targets: Vec<T>,
        update: MutationFn<T>,
        rollback: Option<MutationFn<T>>,
    ) -> Result<BulkUpdate<T>>
    where
        T: Clone + Display + Send + Sync + 'static,
    {
        if targets.is_empty() {
            return Ok(BulkUpdate {
                updated: Vec::new(),
                action: Box::new(Noop),
            });
        }

        let total = targets.len();
        info!(items = total, concurrency = self.concurrency, "bulk update: run");

        let mut updated = Vec::with_capacity(total);
        let mut changed = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.apply_all(targets, &update).await {
            match outcome.result {
                Ok(Some(item)) => {
                    changed.push(item.clone());
                    updated.push(item);
                }
                Ok(None) => {
                    debug!(item = %outcome.original, "already up to date");
                    updated.push(outcome.original);
                }
                Err(e) => failures.push(ItemFailure::new(&outcome.original, &e)),
            }
        }

        if failures.is_empty() {
            let action: Box<dyn Action> = match rollback {
                Some(inverse) if !changed.is_empty() => Box::new(BulkRollback {
                    updater: *self,
                    targets: changed,
                    update: inverse,
                    rollback: update,
                }),
                _ => Box::new(Noop),
            };
            return Ok(BulkUpdate { updated, action });
        }

        warn!(failed = failures.len(), items = total, "bulk update: fail");
        let mut report = BatchReport::new(total, failures);

        if let Some(inverse) = rollback {
            if !changed.is_empty() {
                info!(items = changed.len(), "bulk update: rollback");
                report.rollback_failures = self
                    .apply_all(changed, &inverse)
                    .await
                    .into_iter()
                    .filter_map(|outcome| {
                        outcome
                            .result
                            .err()
                            .map(|e| ItemFailure::new(&outcome.original, &e))
                    })
                    .collect();
                if !report.rollback_failures.is_empty() {
                    warn!(
                        failed = report.rollback_failures.len(),
                        "bulk update: rollback incomplete"
                    );
                }
            }
        }

        Err(Error::Batch(report))
    }

    /// Fan out one task per target and wait for all of them
    async fn apply_all<T>(&self, targets: Vec<T>, op: &MutationFn<T>) -> Vec<ItemOutcome<T>>
    where
        T: Clone + Display + Send + Sync + 'static,
    {
        let permits = Arc::new(Semaphore::new(self.concurrency));

        let handles: Vec<_> = targets
            .into_iter()
            .map(|target| {
                let original = target.clone();
                let permits = Arc::clone(&permits);
                let op = Arc::clone(op);
                let handle = tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| Error::Internal(format!("permit pool closed: {e}")))?;
                    op(target).await
                });
                (original, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (original, handle) in handles {
            let result = handle.await.unwrap_or_else(|e| {
                Err(Error::Internal(format!("task for {original} aborted: {e}")))
            });
            outcomes.push(ItemOutcome { original, result });
        }
        outcomes
    }
}

/// Reverses a completed batch by running the engine with swapped functions
struct BulkRollback<T> {
    updater: BulkUpdater,
    targets: Vec<T>,
    update: MutationFn<T>,
    rollback: MutationFn<T>,
}

#[async_trait]
impl<T> Action for BulkRollback<T>
where
    T: Clone + Display + Send + Sync + 'static,
{
    async fn rollback(&self) -> Result<()> {
        info!(items = self.targets.len(), "rollback: bulk update");
        self.updater
            .update_all(
                self.targets.clone(),
                Arc::clone(&self.update),
                Some(Arc::clone(&self.rollback)),
            )
            .await
            .map(|_| ())
    }
}
