//! Human-readable report of a failed bulk update

use std::fmt::{self, Display};

/// One item that failed to update (or to roll back)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Display form of the target
    pub item: String,
    /// Error message
    pub error: String,
}

impl ItemFailure {
    /// Record the failure of `item`
    pub fn new(item: &impl Display, error: &impl Display) -> Self {
        Self {
            item: item.to_string(),
            error: error.to_string(),
        }
    }
}

/// Everything that went wrong in one bulk update
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Number of items the batch was dispatched for
    pub total: usize,
    /// Items whose update failed
    pub failures: Vec<ItemFailure>,
    /// Items whose compensation failed; these remain changed
    pub rollback_failures: Vec<ItemFailure>,
}

impl BatchReport {
    /// Create a report for a batch of `total` items
    pub const fn new(total: usize, failures: Vec<ItemFailure>) -> Self {
        Self {
            total,
            failures,
            rollback_failures: Vec::new(),
        }
    }

    /// Whether every compensation succeeded
    pub fn is_fully_compensated(&self) -> bool {
        self.rollback_failures.is_empty()
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} item(s) failed:", self.failures.len(), self.total)?;
        for failure in &self.failures {
            write!(f, "\n  - {}: {}", failure.item, failure.error)?;
        }
        if !self.rollback_failures.is_empty() {
            write!(
                f,
                "\nrollback failed for {} item(s), still modified:",
                self.rollback_failures.len()
            )?;
            for failure in &self.rollback_failures {
                write!(f, "\n  - {}: {}", failure.item, failure.error)?;
            }
        }
        Ok(())
    }
}
