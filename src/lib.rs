//! relflow - release workflow automation with compensating rollback
//!
//! Drives git branches together with issue tracker and code review mutations
//! (start a story, start/stage/close a release, post a review request). Every
//! mutating step records an [`action::Action`]; if a later step fails the
//! recorded actions are rolled back in reverse order.
//!
//! Bulk tracker mutations run through [`bulk::BulkUpdater`], which bounds the
//! number of in-flight remote calls and compensates partial failures.

pub mod action;
pub mod auth;
pub mod bulk;
pub mod config;
pub mod error;
pub mod git;
pub mod progress;
pub mod review;
pub mod tracker;
pub mod types;
pub mod workflow;

pub use error::{Error, Result};
