//! Core domain types for the task queue.
//!
//! This crate contains shared types used across all packages:
//! - Job, JobId and JobStatus for work items
//! - Registries and cancellation outcomes
//! - The error kinds returned by queue operations

mod error;
mod job;
mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{Job, JobId, JobOutcome, JobStatus};
pub use queue::{CancelOutcome, DEFAULT_QUEUE_NAME, Registry};
