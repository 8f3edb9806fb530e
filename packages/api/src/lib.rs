//! HTTP admission API for the task queue.
//!
//! - `LifecycleController` - submit, cancel and query jobs by id
//! - `router` - the axum routes under `/app/tasks`

mod controller;
mod error;
mod routes;

pub use controller::{DefaultWork, LifecycleController};
pub use error::ApiError;
pub use routes::{
    AppState, CancelResponse, NOT_CANCELABLE, SubmitResponse, TaskCancelInput, TaskInput, router,
};

// Re-export core types for convenience
pub use queue_core::{CancelOutcome, Job, JobId, JobStatus, QueueError};
