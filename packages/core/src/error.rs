//! Error kinds surfaced by queue and lifecycle operations.

use thiserror::Error;

use crate::JobId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A job with this id already exists, whatever its status.
    #[error("Job id already in use: {0}")]
    Conflict(JobId),
    #[error("No such job: {0}")]
    NotFound(JobId),
    #[error("Invalid job id: {0}")]
    InvalidId(String),
    /// The store could not be reached or did not confirm a write.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type QueueResult<T> = Result<T, QueueError>;
