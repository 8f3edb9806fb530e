//! Queue-level types: registries and cancellation outcomes.

use serde::{Deserialize, Serialize};

use crate::JobStatus;

/// Name of the queue used when none is configured.
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// A read-side partition of jobs sharing a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    Canceled,
    Finished,
    Failed,
}

impl Registry {
    /// The job status whose holders make up this registry.
    pub fn status(self) -> JobStatus {
        match self {
            Registry::Canceled => JobStatus::Canceled,
            Registry::Finished => JobStatus::Finished,
            Registry::Failed => JobStatus::Failed,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.status().as_str()
    }
}

impl std::fmt::Display for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a cancellation request.
///
/// Only `Dequeued` means the job is now canceled. A started job is merely
/// signalled; its worker decides when it reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job was waiting and has been removed from the queue.
    Dequeued,
    /// The job was executing; a stop command went to its worker.
    StopRequested,
    /// The job had already reached the given terminal status.
    NotCancelable(JobStatus),
}

impl CancelOutcome {
    /// Status the job held when the request was handled, if it was cancelable.
    pub fn prior_status(&self) -> Option<JobStatus> {
        match self {
            CancelOutcome::Dequeued => Some(JobStatus::Queued),
            CancelOutcome::StopRequested => Some(JobStatus::Started),
            CancelOutcome::NotCancelable(_) => None,
        }
    }
}
