//! Job domain types for work items in the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::QueueError;

/// Caller-chosen identifier for a job.
///
/// The id doubles as the queue entry and the record key. Callers are
/// responsible for uniqueness; the queue only rejects ids it has already seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Build a job id from caller input.
    pub fn new(id: impl Into<String>) -> Result<Self, QueueError> {
        let id = id.into();
        if id.is_empty() {
            return Err(QueueError::InvalidId("job id must not be empty".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Current status of a job in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting in the pending sequence.
    #[default]
    Queued,
    /// Claimed by a worker and executing.
    Started,
    Finished,
    Failed,
    Canceled,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Failed | JobStatus::Canceled
        )
    }

    /// Status string as stored and reported.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Started => "started",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome reported by the worker that holds a started job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Work completed; carries a short result summary.
    Finished(String),
    /// Work failed; carries the error text.
    Failed(String),
    /// Work was stopped after a cancellation request.
    Canceled(String),
}

impl JobOutcome {
    /// The terminal status this outcome moves a job into.
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Finished(_) => JobStatus::Finished,
            JobOutcome::Failed(_) => JobStatus::Failed,
            JobOutcome::Canceled(_) => JobStatus::Canceled,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            JobOutcome::Finished(s) | JobOutcome::Failed(s) | JobOutcome::Canceled(s) => s,
        }
    }
}

/// A job represents a unit of work tracked by the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// The queue this job belongs to.
    pub queue: String,
    /// Name of the work to run (used for routing to handlers).
    pub work: String,
    /// Opaque work arguments as a JSON object.
    pub payload: serde_json::Value,
    pub status: JobStatus,
    /// Worker that claimed the job, once started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}
