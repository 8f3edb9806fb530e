//! Read-side registries of finished, failed and canceled jobs.
//!
//! Membership is computed from `job.status` on every call, so a registry can
//! never disagree with the job records it lists.

use queue_core::{JobId, QueueResult, Registry};

use crate::TaskQueue;
use crate::repositories::JobRepository;

/// A view over the jobs of one queue holding one terminal status.
#[derive(Clone)]
pub struct JobRegistry {
    kind: Registry,
    queue: String,
    jobs: JobRepository,
}

impl JobRegistry {
    pub fn new(queue: &TaskQueue, kind: Registry) -> Self {
        Self {
            kind,
            queue: queue.name().to_string(),
            jobs: queue.jobs().clone(),
        }
    }

    pub fn canceled(queue: &TaskQueue) -> Self {
        Self::new(queue, Registry::Canceled)
    }

    pub fn finished(queue: &TaskQueue) -> Self {
        Self::new(queue, Registry::Finished)
    }

    pub fn failed(queue: &TaskQueue) -> Self {
        Self::new(queue, Registry::Failed)
    }

    pub fn kind(&self) -> Registry {
        self.kind
    }

    /// Member ids, in the order the jobs reached this status.
    pub async fn get_job_ids(&self) -> QueueResult<Vec<JobId>> {
        let ids = self
            .jobs
            .ids_with_status(&self.queue, self.kind.status(), "ended_at", None)
            .await?;
        tracing::debug!("IDs in {} registry: {:?}", self.kind, ids);
        Ok(ids)
    }

    /// Check whether a job currently belongs to this registry.
    pub async fn contains(&self, id: &JobId) -> QueueResult<bool> {
        let job = self.jobs.get(id).await?;
        Ok(job.is_some_and(|j| j.queue == self.queue && j.status == self.kind.status()))
    }
}
