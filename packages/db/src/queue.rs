//! The pending-job queue, backed by the job table.
//!
//! The pending sequence is the set of `queued` jobs of this queue ordered by
//! `enqueued_at` (ties broken by id). There is no separate list to keep in
//! sync: a job leaves the sequence the moment its status changes.

use queue_core::{Job, JobId, JobOutcome, JobStatus, QueueError, QueueResult};
use serde_json::{Map, Value};

use crate::repositories::{CommandKind, CommandRepository, JobRepository, WorkerCommand};
use crate::{Database, DbError};

/// How many of the oldest pending jobs a claim attempt looks at per round.
const CLAIM_BATCH: usize = 8;

/// A named queue in the shared store.
///
/// Holds no state besides the store handle, so any number of processes can
/// operate on the same queue at once.
#[derive(Clone)]
pub struct TaskQueue {
    name: String,
    jobs: JobRepository,
    commands: CommandRepository,
}

impl TaskQueue {
    pub fn new(db: Database, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jobs: JobRepository::new(db.clone()),
            commands: CommandRepository::new(db),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn jobs(&self) -> &JobRepository {
        &self.jobs
    }

    /// Record a new job and append it to the pending sequence.
    ///
    /// The existence check and the insert are one store statement, so two
    /// submissions of the same id cannot both succeed.
    pub async fn enqueue(
        &self,
        id: JobId,
        work: &str,
        payload: Map<String, Value>,
    ) -> QueueResult<Job> {
        match self
            .jobs
            .create(&id, &self.name, work, Value::Object(payload))
            .await
        {
            Ok(()) => {}
            Err(DbError::Exists(_)) => return Err(QueueError::Conflict(id)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!("Job {} enqueued on {}", id, self.name);

        self.jobs
            .get(&id)
            .await?
            .ok_or(QueueError::NotFound(id))
    }

    /// Claim the oldest pending job for `worker`, marking it started.
    ///
    /// Returns `None` when nothing is pending. Losing a claim to another
    /// worker moves on to the next candidate.
    pub async fn dequeue(&self, worker: &str) -> QueueResult<Option<Job>> {
        loop {
            let candidates = self
                .jobs
                .ids_with_status(&self.name, JobStatus::Queued, "enqueued_at", Some(CLAIM_BATCH))
                .await?;

            if candidates.is_empty() {
                return Ok(None);
            }

            for id in candidates {
                if !self.jobs.claim(&id, worker).await? {
                    tracing::debug!("Job {} was claimed elsewhere", id);
                    continue;
                }

                tracing::info!("Job {} started by {}", id, worker);
                let job = self.jobs.get(&id).await?.ok_or(QueueError::NotFound(id))?;
                return Ok(Some(job));
            }
        }
    }

    /// Snapshot of the pending sequence in FIFO order.
    pub async fn list_pending_ids(&self) -> QueueResult<Vec<JobId>> {
        let ids = self
            .jobs
            .ids_with_status(&self.name, JobStatus::Queued, "enqueued_at", None)
            .await?;
        tracing::debug!("IDs pending on {}: {:?}", self.name, ids);
        Ok(ids)
    }

    /// The authoritative record for a job, if it exists on this queue.
    pub async fn fetch_job(&self, id: &JobId) -> QueueResult<Option<Job>> {
        let job = self.jobs.get(id).await?;
        Ok(job.filter(|j| j.queue == self.name))
    }

    /// Cancel a job that is still waiting. Returns `false` if it was not queued.
    pub async fn cancel_queued(&self, id: &JobId) -> QueueResult<bool> {
        let canceled = self.jobs.cancel_queued(id).await?;
        if canceled {
            tracing::info!("Job {} canceled while queued", id);
        }
        Ok(canceled)
    }

    /// Record the terminal outcome of a job held by `worker`.
    ///
    /// Returns `false` if the job was no longer started by that worker, for
    /// example when a cancellation already settled it.
    pub async fn settle(&self, id: &JobId, worker: &str, outcome: &JobOutcome) -> QueueResult<bool> {
        let settled = self.jobs.settle(id, worker, outcome).await?;
        if settled {
            tracing::info!("Job {} {} on {}", id, outcome.status(), worker);
        } else {
            tracing::debug!("Job {} was already settled, dropping {}", id, outcome.status());
        }
        Ok(settled)
    }

    /// Ask `worker` to stop executing `id`. Fire and forget.
    pub async fn send_stop_job_command(&self, worker: &str, id: &JobId) -> QueueResult<()> {
        self.commands.send(worker, CommandKind::StopJob, id).await?;
        tracing::info!("Stop command for job {} sent to {}", id, worker);
        Ok(())
    }

    /// Consume the commands addressed to `worker`.
    pub async fn take_commands(&self, worker: &str) -> QueueResult<Vec<WorkerCommand>> {
        Ok(self.commands.take_for_worker(worker).await?)
    }

    /// Discard the commands left for a worker that is shutting down.
    pub async fn discard_commands(&self, worker: &str) -> QueueResult<()> {
        self.commands.purge_worker(worker).await?;
        tracing::debug!("Discarded pending commands for {}", worker);
        Ok(())
    }
}
