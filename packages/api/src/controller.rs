//! Job lifecycle controller.
//!
//! Owns the rules for moving a job through its states on behalf of clients.
//! Everything here goes through the store's atomic statements; the controller
//! keeps no state of its own, so any number of API processes can share a queue.

use db::{JobRegistry, TaskQueue};
use queue_core::{CancelOutcome, Job, JobId, JobStatus, QueueError, QueueResult};
use serde_json::{Map, Value};

/// Work attached to every submitted job.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultWork {
    pub work: String,
    pub payload: Map<String, Value>,
}

impl Default for DefaultWork {
    /// The `sleep` placeholder for three seconds.
    fn default() -> Self {
        let mut payload = Map::new();
        payload.insert("seconds".to_string(), Value::from(3));
        Self {
            work: "sleep".to_string(),
            payload,
        }
    }
}

#[derive(Clone)]
pub struct LifecycleController {
    queue: TaskQueue,
    default_work: DefaultWork,
}

impl LifecycleController {
    pub fn new(queue: TaskQueue) -> Self {
        Self {
            queue,
            default_work: DefaultWork::default(),
        }
    }

    pub fn with_default_work(mut self, default_work: DefaultWork) -> Self {
        self.default_work = default_work;
        self
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Submit a job under the caller's title, which becomes its id.
    pub async fn submit(&self, title: &str) -> QueueResult<JobId> {
        let id = JobId::new(title)?;
        let job = self
            .queue
            .enqueue(id, &self.default_work.work, self.default_work.payload.clone())
            .await?;
        Ok(job.id)
    }

    /// Cancel a job.
    ///
    /// A queued job is canceled on the spot. A started job only gets a stop
    /// command sent to its worker and keeps its status until the worker
    /// reports. A terminal job is left alone.
    pub async fn cancel(&self, id: &JobId) -> QueueResult<CancelOutcome> {
        loop {
            let job = self.fetch(id).await?;

            match job.status {
                JobStatus::Queued => {
                    if self.queue.cancel_queued(id).await? {
                        return Ok(CancelOutcome::Dequeued);
                    }
                    // Claimed or canceled meanwhile, look again
                    tracing::debug!("Job {} left the queue during cancel, retrying", id);
                }
                JobStatus::Started => {
                    let worker = job.worker.ok_or_else(|| {
                        QueueError::StoreUnavailable(format!("started job {} has no worker", id))
                    })?;
                    self.queue.send_stop_job_command(&worker, id).await?;
                    return Ok(CancelOutcome::StopRequested);
                }
                status => {
                    tracing::info!("Job {} is {}, nothing to cancel", id, status);
                    return Ok(CancelOutcome::NotCancelable(status));
                }
            }
        }
    }

    /// The current record of a job.
    pub async fn fetch(&self, id: &JobId) -> QueueResult<Job> {
        self.queue
            .fetch_job(id)
            .await?
            .ok_or_else(|| QueueError::NotFound(id.clone()))
    }

    pub async fn list_pending(&self) -> QueueResult<Vec<JobId>> {
        self.queue.list_pending_ids().await
    }

    pub async fn list_canceled(&self) -> QueueResult<Vec<JobId>> {
        JobRegistry::canceled(&self.queue).get_job_ids().await
    }

    pub async fn list_finished(&self) -> QueueResult<Vec<JobId>> {
        JobRegistry::finished(&self.queue).get_job_ids().await
    }

    pub async fn list_failed(&self) -> QueueResult<Vec<JobId>> {
        JobRegistry::failed(&self.queue).get_job_ids().await
    }
}
