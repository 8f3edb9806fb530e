//! Job repository: record-level reads and conditional status writes.
//!
//! Every write here is a single SurrealQL statement, so it runs in its own
//! store-side transaction. Status changes are guarded by a `WHERE status = ..`
//! clause and report whether they applied, which is how concurrent callers in
//! other processes are kept from stepping on each other.

use queue_core::{Job, JobId, JobOutcome, JobStatus};
use serde::Deserialize;
use surrealdb::sql::Datetime;

use crate::{Database, DbError};

/// Fields read back for a full job record.
const JOB_FIELDS: &str = "record::id(id) AS id, queue, work, payload, status, worker, \
     result, error, enqueued_at, started_at, ended_at";

/// Repository for job persistence operations.
#[derive(Clone)]
pub struct JobRepository {
    db: Database,
}

/// Internal record type for SurrealDB reads.
#[derive(Debug, Deserialize)]
struct JobRecord {
    id: JobId,
    queue: String,
    work: String,
    payload: serde_json::Value,
    status: JobStatus,
    worker: Option<String>,
    result: Option<String>,
    error: Option<String>,
    enqueued_at: Datetime,
    started_at: Option<Datetime>,
    ended_at: Option<Datetime>,
}

impl JobRecord {
    fn into_job(self) -> Job {
        Job {
            id: self.id,
            queue: self.queue,
            work: self.work,
            payload: self.payload,
            status: self.status,
            worker: self.worker,
            result: self.result,
            error: self.error,
            enqueued_at: self.enqueued_at.0,
            started_at: self.started_at.map(|t| t.0),
            ended_at: self.ended_at.map(|t| t.0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdRecord {
    id: JobId,
}

#[derive(Debug, Deserialize)]
struct StatusRecord {
    status: JobStatus,
}

/// The store reports an existing record on CREATE. Remote engines only carry
/// the message text, so match on that.
fn is_record_exists(err: &surrealdb::Error) -> bool {
    err.to_string().contains("already exists")
}

/// Optimistic transaction conflict: another writer touched the same record.
fn is_write_conflict(err: &surrealdb::Error) -> bool {
    let message = err.to_string();
    message.contains("read or write conflict") || message.contains("can be retried")
}

impl JobRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a queued job. Fails with [`DbError::Exists`] if the id is taken.
    pub async fn create(
        &self,
        id: &JobId,
        queue: &str,
        work: &str,
        payload: serde_json::Value,
    ) -> Result<(), DbError> {
        let result = self
            .db
            .query(
                r#"
                CREATE type::thing("job", $id) CONTENT {
                    queue: $queue,
                    work: $work,
                    payload: $payload,
                    status: "queued",
                    enqueued_at: time::now()
                } RETURN NONE
                "#,
            )
            .bind(("id", id.to_string()))
            .bind(("queue", queue.to_string()))
            .bind(("work", work.to_string()))
            .bind(("payload", payload))
            .await
            .and_then(|response| response.check());

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_record_exists(&e) || is_write_conflict(&e) => {
                Err(DbError::Exists(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a job by ID.
    pub async fn get(&self, id: &JobId) -> Result<Option<Job>, DbError> {
        let mut response = self
            .db
            .query(format!(
                r#"SELECT {JOB_FIELDS} FROM type::thing("job", $id)"#
            ))
            .bind(("id", id.to_string()))
            .await?;

        let records: Vec<JobRecord> = response.take(0)?;

        Ok(records.into_iter().next().map(JobRecord::into_job))
    }

    /// Ids of jobs in a queue holding `status`, oldest first by `order_field`.
    pub async fn ids_with_status(
        &self,
        queue: &str,
        status: JobStatus,
        order_field: &'static str,
        limit: Option<usize>,
    ) -> Result<Vec<JobId>, DbError> {
        let limit_clause = limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();

        let query = format!(
            "SELECT record::id(id) AS id, {order_field} FROM job \
             WHERE queue = $queue AND status = $status \
             ORDER BY {order_field} ASC, id ASC {limit_clause}"
        );

        let mut response = self
            .db
            .query(query)
            .bind(("queue", queue.to_string()))
            .bind(("status", status.as_str()))
            .await?;

        let records: Vec<IdRecord> = response.take(0)?;

        Ok(records.into_iter().map(|r| r.id).collect())
    }

    /// Move a queued job to started on behalf of `worker`.
    ///
    /// Returns `false` if the job was no longer queued.
    pub async fn claim(&self, id: &JobId, worker: &str) -> Result<bool, DbError> {
        self.conditional_update(
            id,
            JobStatus::Started,
            r#"
            UPDATE type::thing("job", $id)
            SET status = "started", worker = $worker, started_at = time::now()
            WHERE status = "queued"
            RETURN status
            "#
            .to_string(),
            vec![("worker", worker.to_string())],
        )
        .await
    }

    /// Move a queued job straight to canceled.
    pub async fn cancel_queued(&self, id: &JobId) -> Result<bool, DbError> {
        self.conditional_update(
            id,
            JobStatus::Canceled,
            r#"
            UPDATE type::thing("job", $id)
            SET status = "canceled", ended_at = time::now()
            WHERE status = "queued"
            RETURN status
            "#
            .to_string(),
            Vec::new(),
        )
        .await
    }

    /// Record the terminal outcome of a started job held by `worker`.
    pub async fn settle(
        &self,
        id: &JobId,
        worker: &str,
        outcome: &JobOutcome,
    ) -> Result<bool, DbError> {
        let detail_field = match outcome {
            JobOutcome::Finished(_) => "result",
            JobOutcome::Failed(_) | JobOutcome::Canceled(_) => "error",
        };

        let query = format!(
            r#"
            UPDATE type::thing("job", $id)
            SET status = $status, {detail_field} = $detail, ended_at = time::now()
            WHERE status = "started" AND worker = $worker
            RETURN status
            "#
        );

        self.conditional_update(
            id,
            outcome.status(),
            query,
            vec![
                ("status", outcome.status().as_str().to_string()),
                ("detail", outcome.detail().to_string()),
                ("worker", worker.to_string()),
            ],
        )
        .await
    }

    /// Run a guarded UPDATE and report whether it moved the job into `target`.
    async fn conditional_update(
        &self,
        id: &JobId,
        target: JobStatus,
        query: String,
        bindings: Vec<(&'static str, String)>,
    ) -> Result<bool, DbError> {
        let mut request = self.db.query(query).bind(("id", id.to_string()));
        for binding in bindings {
            request = request.bind(binding);
        }

        let outcome = async {
            let mut response = request.await?;
            let records: Vec<StatusRecord> = response.take(0)?;
            Ok::<_, surrealdb::Error>(records)
        }
        .await;

        match outcome {
            Ok(records) => Ok(records.iter().any(|r| r.status == target)),
            Err(e) if is_write_conflict(&e) => {
                tracing::debug!("Lost write race on job {}: {}", id, e);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
