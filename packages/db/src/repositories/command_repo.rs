//! Control channel for out-of-band commands addressed to workers.
//!
//! Commands are one-way: the sender writes a record and returns, the
//! addressed worker picks it up on its next poll. Nothing confirms delivery.

use queue_core::JobId;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::{Database, DbError};

/// Kind of command sent to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    /// Stop executing the named job.
    StopJob,
}

/// A command consumed by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub kind: CommandKind,
    pub job_id: JobId,
}

#[derive(Debug, Deserialize)]
struct CommandRecord {
    id: String,
    kind: CommandKind,
    job_id: JobId,
}

/// Repository for worker commands.
#[derive(Clone)]
pub struct CommandRepository {
    db: Database,
}

impl CommandRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Write a command for `worker`. Ids are ULIDs so commands sort by send time.
    pub async fn send(&self, worker: &str, kind: CommandKind, job_id: &JobId) -> Result<(), DbError> {
        self.db
            .query(
                r#"
                CREATE type::thing("command", $command_id) CONTENT {
                    worker: $worker,
                    kind: $kind,
                    job_id: $job_id,
                    sent_at: time::now()
                } RETURN NONE
                "#,
            )
            .bind(("command_id", Ulid::new().to_string()))
            .bind(("worker", worker.to_string()))
            .bind(("kind", kind))
            .bind(("job_id", job_id.to_string()))
            .await?
            .check()?;

        Ok(())
    }

    /// Remove and return every pending command for `worker`, oldest first.
    ///
    /// Only the addressed worker consumes its commands, so reading and then
    /// deleting by id does not race with another consumer.
    pub async fn take_for_worker(&self, worker: &str) -> Result<Vec<WorkerCommand>, DbError> {
        let mut response = self
            .db
            .query(
                r#"
                SELECT record::id(id) AS id, kind, job_id FROM command
                WHERE worker = $worker
                ORDER BY id ASC
                "#,
            )
            .bind(("worker", worker.to_string()))
            .await?;

        let records: Vec<CommandRecord> = response.take(0)?;

        for record in &records {
            self.db
                .query(r#"DELETE type::thing("command", $command_id)"#)
                .bind(("command_id", record.id.clone()))
                .await?
                .check()?;
        }

        Ok(records
            .into_iter()
            .map(|r| WorkerCommand {
                kind: r.kind,
                job_id: r.job_id,
            })
            .collect())
    }

    /// Drop every command still addressed to `worker`. Worker names are never
    /// reused, so these would otherwise sit in the table forever.
    pub async fn purge_worker(&self, worker: &str) -> Result<(), DbError> {
        self.db
            .query("DELETE command WHERE worker = $worker")
            .bind(("worker", worker.to_string()))
            .await?
            .check()?;

        Ok(())
    }
}
