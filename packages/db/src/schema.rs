//! Database schema definitions using SurrealQL.

use crate::{Database, DbError};

/// Initialize the database schema.
///
/// Every statement is idempotent, so concurrent processes may all run it.
pub async fn init_schema(db: &Database) -> Result<(), DbError> {
    tracing::info!("Initializing database schema...");

    db.query(JOB_SCHEMA).await?.check()?;
    db.query(COMMAND_SCHEMA).await?.check()?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Job table schema. Record ids are the caller-supplied job ids.
const JOB_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS job SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS queue ON job TYPE string;
DEFINE FIELD IF NOT EXISTS work ON job TYPE string;
DEFINE FIELD IF NOT EXISTS payload ON job FLEXIBLE TYPE object;
DEFINE FIELD IF NOT EXISTS status ON job TYPE string
    ASSERT $value INSIDE ["queued", "started", "finished", "failed", "canceled"];
DEFINE FIELD IF NOT EXISTS worker ON job TYPE option<string>;
DEFINE FIELD IF NOT EXISTS result ON job TYPE option<string>;
DEFINE FIELD IF NOT EXISTS error ON job TYPE option<string>;
DEFINE FIELD IF NOT EXISTS enqueued_at ON job TYPE datetime DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS started_at ON job TYPE option<datetime>;
DEFINE FIELD IF NOT EXISTS ended_at ON job TYPE option<datetime>;

-- Pending sequence and registries are both served by this index
DEFINE INDEX IF NOT EXISTS job_queue_status ON job FIELDS queue, status;
DEFINE INDEX IF NOT EXISTS job_enqueued ON job FIELDS enqueued_at;
"#;

/// Control channel: one-way commands addressed to a worker.
const COMMAND_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS command SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS worker ON command TYPE string;
DEFINE FIELD IF NOT EXISTS kind ON command TYPE string;
DEFINE FIELD IF NOT EXISTS job_id ON command TYPE string;
DEFINE FIELD IF NOT EXISTS sent_at ON command TYPE datetime DEFAULT time::now();

DEFINE INDEX IF NOT EXISTS command_worker ON command FIELDS worker;
"#;
