//! Process wiring for the task service binaries.
//!
//! - `server` - the HTTP API, optionally with in-process workers
//! - `worker` - a standalone worker pool on the shared store

pub mod config;
pub mod telemetry;

use std::sync::Arc;

use actors::{JobHandlerRegistry, SupervisorArgs};
use db::{DbError, TaskQueue};

pub use config::{AppConfig, ConfigError};

/// Connect to the configured store and open the configured queue.
pub async fn open_queue(config: &AppConfig) -> Result<TaskQueue, DbError> {
    let db_conn = db::connect(&config.db).await?;
    Ok(TaskQueue::new(db_conn, config.queue.name.clone()))
}

/// Arguments for a pool of `count` workers running the built-in handlers.
pub fn worker_pool_args(config: &AppConfig, queue: TaskQueue, count: usize) -> SupervisorArgs {
    SupervisorArgs {
        queue,
        handlers: Arc::new(JobHandlerRegistry::with_defaults()),
        worker_count: count,
        poll_interval: config.worker.poll_interval(),
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
