//! Worker runtime for the task queue.
//!
//! Workers claim jobs from a [`db::TaskQueue`], run the handler registered for
//! the job's work, and record the outcome back in the store. Stop commands
//! sent through the queue's control channel abort the running job.
//!
//! # Architecture
//!
//! - `Supervisor` - Keeps a fixed number of workers alive and replaces failed ones
//! - `WorkerActor` - Polls the queue and executes one job at a time
//! - `JobHandlerRegistry` - Maps work names to handlers
//!
//! # Usage
//!
//! ```ignore
//! use actors::{JobHandlerRegistry, SupervisorArgs, start_workers};
//!
//! let pool = start_workers(SupervisorArgs {
//!     queue,
//!     handlers: Arc::new(JobHandlerRegistry::with_defaults()),
//!     worker_count: 2,
//!     poll_interval: Duration::from_millis(200),
//! })
//! .await?;
//!
//! pool.shutdown().await;
//! ```

mod handler;
mod messages;
mod supervisor;
mod worker_actor;

pub use handler::{
    DEFAULT_SLEEP_SECONDS, FnHandler, HandlerFuture, HandlerResult, JobHandler,
    JobHandlerRegistry, SLEEP_WORK, SleepHandler,
};
pub use messages::{SupervisorMessage, WorkerMessage};
pub use supervisor::{Supervisor, SupervisorArgs, WorkerPool, start_workers};
pub use worker_actor::{DEFAULT_POLL_INTERVAL, WorkerActor, WorkerArgs, spawn_worker};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
