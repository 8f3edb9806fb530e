//! Repository implementations for database operations.

mod command_repo;
mod job_repo;

pub use command_repo::{CommandKind, CommandRepository, WorkerCommand};
pub use job_repo::JobRepository;
