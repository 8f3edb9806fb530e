//! Message types for actor communication.

use queue_core::JobId;
use ractor::RpcReplyPort;

use crate::handler::HandlerResult;

/// Messages for the WorkerActor.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Poll tick: consume stop commands, then claim a job if idle.
    Poll,

    /// The handler task for a job returned.
    WorkDone { job_id: JobId, result: HandlerResult },

    /// Check if worker is idle.
    IsIdle { reply: RpcReplyPort<bool> },

    /// The job currently executing, if any.
    CurrentJob { reply: RpcReplyPort<Option<JobId>> },

    /// Shutdown the worker.
    Shutdown,
}

/// Messages for the Supervisor.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// Number of live workers.
    WorkerCount { reply: RpcReplyPort<usize> },

    /// Names of live workers, as addressed by stop commands.
    WorkerNames { reply: RpcReplyPort<Vec<String>> },

    /// Stop every worker, then the supervisor.
    Shutdown,
}
