//! Supervisor actor for a pool of workers on one queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use db::TaskQueue;
use ractor::{Actor, ActorCell, ActorId, ActorProcessingErr, ActorRef, SupervisionEvent};
use ulid::Ulid;

use crate::handler::JobHandlerRegistry;
use crate::messages::{SupervisorMessage, WorkerMessage};
use crate::worker_actor::{WorkerActor, WorkerArgs};

/// How long shutdown waits for each worker to settle its job and stop.
const WORKER_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Supervisor actor arguments.
pub struct SupervisorArgs {
    pub queue: TaskQueue,
    pub handlers: Arc<JobHandlerRegistry>,
    pub worker_count: usize,
    pub poll_interval: Duration,
}

/// State for the supervisor actor.
pub struct SupervisorState {
    queue: TaskQueue,
    handlers: Arc<JobHandlerRegistry>,
    poll_interval: Duration,
    /// Live workers by actor id.
    workers: HashMap<ActorId, (String, ActorRef<WorkerMessage>)>,
    shutting_down: bool,
}

impl SupervisorState {
    /// Generate a worker name, unique across every process sharing the store.
    fn next_worker_name() -> String {
        format!("worker-{}", Ulid::new())
    }

    async fn spawn_worker(&mut self, supervisor: ActorCell) -> Result<(), ActorProcessingErr> {
        let name = Self::next_worker_name();
        let args = WorkerArgs {
            name: name.clone(),
            queue: self.queue.clone(),
            handlers: self.handlers.clone(),
            poll_interval: self.poll_interval,
        };

        let (worker, _handle) = Actor::spawn_linked(Some(name.clone()), WorkerActor, args, supervisor)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("Failed to spawn worker: {}", e)))?;

        self.workers.insert(worker.get_id(), (name, worker));
        Ok(())
    }
}

/// Supervisor actor that keeps a fixed number of workers alive.
pub struct Supervisor;

impl Actor for Supervisor {
    type Msg = SupervisorMessage;
    type State = SupervisorState;
    type Arguments = SupervisorArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting {} workers on queue {}",
            args.worker_count,
            args.queue.name()
        );

        let mut state = SupervisorState {
            queue: args.queue,
            handlers: args.handlers,
            poll_interval: args.poll_interval,
            workers: HashMap::new(),
            shutting_down: false,
        };

        for _ in 0..args.worker_count {
            state.spawn_worker(myself.get_cell()).await?;
        }

        Ok(state)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisorMessage::WorkerCount { reply } => {
                let _ = reply.send(state.workers.len());
            }

            SupervisorMessage::WorkerNames { reply } => {
                let mut names: Vec<String> =
                    state.workers.values().map(|(name, _)| name.clone()).collect();
                names.sort();
                let _ = reply.send(names);
            }

            SupervisorMessage::Shutdown => {
                tracing::info!("Shutting down {} workers", state.workers.len());
                state.shutting_down = true;
                for (_, (name, worker)) in state.workers.drain() {
                    if let Err(e) = worker
                        .stop_and_wait(Some("shutdown".into()), Some(WORKER_STOP_TIMEOUT))
                        .await
                    {
                        tracing::warn!("Worker {} did not stop cleanly: {}", name, e);
                    }
                }
                myself.stop(None);
            }
        }

        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisionEvent::ActorFailed(cell, err) => {
                let name = state
                    .workers
                    .remove(&cell.get_id())
                    .map(|(name, _)| name)
                    .unwrap_or_default();
                tracing::warn!("Worker {} failed: {}", name, err);

                if !state.shutting_down {
                    state.spawn_worker(myself.get_cell()).await?;
                }
            }
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                if let Some((name, _)) = state.workers.remove(&cell.get_id()) {
                    tracing::info!("Worker {} terminated: {:?}", name, reason);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Handle on a running worker pool.
pub struct WorkerPool {
    supervisor: ActorRef<SupervisorMessage>,
    handle: tokio::task::JoinHandle<()>,
}

impl WorkerPool {
    pub fn supervisor(&self) -> &ActorRef<SupervisorMessage> {
        &self.supervisor
    }

    /// Stop every worker and wait for the supervisor to exit.
    pub async fn shutdown(self) {
        if self.supervisor.send_message(SupervisorMessage::Shutdown).is_err() {
            tracing::warn!("Worker supervisor already stopped");
        }
        if let Err(e) = self.handle.await {
            tracing::warn!("Worker supervisor exited abnormally: {}", e);
        }
    }
}

/// Start a supervised pool of workers on `args.queue`.
pub async fn start_workers(args: SupervisorArgs) -> Result<WorkerPool, ractor::SpawnErr> {
    let name = format!("supervisor-{}", Ulid::new());
    let (supervisor, handle) = Actor::spawn(Some(name), Supervisor, args).await?;

    Ok(WorkerPool { supervisor, handle })
}
