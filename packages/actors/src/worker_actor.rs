//! Worker actor for executing jobs.

use std::sync::Arc;
use std::time::Duration;

use db::TaskQueue;
use db::repositories::{CommandKind, WorkerCommand};
use queue_core::{Job, JobId, JobOutcome};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::task::JoinHandle;

use crate::handler::{HandlerResult, JobHandler, JobHandlerRegistry};
use crate::messages::WorkerMessage;

/// Default delay between two poll ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A job this worker claimed, with the task running its handler.
struct RunningJob {
    job_id: JobId,
    task: JoinHandle<()>,
}

/// State for the worker actor.
pub struct WorkerActorState {
    /// Worker name; stop commands are addressed to it.
    pub name: String,
    queue: TaskQueue,
    handlers: Arc<JobHandlerRegistry>,
    current: Option<RunningJob>,
    ticker: Option<JoinHandle<()>>,
    running: bool,
}

impl WorkerActorState {
    fn new(name: String, queue: TaskQueue, handlers: Arc<JobHandlerRegistry>) -> Self {
        Self {
            name,
            queue,
            handlers,
            current: None,
            ticker: None,
            running: true,
        }
    }

    /// Check if the worker is idle.
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    fn current_job_id(&self) -> Option<&JobId> {
        self.current.as_ref().map(|r| &r.job_id)
    }

    /// Record an outcome for `job_id`. Store failures are logged, not raised.
    async fn settle(&self, job_id: &JobId, outcome: JobOutcome) {
        if let Err(e) = self.queue.settle(job_id, &self.name, &outcome).await {
            tracing::warn!(
                "Worker {} could not record {} for job {}: {}",
                self.name,
                outcome.status(),
                job_id,
                e
            );
        }
    }

    async fn apply_command(&mut self, command: WorkerCommand) {
        match command.kind {
            CommandKind::StopJob => {
                if self.current_job_id() != Some(&command.job_id) {
                    tracing::debug!(
                        "Worker {} ignoring stop for job {} it is not running",
                        self.name,
                        command.job_id
                    );
                    return;
                }

                if let Some(running) = self.current.take() {
                    running.task.abort();
                    tracing::info!("Worker {} stopped job {}", self.name, running.job_id);
                    self.settle(
                        &running.job_id,
                        JobOutcome::Canceled("Stopped by cancel request".into()),
                    )
                    .await;
                }
            }
        }
    }

    fn start(&mut self, myself: &ActorRef<WorkerMessage>, handler: Arc<dyn JobHandler>, job: Job) {
        let job_id = job.id.clone();
        let worker = myself.clone();
        let task = tokio::spawn(async move {
            let result = handler.handle(&job).await;
            let _ = worker.send_message(WorkerMessage::WorkDone {
                job_id: job.id,
                result,
            });
        });

        self.current = Some(RunningJob { job_id, task });
    }

    async fn poll(&mut self, myself: &ActorRef<WorkerMessage>) {
        match self.queue.take_commands(&self.name).await {
            Ok(commands) => {
                for command in commands {
                    self.apply_command(command).await;
                }
            }
            Err(e) => tracing::warn!("Worker {} could not read commands: {}", self.name, e),
        }

        if !self.is_idle() {
            return;
        }

        let job = match self.queue.dequeue(&self.name).await {
            Ok(Some(job)) => job,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Worker {} could not dequeue: {}", self.name, e);
                return;
            }
        };

        tracing::info!("Worker {} running job {} ({})", self.name, job.id, job.work);

        match self.handlers.get(&job.work) {
            Some(handler) => self.start(myself, handler, job),
            None => {
                let error = format!("No handler for work: {}", job.work);
                tracing::warn!("Job {} failed: {}", job.id, error);
                self.settle(&job.id, JobOutcome::Failed(error)).await;
            }
        }
    }

    async fn finish(&mut self, job_id: JobId, result: HandlerResult) {
        if self.current_job_id() != Some(&job_id) {
            // Already settled as canceled
            return;
        }
        self.current = None;

        let outcome = match result {
            Ok(summary) => JobOutcome::Finished(summary),
            Err(error) => JobOutcome::Failed(error),
        };
        self.settle(&job_id, outcome).await;
    }
}

/// Worker actor arguments.
pub struct WorkerArgs {
    pub name: String,
    pub queue: TaskQueue,
    pub handlers: Arc<JobHandlerRegistry>,
    pub poll_interval: Duration,
}

/// Worker actor that claims jobs from a queue and runs their handlers.
///
/// Runs at most one job at a time.
pub struct WorkerActor;

impl Actor for WorkerActor {
    type Msg = WorkerMessage;
    type State = WorkerActorState;
    type Arguments = WorkerArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting worker {} on queue {}", args.name, args.queue.name());

        let mut state = WorkerActorState::new(args.name, args.queue, args.handlers);

        // Start the poll loop
        let myself_clone = myself.clone();
        let interval = args.poll_interval;
        state.ticker = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if myself_clone.send_message(WorkerMessage::Poll).is_err() {
                    break;
                }
            }
        }));

        Ok(state)
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }

        if let Some(running) = state.current.take() {
            running.task.abort();
            state
                .settle(
                    &running.job_id,
                    JobOutcome::Failed(format!("Worker {} shut down", state.name)),
                )
                .await;
        }

        if let Err(e) = state.queue.discard_commands(&state.name).await {
            tracing::warn!("Worker {} could not discard its commands: {}", state.name, e);
        }

        tracing::info!("Worker {} stopped", state.name);
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Poll => {
                if state.running {
                    state.poll(&myself).await;
                }
            }

            WorkerMessage::WorkDone { job_id, result } => {
                state.finish(job_id, result).await;
            }

            WorkerMessage::IsIdle { reply } => {
                let _ = reply.send(state.is_idle());
            }

            WorkerMessage::CurrentJob { reply } => {
                let _ = reply.send(state.current_job_id().cloned());
            }

            WorkerMessage::Shutdown => {
                tracing::info!("Shutting down worker: {}", state.name);
                state.running = false;
                myself.stop(None);
            }
        }

        Ok(())
    }
}

/// Spawn a standalone worker, unsupervised.
pub async fn spawn_worker(
    args: WorkerArgs,
) -> Result<(ActorRef<WorkerMessage>, JoinHandle<()>), ractor::SpawnErr> {
    let name = args.name.clone();
    Actor::spawn(Some(name), WorkerActor, args).await
}
