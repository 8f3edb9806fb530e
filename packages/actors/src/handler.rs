//! Work handler trait and registry.
//!
//! A job names its work; the worker looks the name up here and runs the
//! handler with the job's payload. The store never interprets the work.

use queue_core::Job;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Result type for work handlers: a short summary on success, the error text
/// on failure.
pub type HandlerResult = Result<String, String>;

/// Future type for async work handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Work name of the built-in placeholder handler.
pub const SLEEP_WORK: &str = "sleep";

/// Seconds the placeholder handler sleeps when the payload does not say.
pub const DEFAULT_SLEEP_SECONDS: f64 = 3.0;

/// Trait for work handlers.
///
/// Implement this trait to define how jobs naming a specific work are run.
pub trait JobHandler: Send + Sync + 'static {
    /// The work name this handler runs.
    fn work(&self) -> &str;

    /// Run a job and return its outcome.
    ///
    /// The returned future may be dropped at any await point when the job
    /// is stopped.
    fn handle(&self, job: &Job) -> HandlerFuture;
}

/// Registry for work handlers.
#[derive(Default)]
pub struct JobHandlerRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobHandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry holding the built-in `sleep` handler.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SleepHandler);
        registry
    }

    /// Register a handler, replacing any previous one for the same work.
    pub fn register<H: JobHandler>(&mut self, handler: H) {
        let work = handler.work().to_string();
        self.handlers.insert(work, Arc::new(handler));
    }

    pub fn get(&self, work: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(work).cloned()
    }

    pub fn has_handler(&self, work: &str) -> bool {
        self.handlers.contains_key(work)
    }

    /// List all registered work names.
    pub fn works(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }
}

/// A simple function-based work handler.
pub struct FnHandler<F>
where
    F: Fn(&Job) -> HandlerFuture + Send + Sync + 'static,
{
    work: String,
    handler: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Job) -> HandlerFuture + Send + Sync + 'static,
{
    pub fn new(work: impl Into<String>, handler: F) -> Self {
        Self {
            work: work.into(),
            handler,
        }
    }
}

impl<F> JobHandler for FnHandler<F>
where
    F: Fn(&Job) -> HandlerFuture + Send + Sync + 'static,
{
    fn work(&self) -> &str {
        &self.work
    }

    fn handle(&self, job: &Job) -> HandlerFuture {
        (self.handler)(job)
    }
}

/// Placeholder work: sleeps for `payload.seconds` (default 3).
pub struct SleepHandler;

impl SleepHandler {
    fn duration(payload: &Value) -> Result<Duration, String> {
        let seconds = match payload.get("seconds") {
            None | Some(Value::Null) => DEFAULT_SLEEP_SECONDS,
            Some(value) => value
                .as_f64()
                .ok_or_else(|| format!("seconds must be a number, got {}", value))?,
        };
        Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid seconds {}: {}", seconds, e))
    }
}

impl JobHandler for SleepHandler {
    fn work(&self) -> &str {
        SLEEP_WORK
    }

    fn handle(&self, job: &Job) -> HandlerFuture {
        let duration = Self::duration(&job.payload);
        Box::pin(async move {
            let duration = duration?;
            tokio::time::sleep(duration).await;
            Ok(format!("slept {:.3}s", duration.as_secs_f64()))
        })
    }
}
