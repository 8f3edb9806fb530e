//! HTTP routes under `/app/tasks`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use queue_core::{CancelOutcome, Job, JobId};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::controller::LifecycleController;
use crate::error::ApiError;

/// Status text reported when a job is already terminal.
pub const NOT_CANCELABLE: &str = "neither queued nor started, cannot cancel";

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<LifecycleController>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCancelInput {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub status: String,
}

impl From<CancelOutcome> for CancelResponse {
    fn from(outcome: CancelOutcome) -> Self {
        let status = match outcome.prior_status() {
            Some(status) => status.to_string(),
            None => NOT_CANCELABLE.to_string(),
        };
        Self { status }
    }
}

/// Build the task routes, nested under `/app/tasks`.
pub fn router(controller: LifecycleController) -> Router {
    let state = AppState {
        controller: Arc::new(controller),
    };

    let tasks = Router::new()
        .route("/receive", post(receive))
        .route("/cancel", post(cancel))
        .route("/queued_jobs", get(queued_jobs))
        .route("/cancelled_jobs", get(cancelled_jobs))
        .route("/finished_jobs", get(finished_jobs))
        .route("/failed_jobs", get(failed_jobs))
        .route("/jobs/{job_id}", get(job));

    Router::new()
        .nest("/app/tasks", tasks)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn receive(
    State(state): State<AppState>,
    Json(input): Json<TaskInput>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let job_id = state.controller.submit(&input.title).await?;
    Ok(Json(SubmitResponse { job_id }))
}

async fn cancel(
    State(state): State<AppState>,
    Json(input): Json<TaskCancelInput>,
) -> Result<Json<CancelResponse>, ApiError> {
    let id = JobId::new(input.job_id)?;
    let outcome = state.controller.cancel(&id).await?;
    Ok(Json(outcome.into()))
}

async fn queued_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobId>>, ApiError> {
    Ok(Json(state.controller.list_pending().await?))
}

async fn cancelled_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobId>>, ApiError> {
    Ok(Json(state.controller.list_canceled().await?))
}

async fn finished_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobId>>, ApiError> {
    Ok(Json(state.controller.list_finished().await?))
}

async fn failed_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobId>>, ApiError> {
    Ok(Json(state.controller.list_failed().await?))
}

async fn job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    let id = JobId::new(job_id)?;
    Ok(Json(state.controller.fetch(&id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use queue_core::JobStatus;

    #[test]
    fn cancel_response_text() {
        assert_eq!(CancelResponse::from(CancelOutcome::Dequeued).status, "queued");
        assert_eq!(CancelResponse::from(CancelOutcome::StopRequested).status, "started");
        assert_eq!(
            CancelResponse::from(CancelOutcome::NotCancelable(JobStatus::Failed)).status,
            NOT_CANCELABLE
        );
    }
}
