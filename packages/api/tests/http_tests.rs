#![allow(clippy::disallowed_methods)]

use std::error::Error;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use db::{DbConfig, TaskQueue};
use http_body_util::BodyExt;
use queue_core::JobOutcome;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Result<(Router, TaskQueue), Box<dyn Error>> {
    let db_conn = db::connect(&DbConfig::memory()).await?;
    let queue = TaskQueue::new(db_conn, "tasks");
    Ok((api::router(api::LifecycleController::new(queue.clone())), queue))
}

async fn send(router: &Router, request: Request<Body>) -> Result<(StatusCode, Value), Box<dyn Error>> {
    let res = router.clone().oneshot(request).await?;
    let status = res.status();
    let bytes = res.into_body().collect().await?.to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, body))
}

fn post_json(uri: &str, body: Value) -> Result<Request<Body>, Box<dyn Error>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))?)
}

fn get(uri: &str) -> Result<Request<Body>, Box<dyn Error>> {
    Ok(Request::builder().method("GET").uri(uri).body(Body::empty())?)
}

fn detail(body: &Value) -> Result<&str, Box<dyn Error>> {
    body["detail"].as_str().ok_or_else(|| format!("no detail in {body}").into())
}

#[tokio::test]
async fn test_receive_returns_job_id() -> Result<(), Box<dyn Error>> {
    let (router, _) = app().await?;

    let (status, body) = send(&router, post_json("/app/tasks/receive", json!({"title": "t1"}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"job_id": "t1"}));

    let (status, body) = send(&router, get("/app/tasks/queued_jobs")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["t1"]));
    Ok(())
}

#[tokio::test]
async fn test_duplicate_receive_is_500_with_detail() -> Result<(), Box<dyn Error>> {
    let (router, _) = app().await?;

    send(&router, post_json("/app/tasks/receive", json!({"title": "t1"}))?).await?;
    let (status, body) = send(&router, post_json("/app/tasks/receive", json!({"title": "t1"}))?).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(detail(&body)?.contains("t1"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_rejected_before_the_controller() -> Result<(), Box<dyn Error>> {
    let (router, queue) = app().await?;

    let (status, _) = send(&router, post_json("/app/tasks/receive", json!({"name": "t1"}))?).await?;
    assert!(status.is_client_error());
    assert!(queue.list_pending_ids().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cancel_reports_prior_state() -> Result<(), Box<dyn Error>> {
    let (router, queue) = app().await?;

    for title in ["first", "second"] {
        send(&router, post_json("/app/tasks/receive", json!({"title": title}))?).await?;
    }
    let running = queue.dequeue("worker-1").await?.ok_or("nothing to claim")?;
    assert_eq!(running.id.as_str(), "first");

    let (status, body) = send(&router, post_json("/app/tasks/cancel", json!({"job_id": "second"}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "queued"}));

    let (_, body) = send(&router, post_json("/app/tasks/cancel", json!({"job_id": "first"}))?).await?;
    assert_eq!(body, json!({"status": "started"}));

    let (_, body) = send(&router, post_json("/app/tasks/cancel", json!({"job_id": "second"}))?).await?;
    assert_eq!(body, json!({"status": api::NOT_CANCELABLE}));

    let (_, body) = send(&router, get("/app/tasks/cancelled_jobs")?).await?;
    assert_eq!(body, json!(["second"]));
    Ok(())
}

#[tokio::test]
async fn test_cancel_unknown_is_500() -> Result<(), Box<dyn Error>> {
    let (router, _) = app().await?;

    let (status, body) = send(&router, post_json("/app/tasks/cancel", json!({"job_id": "nope"}))?).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(detail(&body)?.contains("nope"));
    Ok(())
}

#[tokio::test]
async fn test_registry_listings() -> Result<(), Box<dyn Error>> {
    let (router, queue) = app().await?;

    for title in ["a", "b"] {
        send(&router, post_json("/app/tasks/receive", json!({"title": title}))?).await?;
    }
    let a = queue.dequeue("w").await?.ok_or("a is pending")?;
    queue.settle(&a.id, "w", &JobOutcome::Finished("ok".into())).await?;
    let b = queue.dequeue("w").await?.ok_or("b is pending")?;
    queue.settle(&b.id, "w", &JobOutcome::Failed("boom".into())).await?;

    let (_, body) = send(&router, get("/app/tasks/finished_jobs")?).await?;
    assert_eq!(body, json!(["a"]));
    let (_, body) = send(&router, get("/app/tasks/failed_jobs")?).await?;
    assert_eq!(body, json!(["b"]));
    let (_, body) = send(&router, get("/app/tasks/queued_jobs")?).await?;
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_job_route_returns_record() -> Result<(), Box<dyn Error>> {
    let (router, _) = app().await?;

    send(&router, post_json("/app/tasks/receive", json!({"title": "look"}))?).await?;

    let (status, body) = send(&router, get("/app/tasks/jobs/look")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "look");
    assert_eq!(body["status"], "queued");
    assert_eq!(body["work"], "sleep");

    let (status, _) = send(&router, get("/app/tasks/jobs/missing")?).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}
