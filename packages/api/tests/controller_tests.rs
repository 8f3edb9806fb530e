#![allow(clippy::disallowed_methods)]

use std::collections::HashSet;
use std::error::Error;

use api::{DefaultWork, LifecycleController};
use db::{DbConfig, TaskQueue};
use queue_core::{CancelOutcome, JobId, JobOutcome, JobStatus, QueueError};

async fn setup_controller() -> Result<LifecycleController, Box<dyn Error>> {
    let db_conn = db::connect(&DbConfig::memory()).await?;
    Ok(LifecycleController::new(TaskQueue::new(db_conn, "tasks")))
}

fn id(name: &str) -> JobId {
    JobId::new(name).unwrap()
}

#[tokio::test]
async fn test_submit_uses_title_as_id() -> Result<(), Box<dyn Error>> {
    let controller = setup_controller().await?;

    let job_id = controller.submit("weekly-report").await?;
    assert_eq!(job_id, id("weekly-report"));

    let job = controller.fetch(&job_id).await?;
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.work, "sleep");
    assert_eq!(job.payload["seconds"], 3);

    assert_eq!(controller.list_pending().await?, vec![job_id]);
    Ok(())
}

#[tokio::test]
async fn test_submit_rejects_duplicates_and_empty_titles() -> Result<(), Box<dyn Error>> {
    let controller = setup_controller().await?;

    controller.submit("once").await?;
    assert!(matches!(controller.submit("once").await, Err(QueueError::Conflict(_))));
    assert_eq!(controller.list_pending().await?, vec![id("once")]);

    assert!(matches!(controller.submit("").await, Err(QueueError::InvalidId(_))));
    Ok(())
}

#[tokio::test]
async fn test_custom_default_work() -> Result<(), Box<dyn Error>> {
    let controller = setup_controller().await?.with_default_work(DefaultWork {
        work: "resize".to_string(),
        payload: serde_json::Map::new(),
    });

    let job_id = controller.submit("thumb").await?;
    assert_eq!(controller.fetch(&job_id).await?.work, "resize");
    Ok(())
}

#[tokio::test]
async fn test_cancel_while_queued() -> Result<(), Box<dyn Error>> {
    let controller = setup_controller().await?;

    let x = controller.submit("x").await?;
    controller.submit("keep").await?;

    assert_eq!(controller.cancel(&x).await?, CancelOutcome::Dequeued);
    assert_eq!(controller.list_canceled().await?, vec![x.clone()]);
    assert_eq!(controller.list_pending().await?, vec![id("keep")]);

    // Second cancel is an outcome, not an error
    assert_eq!(
        controller.cancel(&x).await?,
        CancelOutcome::NotCancelable(JobStatus::Canceled)
    );
    assert_eq!(controller.list_canceled().await?, vec![x]);
    Ok(())
}

#[tokio::test]
async fn test_cancel_while_started_signals_worker() -> Result<(), Box<dyn Error>> {
    let controller = setup_controller().await?;

    let y = controller.submit("y").await?;
    let claimed = controller.queue().dequeue("worker-1").await?.expect("y is pending");
    assert_eq!(claimed.id, y);

    assert_eq!(controller.cancel(&y).await?, CancelOutcome::StopRequested);

    // Status is unchanged until the worker reports
    assert_eq!(controller.fetch(&y).await?.status, JobStatus::Started);
    assert!(controller.list_canceled().await?.is_empty());
    assert!(controller.list_pending().await?.is_empty());

    let commands = controller.queue().take_commands("worker-1").await?;
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].job_id, y);

    // The worker acknowledges
    let stopped = JobOutcome::Canceled("stopped".to_string());
    assert!(controller.queue().settle(&y, "worker-1", &stopped).await?);
    assert_eq!(controller.list_canceled().await?, vec![y]);
    Ok(())
}

#[tokio::test]
async fn test_cancel_terminal_jobs() -> Result<(), Box<dyn Error>> {
    let controller = setup_controller().await?;
    let queue = controller.queue();

    let done = controller.submit("done").await?;
    let broken = controller.submit("broken").await?;
    queue.dequeue("w").await?;
    queue.settle(&done, "w", &JobOutcome::Finished("ok".into())).await?;
    queue.dequeue("w").await?;
    queue.settle(&broken, "w", &JobOutcome::Failed("boom".into())).await?;

    assert_eq!(
        controller.cancel(&done).await?,
        CancelOutcome::NotCancelable(JobStatus::Finished)
    );
    assert_eq!(
        controller.cancel(&broken).await?,
        CancelOutcome::NotCancelable(JobStatus::Failed)
    );

    assert_eq!(controller.list_finished().await?, vec![done]);
    assert_eq!(controller.list_failed().await?, vec![broken]);
    assert!(controller.list_canceled().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unknown_id_is_not_found() -> Result<(), Box<dyn Error>> {
    let controller = setup_controller().await?;

    let ghost = id("ghost");
    assert!(matches!(controller.cancel(&ghost).await, Err(QueueError::NotFound(_))));
    assert!(matches!(controller.fetch(&ghost).await, Err(QueueError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_cancel_racing_claims_follows_the_winner() -> Result<(), Box<dyn Error>> {
    let controller = setup_controller().await?;

    let ids: Vec<JobId> = (0..40).map(|i| id(&format!("race-{i:02}"))).collect();
    for job_id in &ids {
        controller.submit(job_id.as_str()).await?;
    }

    let claimer = {
        let queue = controller.queue().clone();
        tokio::spawn(async move {
            let mut claimed = HashSet::new();
            while let Some(job) = queue.dequeue("racer").await? {
                claimed.insert(job.id);
            }
            Ok::<_, QueueError>(claimed)
        })
    };
    let canceler = {
        let controller = controller.clone();
        let ids = ids.clone();
        tokio::spawn(async move {
            let mut outcomes = Vec::new();
            for job_id in ids {
                let outcome = controller.cancel(&job_id).await?;
                outcomes.push((job_id, outcome));
            }
            Ok::<_, QueueError>(outcomes)
        })
    };

    let claimed = claimer.await??;
    let outcomes = canceler.await??;

    let canceled: HashSet<JobId> = controller.list_canceled().await?.into_iter().collect();
    let stop_targets: HashSet<JobId> = controller
        .queue()
        .take_commands("racer")
        .await?
        .into_iter()
        .map(|c| c.job_id)
        .collect();

    for (job_id, outcome) in outcomes {
        let job = controller.fetch(&job_id).await?;
        match outcome {
            CancelOutcome::Dequeued => {
                assert_eq!(job.status, JobStatus::Canceled, "{job_id}");
                assert!(canceled.contains(&job_id), "{job_id}");
                assert!(!claimed.contains(&job_id), "{job_id} canceled and claimed");
                assert!(job.worker.is_none(), "{job_id}");
            }
            CancelOutcome::StopRequested => {
                assert_eq!(job.status, JobStatus::Started, "{job_id}");
                assert_eq!(job.worker.as_deref(), Some("racer"), "{job_id}");
                assert!(claimed.contains(&job_id), "{job_id}");
                assert!(stop_targets.contains(&job_id), "{job_id} has no stop command");
            }
            CancelOutcome::NotCancelable(status) => {
                panic!("{job_id} reported not cancelable while {status}")
            }
        }
    }

    // Every id ended up on exactly one side
    assert_eq!(canceled.len() + claimed.len(), ids.len());
    assert!(canceled.is_disjoint(&claimed));
    Ok(())
}
