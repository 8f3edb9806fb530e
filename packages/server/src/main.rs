use std::error::Error;

use api::LifecycleController;
use server::{AppConfig, open_queue, shutdown_signal, telemetry, worker_pool_args};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    telemetry::init(&config.log.filter);

    tracing::info!("Starting task service v{}", config.version);

    let queue = open_queue(&config).await?;

    let workers = if config.worker.embedded > 0 {
        let args = worker_pool_args(&config, queue.clone(), config.worker.embedded);
        Some(actors::start_workers(args).await?)
    } else {
        None
    };

    let app = api::router(LifecycleController::new(queue));

    let address = config.http.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = workers {
        pool.shutdown().await;
    }

    tracing::info!("Task service stopped");
    Ok(())
}
