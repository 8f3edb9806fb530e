use std::error::Error;

use server::{AppConfig, open_queue, shutdown_signal, telemetry, worker_pool_args};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    telemetry::init(&config.log.filter);

    let count = config.worker.embedded.max(1);
    tracing::info!("Starting {} task workers v{}", count, config.version);

    let queue = open_queue(&config).await?;
    let pool = actors::start_workers(worker_pool_args(&config, queue, count)).await?;

    shutdown_signal().await;
    pool.shutdown().await;

    tracing::info!("Task workers stopped");
    Ok(())
}
