//! services/worker/src/bin/worker.rs

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use worker_lib::{
    adapters::{connect_with_retry, PgGradingStore, PgJobQueue},
    config::WorkerConfig,
    error::WorkerError,
    jobs::{GradingJobHandler, Worker},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), WorkerError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = WorkerConfig::from_env()?;
    telemetry::init(config.log_level);
    info!("Configuration loaded. Starting grading worker...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = connect_with_retry(
        &config.database_url,
        config.db_max_connections,
        config.db_connect_attempts,
        config.db_connect_retry_delay,
    )
    .await?;
    let store = Arc::new(PgGradingStore::new(db_pool.clone()));
    if config.run_migrations {
        info!("Running database migrations...");
        store.run_migrations().await?;
        info!("Database migrations complete.");
    }

    // --- 3. Wire the Queue and the Handler ---
    let queue = Arc::new(PgJobQueue::new(db_pool));
    let handler = GradingJobHandler::new(store);
    let worker = Worker::new(queue, handler, config.queue_name.clone(), config.poll_interval);

    // --- 4. Stop Cleanly on Ctrl-C ---
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received."),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        signal_token.cancel();
    });

    // --- 5. Consume Jobs ---
    worker.run(shutdown).await;
    Ok(())
}
