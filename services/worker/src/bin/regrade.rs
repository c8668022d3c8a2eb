//! services/worker/src/bin/regrade.rs
//!
//! Operator tool that re-enqueues grading jobs. A failed grading run leaves its
//! session in `PROCESSING`; this is how it gets resubmitted.

use clap::Parser;
use exam_grading_core::domain::ExamId;
use std::sync::Arc;
use tracing::{error, info};
use worker_lib::{
    adapters::{connect_with_retry, PgGradingStore, PgJobQueue},
    config::WorkerConfig,
    error::WorkerError,
    jobs::JobDispatcher,
    telemetry,
};

#[derive(Parser)]
#[command(name = "regrade", version, about = "Re-enqueue exam grading jobs")]
struct Cli {
    /// Exam session ids to grade again
    #[arg(required = true)]
    exam_ids: Vec<ExamId>,

    /// Queue to publish to (defaults to QUEUE_NAME)
    #[arg(long)]
    queue: Option<String>,

    /// Re-enqueue sessions that are already COMPLETED as well
    #[arg(long)]
    include_completed: bool,
}

#[tokio::main]
async fn main() -> Result<(), WorkerError> {
    let cli = Cli::parse();
    let config = WorkerConfig::from_env()?;
    telemetry::init(config.log_level);

    let db_pool = connect_with_retry(
        &config.database_url,
        config.db_max_connections,
        config.db_connect_attempts,
        config.db_connect_retry_delay,
    )
    .await?;
    let store = Arc::new(PgGradingStore::new(db_pool.clone()));
    let queue = Arc::new(PgJobQueue::new(db_pool));
    let queue_name = cli.queue.unwrap_or(config.queue_name);
    let dispatcher = JobDispatcher::new(store, queue, queue_name);

    let mut failures = 0usize;
    for exam_id in cli.exam_ids {
        match dispatcher.results(exam_id).await {
            Ok(session) if session.is_completed() && !cli.include_completed => {
                info!(exam_id, "Session already COMPLETED, skipping.");
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                error!(exam_id, "Cannot read session: {}", e);
                failures += 1;
                continue;
            }
        }

        if let Err(e) = dispatcher.dispatch(exam_id).await {
            error!(exam_id, "Failed to enqueue: {}", e);
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(WorkerError::Internal(format!(
            "{} exam(s) could not be re-enqueued",
            failures
        )));
    }
    Ok(())
}
