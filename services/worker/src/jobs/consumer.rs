//! services/worker/src/jobs/consumer.rs
//!
//! The long-lived consumer loop: pulls one message at a time off the grading
//! queue and hands it to the `GradingJobHandler`.

use crate::jobs::handler::{GradingJobHandler, JobOutcome};
use exam_grading_core::domain::GradingJob;
use exam_grading_core::ports::{JobQueue, PortResult, QueueMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Upper bound for the delay between polls after queue errors.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// A claimed message together with what happened to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedJob {
    /// Id of the queue message the job arrived in.
    pub job_id: i64,
    pub outcome: JobOutcome,
}

pub struct Worker {
    id: Uuid,
    queue: Arc<dyn JobQueue>,
    handler: GradingJobHandler,
    queue_name: String,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        handler: GradingJobHandler,
        queue_name: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            queue,
            handler,
            queue_name: queue_name.into(),
            poll_interval,
        }
    }

    /// Claims and processes at most one message.
    ///
    /// Returns `Ok(None)` when the queue is empty. Only queue errors are
    /// returned; grading failures are reported through the outcome.
    pub async fn poll_once(&self) -> PortResult<Option<ProcessedJob>> {
        let Some(message) = self.queue.claim(&self.queue_name).await? else {
            return Ok(None);
        };
        let job_id = message.id;
        let span = info_span!("grading_job", worker_id = %self.id, job_id);
        let outcome = self.process(message).instrument(span).await;
        Ok(Some(ProcessedJob { job_id, outcome }))
    }

    async fn process(&self, message: QueueMessage) -> JobOutcome {
        match serde_json::from_value::<GradingJob>(message.payload) {
            Ok(job) => self.handler.handle(&job).await,
            Err(e) => {
                warn!("Dropping malformed grading message: {}", e);
                JobOutcome::Malformed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Runs until `shutdown` is cancelled. A job in progress is always
    /// finished before the loop exits.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(worker_id = %self.id, queue = %self.queue_name, "Grading worker started, waiting for jobs...");
        let mut backoff = self.poll_interval;

        while !shutdown.is_cancelled() {
            let delay = match self.poll_once().await {
                Ok(Some(_)) => {
                    backoff = self.poll_interval;
                    continue;
                }
                Ok(None) => {
                    backoff = self.poll_interval;
                    self.poll_interval
                }
                Err(e) => {
                    error!(worker_id = %self.id, queue = %self.queue_name, "Failed to claim from queue: {}", e);
                    let delay = backoff;
                    backoff = next_backoff(backoff);
                    delay
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(worker_id = %self.id, queue = %self.queue_name, "Grading worker stopped.");
    }
}

/// Doubles the delay, capped at `MAX_BACKOFF`.
pub fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2).min(MAX_BACKOFF).max(Duration::from_millis(1))
}
