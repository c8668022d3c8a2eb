//! services/worker/src/jobs/dispatcher.rs
//!
//! The producing side of the grading queue: stores submissions and enqueues
//! their grading jobs.

use exam_grading_core::domain::{ExamId, ExamSession, ExamSubmission, GradingJob};
use exam_grading_core::ports::{JobQueue, PortResult, SubmissionStore};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct JobDispatcher {
    submissions: Arc<dyn SubmissionStore>,
    queue: Arc<dyn JobQueue>,
    queue_name: String,
}

impl JobDispatcher {
    pub fn new(
        submissions: Arc<dyn SubmissionStore>,
        queue: Arc<dyn JobQueue>,
        queue_name: impl Into<String>,
    ) -> Self {
        Self {
            submissions,
            queue,
            queue_name: queue_name.into(),
        }
    }

    /// Enqueues a `calculate_kpis` job for an exam.
    pub async fn dispatch(&self, exam_id: ExamId) -> PortResult<()> {
        let job = GradingJob::calculate_kpis(exam_id);
        self.queue.publish(&self.queue_name, &job).await?;
        info!(exam_id, queue = %self.queue_name, "Grading job enqueued.");
        Ok(())
    }

    /// Persists a submission, then enqueues its grading job.
    ///
    /// The submission is durable before the job is published. If publishing
    /// fails the error is returned and the session stays `PROCESSING` until
    /// the exam is dispatched again.
    pub async fn submit(&self, submission: &ExamSubmission) -> PortResult<ExamId> {
        // An empty submission is still stored and enqueued; the handler drops
        // its job as an empty answer set and the session stays PROCESSING.
        let exam_id = self.submissions.create_submission(submission).await?;
        info!(
            exam_id,
            user_id = submission.user_id,
            answers = submission.answers.len(),
            "Submission stored."
        );

        if let Err(e) = self.dispatch(exam_id).await {
            error!(exam_id, "Failed to enqueue grading job: {}", e);
            return Err(e);
        }
        Ok(exam_id)
    }

    /// Reads the current state of a session for polling clients.
    pub async fn results(&self, exam_id: ExamId) -> PortResult<ExamSession> {
        self.submissions.fetch_session(exam_id).await
    }
}
