//! services/worker/src/jobs/handler.rs
//!
//! This module contains the grading job handler: it drives one grading run
//! for one exam session inside a single store transaction.

use chrono::Utc;
use exam_grading_core::domain::{ExamId, ExamReport, GradingJob};
use exam_grading_core::grading::{grade_answers, GradingError};
use exam_grading_core::ports::{GradingStore, GradingUnit};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What happened to a job. The consumer only logs it; nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The report was written and the session is `COMPLETED`.
    Completed { exam_id: ExamId, score: f64 },
    /// The job cannot succeed and was discarded.
    Dropped { exam_id: ExamId, reason: String },
    /// The run failed and was rolled back; the session stays `PROCESSING`.
    Failed { exam_id: ExamId, reason: String },
    /// The message could not be decoded into a grading job.
    Malformed { reason: String },
}

#[derive(Clone)]
pub struct GradingJobHandler {
    store: Arc<dyn GradingStore>,
}

impl GradingJobHandler {
    pub fn new(store: Arc<dyn GradingStore>) -> Self {
        Self { store }
    }

    /// Handles one job. Errors are logged and contained.
    pub async fn handle(&self, job: &GradingJob) -> JobOutcome {
        let exam_id = job.exam_id;
        let start_time = Instant::now();
        info!(exam_id, "Grading exam.");

        match self.grade(exam_id).await {
            Ok(report) => {
                info!(
                    exam_id,
                    score = report.score,
                    elapsed = ?start_time.elapsed(),
                    "Exam graded."
                );
                JobOutcome::Completed {
                    exam_id,
                    score: report.score,
                }
            }
            Err(e @ GradingError::EmptyAnswerSet(_)) => {
                warn!(exam_id, "Dropping grading job: {}", e);
                JobOutcome::Dropped {
                    exam_id,
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                error!(exam_id, "Grading failed, session left in PROCESSING: {}", e);
                JobOutcome::Failed {
                    exam_id,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Grades an exam and commits the result, or rolls everything back.
    pub async fn grade(&self, exam_id: ExamId) -> Result<ExamReport, GradingError> {
        let mut unit = self.store.begin().await?;

        let result = run(unit.as_mut(), exam_id).await;
        match result {
            Ok(report) => {
                unit.commit().await?;
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback_err) = unit.rollback().await {
                    warn!(exam_id, "Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

async fn run(unit: &mut dyn GradingUnit, exam_id: ExamId) -> Result<ExamReport, GradingError> {
    let answers = unit.load_answers(exam_id).await?;
    debug!(exam_id, answers = answers.len(), "Loaded submitted answers.");

    let graded = grade_answers(exam_id, &answers)?;

    for (answer_id, is_correct) in &graded.verdicts {
        unit.set_answer_correct(*answer_id, *is_correct).await?;
    }

    unit.complete_session(exam_id, &graded.report, Utc::now()).await?;
    Ok(graded.report)
}
