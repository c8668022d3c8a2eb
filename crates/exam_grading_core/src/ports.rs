//! crates/exam_grading_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the grading core.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete record store and message queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{AnswerId, ExamId, ExamReport, ExamSession, ExamSubmission, GradingJob, SubmittedAnswer};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (database, queue).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl From<serde_json::Error> for PortError {
    fn from(e: serde_json::Error) -> Self {
        PortError::Serialization(e.to_string())
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Record Store Ports
//=========================================================================================

/// Opens units of work against the record store.
#[async_trait]
pub trait GradingStore: Send + Sync {
    /// Starts a new transactional unit. Nothing written through it is visible
    /// until `commit` succeeds.
    async fn begin(&self) -> PortResult<Box<dyn GradingUnit>>;
}

/// One transaction covering a single grading run.
#[async_trait]
pub trait GradingUnit: Send {
    /// Loads every submitted answer of the exam joined with its question's
    /// correct option and domain.
    async fn load_answers(&mut self, exam_id: ExamId) -> PortResult<Vec<SubmittedAnswer>>;

    /// Stores the derived correctness flag of one answer.
    async fn set_answer_correct(&mut self, answer_id: AnswerId, is_correct: bool) -> PortResult<()>;

    /// Writes the report and moves the session to `COMPLETED`.
    async fn complete_session(
        &mut self,
        exam_id: ExamId,
        report: &ExamReport,
        completed_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn commit(self: Box<Self>) -> PortResult<()>;

    async fn rollback(self: Box<Self>) -> PortResult<()>;
}

/// The submission and polling side of the record store.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Creates a `PROCESSING` session together with all of its raw answers.
    async fn create_submission(&self, submission: &ExamSubmission) -> PortResult<ExamId>;

    async fn fetch_session(&self, exam_id: ExamId) -> PortResult<ExamSession>;
}

//=========================================================================================
// Queue Port
//=========================================================================================

/// A message taken off the queue. The payload is left undecoded so that
/// malformed messages can be reported and dropped by the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    pub id: i64,
    pub payload: Value,
}

/// An at-least-once delivery channel for grading jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn publish(&self, queue: &str, job: &GradingJob) -> PortResult<()>;

    /// Removes and returns the next message of `queue`, if any.
    async fn claim(&self, queue: &str) -> PortResult<Option<QueueMessage>>;
}
