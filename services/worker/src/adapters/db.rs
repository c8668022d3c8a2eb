//! services/worker/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `GradingStore` and `SubmissionStore` ports from the core crate. It handles
//! all interactions with the PostgreSQL record store using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_grading_core::domain::{
    AnswerId, DetailedFeedback, ExamId, ExamReport, ExamSession, ExamSubmission, SessionStatus,
    SubmittedAnswer,
};
use exam_grading_core::ports::{GradingStore, GradingUnit, PortError, PortResult, SubmissionStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the record store ports.
#[derive(Clone)]
pub struct PgGradingStore {
    pool: PgPool,
}

impl PgGradingStore {
    /// Creates a new `PgGradingStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Connects to Postgres, retrying while the database is still starting up.
pub async fn connect_with_retry(
    database_url: &str,
    max_connections: u32,
    attempts: u32,
    retry_delay: Duration,
) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 1;
    loop {
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt < attempts => {
                warn!(attempt, attempts, "Database not reachable, retrying in {:?}: {}", retry_delay, e);
                attempt += 1;
                tokio::time::sleep(retry_delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AnswerRecord {
    answer_id: i64,
    selected_option: Option<String>,
    correct_option: Option<String>,
    domain: String,
    time_taken_ms: Option<i64>,
}
impl AnswerRecord {
    fn to_domain(self) -> SubmittedAnswer {
        SubmittedAnswer {
            answer_id: self.answer_id,
            selected_option: self.selected_option.unwrap_or_default(),
            correct_option: self.correct_option.unwrap_or_default(),
            domain: self.domain,
            // Negative timings are treated like missing ones.
            time_taken_ms: self.time_taken_ms.unwrap_or(0).max(0) as u64,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: i64,
    status: String,
    score: Option<f64>,
    domain_weakness: Option<Json<BTreeMap<String, f64>>>,
    detailed_feedback: Option<Json<DetailedFeedback>>,
    completed_at: Option<DateTime<Utc>>,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<ExamSession> {
        let status = self
            .status
            .parse::<SessionStatus>()
            .map_err(PortError::Unexpected)?;

        let report = match (status, self.score, self.domain_weakness, self.detailed_feedback) {
            (SessionStatus::Completed, Some(score), Some(weakness), Some(feedback)) => Some(ExamReport {
                score,
                domain_weakness: weakness.0,
                detailed_feedback: feedback.0,
            }),
            _ => None,
        };

        Ok(ExamSession {
            id: self.id,
            status,
            report,
            completed_at: self.completed_at,
        })
    }
}

//=========================================================================================
// `GradingStore` Trait Implementation
//=========================================================================================

/// A single grading run's transaction.
pub struct PgGradingUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl GradingStore for PgGradingStore {
    async fn begin(&self) -> PortResult<Box<dyn GradingUnit>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Box::new(PgGradingUnit { tx }))
    }
}

#[async_trait]
impl GradingUnit for PgGradingUnit {
    async fn load_answers(&mut self, exam_id: ExamId) -> PortResult<Vec<SubmittedAnswer>> {
        let records = sqlx::query_as::<_, AnswerRecord>(
            "SELECT a.id AS answer_id, a.selected_option, q.correct_option, q.domain, a.time_taken_ms \
             FROM user_answers a \
             JOIN questions q ON a.question_id = q.id \
             WHERE a.exam_session_id = $1 \
             ORDER BY a.id ASC",
        )
        .bind(exam_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn set_answer_correct(&mut self, answer_id: AnswerId, is_correct: bool) -> PortResult<()> {
        sqlx::query("UPDATE user_answers SET is_correct = $1 WHERE id = $2")
            .bind(is_correct)
            .bind(answer_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn complete_session(
        &mut self,
        exam_id: ExamId,
        report: &ExamReport,
        completed_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE exam_sessions \
             SET score = $1, domain_weakness = $2, detailed_feedback = $3, completed_at = $4, status = $5 \
             WHERE id = $6",
        )
        .bind(report.score)
        .bind(Json(&report.domain_weakness))
        .bind(Json(&report.detailed_feedback))
        .bind(completed_at)
        .bind(SessionStatus::Completed.as_str())
        .bind(exam_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Exam session {} not found", exam_id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> PortResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn rollback(self: Box<Self>) -> PortResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

//=========================================================================================
// `SubmissionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SubmissionStore for PgGradingStore {
    async fn create_submission(&self, submission: &ExamSubmission) -> PortResult<ExamId> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let exam_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO exam_sessions (user_id, status) VALUES ($1, $2) RETURNING id",
        )
        .bind(submission.user_id)
        .bind(SessionStatus::Processing.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        for answer in &submission.answers {
            let time_taken_ms = i64::try_from(answer.time_taken_ms)
                .map_err(|e| PortError::Unexpected(format!("time_taken_ms out of range: {}", e)))?;
            sqlx::query(
                "INSERT INTO user_answers (exam_session_id, question_id, selected_option, time_taken_ms) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(exam_id)
            .bind(answer.question_id)
            .bind(&answer.selected_option)
            .bind(time_taken_ms)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(exam_id)
    }

    async fn fetch_session(&self, exam_id: ExamId) -> PortResult<ExamSession> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, status, score, domain_weakness, detailed_feedback, completed_at \
             FROM exam_sessions WHERE id = $1",
        )
        .bind(exam_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Exam session {} not found", exam_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }
}
