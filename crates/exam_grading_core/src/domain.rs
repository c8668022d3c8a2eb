//! crates/exam_grading_core/src/domain.rs
//!
//! Defines the pure, core data structures for exam grading.
//! These structs are independent of any database or queue implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of an exam session, as assigned by the record store.
pub type ExamId = i64;

/// Identifier of a single submitted answer row.
pub type AnswerId = i64;

/// One submitted answer joined with its question's authoritative answer and domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub answer_id: AnswerId,
    pub selected_option: String,
    pub correct_option: String,
    pub domain: String,
    pub time_taken_ms: u64,
}

/// Running statistics for one domain during a single grading run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainStat {
    pub correct: u32,
    pub total: u32,
    pub time_sum_ms: u64,
}

/// The human-readable part of a report, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedFeedback {
    pub avg_time_per_question_sec: f64,
    pub total_time_min: f64,
    pub best_domain: String,
    pub worst_domain: String,
    pub recommendations: Vec<String>,
}

/// The result of a successful grading run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamReport {
    pub score: f64,
    pub domain_weakness: BTreeMap<String, f64>,
    pub detailed_feedback: DetailedFeedback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Processing,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Processing => "PROCESSING",
            SessionStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(SessionStatus::Processing),
            "COMPLETED" => Ok(SessionStatus::Completed),
            other => Err(format!("unknown session status '{}'", other)),
        }
    }
}

/// An exam session as seen by the polling side.
///
/// `report` and `completed_at` are only populated once the session is `Completed`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamSession {
    pub id: ExamId,
    pub status: SessionStatus,
    pub report: Option<ExamReport>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// A single raw answer as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: i64,
    /// `"A"` or `"A,B"` for multi-select questions.
    pub selected_option: String,
    pub time_taken_ms: u64,
}

/// A complete exam submission: one user, all of their answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSubmission {
    pub user_id: i64,
    pub answers: Vec<AnswerSubmission>,
}

/// The action carried by a grading job message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    CalculateKpis,
}

/// The inbound job message: `{"exam_id": <integer>, "action": "calculate_kpis"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingJob {
    pub exam_id: ExamId,
    pub action: JobAction,
}

impl GradingJob {
    pub fn calculate_kpis(exam_id: ExamId) -> Self {
        Self {
            exam_id,
            action: JobAction::CalculateKpis,
        }
    }
}
