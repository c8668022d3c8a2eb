//! crates/exam_grading_core/src/grading.rs
//!
//! Pure grading of one exam: compares every answer, aggregates per domain and
//! synthesizes the report. Storage is left to the caller.

use crate::aggregator::DomainAggregator;
use crate::comparator::is_correct;
use crate::domain::{AnswerId, ExamId, ExamReport, SubmittedAnswer};
use crate::kpi::synthesize;
use crate::ports::PortError;

/// Errors that end a grading run.
#[derive(Debug, thiserror::Error)]
pub enum GradingError {
    /// No answers exist for the exam.
    #[error("No submitted answers found for exam {0}")]
    EmptyAnswerSet(ExamId),

    /// The record store failed at some step of the run. The run is rolled
    /// back and only a resubmitted job grades the exam again.
    #[error("Store error: {0}")]
    Store(#[from] PortError),
}

/// The output of grading: a correctness verdict per answer plus the report.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedExam {
    pub verdicts: Vec<(AnswerId, bool)>,
    pub report: ExamReport,
}

/// Grades a set of answers.
///
/// Returns `EmptyAnswerSet` for an empty slice; the report for zero questions
/// is never produced.
pub fn grade_answers(exam_id: ExamId, answers: &[SubmittedAnswer]) -> Result<GradedExam, GradingError> {
    if answers.is_empty() {
        return Err(GradingError::EmptyAnswerSet(exam_id));
    }

    let mut aggregator = DomainAggregator::new();
    let mut verdicts = Vec::with_capacity(answers.len());

    for answer in answers {
        let correct = is_correct(&answer.selected_option, &answer.correct_option);
        verdicts.push((answer.answer_id, correct));
        aggregator.record(&answer.domain, correct, Some(answer.time_taken_ms));
    }

    let report = synthesize(
        aggregator.total_questions(),
        aggregator.correct_count(),
        aggregator.total_time_ms(),
        aggregator.stats(),
    );

    Ok(GradedExam { verdicts, report })
}
