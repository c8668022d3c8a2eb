//! In-memory implementations of the core ports for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_grading_core::domain::{
    AnswerId, ExamId, ExamReport, ExamSession, ExamSubmission, GradingJob, SessionStatus,
    SubmittedAnswer,
};
use exam_grading_core::ports::{
    GradingStore, GradingUnit, JobQueue, PortError, PortResult, QueueMessage, SubmissionStore,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

//=========================================================================================
// Record Store
//=========================================================================================

#[derive(Debug, Clone)]
pub struct QuestionRow {
    pub correct_option: String,
    pub domain: String,
}

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub user_id: i64,
    pub status: SessionStatus,
    pub report: Option<ExamReport>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct AnswerRow {
    pub exam_id: ExamId,
    pub question_id: i64,
    pub selected_option: String,
    pub time_taken_ms: u64,
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub questions: HashMap<i64, QuestionRow>,
    pub sessions: BTreeMap<ExamId, SessionRow>,
    pub answers: BTreeMap<AnswerId, AnswerRow>,
    next_session_id: ExamId,
    next_answer_id: AnswerId,
}

/// Where the store should fail, to exercise rollback paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Begin,
    LoadAnswers,
    SetAnswerCorrect,
    CompleteSession,
    Commit,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    fail_at: Arc<Mutex<Option<FailPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_question(&self, id: i64, correct_option: &str, domain: &str) {
        self.state.lock().unwrap().questions.insert(
            id,
            QuestionRow {
                correct_option: correct_option.to_string(),
                domain: domain.to_string(),
            },
        );
    }

    pub fn fail_at(&self, point: Option<FailPoint>) {
        *self.fail_at.lock().unwrap() = point;
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.lock().unwrap().clone()
    }

    pub fn session(&self, exam_id: ExamId) -> Option<SessionRow> {
        self.state.lock().unwrap().sessions.get(&exam_id).cloned()
    }

    pub fn answers_of(&self, exam_id: ExamId) -> Vec<AnswerRow> {
        self.state
            .lock()
            .unwrap()
            .answers
            .values()
            .filter(|a| a.exam_id == exam_id)
            .cloned()
            .collect()
    }

    fn check(&self, point: FailPoint) -> PortResult<()> {
        check(&self.fail_at, point)
    }
}

fn check(fail_at: &Mutex<Option<FailPoint>>, point: FailPoint) -> PortResult<()> {
    if *fail_at.lock().unwrap() == Some(point) {
        return Err(PortError::Unexpected(format!("injected failure at {:?}", point)));
    }
    Ok(())
}

/// A unit of work over a private copy of the state, published on commit.
pub struct MemoryUnit {
    shared: Arc<Mutex<StoreState>>,
    fail_at: Arc<Mutex<Option<FailPoint>>>,
    pending: StoreState,
}

#[async_trait]
impl GradingStore for MemoryStore {
    async fn begin(&self) -> PortResult<Box<dyn GradingUnit>> {
        self.check(FailPoint::Begin)?;
        let pending = self.state.lock().unwrap().clone();
        Ok(Box::new(MemoryUnit {
            shared: self.state.clone(),
            fail_at: self.fail_at.clone(),
            pending,
        }))
    }
}

#[async_trait]
impl GradingUnit for MemoryUnit {
    async fn load_answers(&mut self, exam_id: ExamId) -> PortResult<Vec<SubmittedAnswer>> {
        check(&self.fail_at, FailPoint::LoadAnswers)?;
        let answers = self
            .pending
            .answers
            .iter()
            .filter(|(_, a)| a.exam_id == exam_id)
            .filter_map(|(id, a)| {
                self.pending.questions.get(&a.question_id).map(|q| SubmittedAnswer {
                    answer_id: *id,
                    selected_option: a.selected_option.clone(),
                    correct_option: q.correct_option.clone(),
                    domain: q.domain.clone(),
                    time_taken_ms: a.time_taken_ms,
                })
            })
            .collect();
        Ok(answers)
    }

    async fn set_answer_correct(&mut self, answer_id: AnswerId, is_correct: bool) -> PortResult<()> {
        check(&self.fail_at, FailPoint::SetAnswerCorrect)?;
        if let Some(answer) = self.pending.answers.get_mut(&answer_id) {
            answer.is_correct = Some(is_correct);
        }
        Ok(())
    }

    async fn complete_session(
        &mut self,
        exam_id: ExamId,
        report: &ExamReport,
        completed_at: DateTime<Utc>,
    ) -> PortResult<()> {
        check(&self.fail_at, FailPoint::CompleteSession)?;
        let session = self
            .pending
            .sessions
            .get_mut(&exam_id)
            .ok_or_else(|| PortError::NotFound(format!("Exam session {} not found", exam_id)))?;
        session.status = SessionStatus::Completed;
        session.report = Some(report.clone());
        session.completed_at = Some(completed_at);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> PortResult<()> {
        check(&self.fail_at, FailPoint::Commit)?;
        let unit = *self;
        *unit.shared.lock().unwrap() = unit.pending;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> PortResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create_submission(&self, submission: &ExamSubmission) -> PortResult<ExamId> {
        let mut state = self.state.lock().unwrap();
        state.next_session_id += 1;
        let exam_id = state.next_session_id;
        state.sessions.insert(
            exam_id,
            SessionRow {
                user_id: submission.user_id,
                status: SessionStatus::Processing,
                report: None,
                completed_at: None,
            },
        );
        for answer in &submission.answers {
            state.next_answer_id += 1;
            let answer_id = state.next_answer_id;
            state.answers.insert(
                answer_id,
                AnswerRow {
                    exam_id,
                    question_id: answer.question_id,
                    selected_option: answer.selected_option.clone(),
                    time_taken_ms: answer.time_taken_ms,
                    is_correct: None,
                },
            );
        }
        Ok(exam_id)
    }

    async fn fetch_session(&self, exam_id: ExamId) -> PortResult<ExamSession> {
        let state = self.state.lock().unwrap();
        let row = state
            .sessions
            .get(&exam_id)
            .ok_or_else(|| PortError::NotFound(format!("Exam session {} not found", exam_id)))?;
        Ok(ExamSession {
            id: exam_id,
            status: row.status,
            report: row.report.clone(),
            completed_at: row.completed_at,
        })
    }
}

//=========================================================================================
// Queue
//=========================================================================================

#[derive(Clone, Default)]
pub struct MemoryQueue {
    queues: Arc<Mutex<HashMap<String, VecDeque<QueueMessage>>>>,
    next_id: Arc<Mutex<i64>>,
    fail_publish: Arc<Mutex<bool>>,
    fail_claims: Arc<Mutex<u32>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a raw payload, bypassing `GradingJob` encoding.
    pub fn push_raw(&self, queue: &str, payload: Value) {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        self.queues
            .lock()
            .unwrap()
            .entry(queue.to_string())
            .or_default()
            .push_back(QueueMessage {
                id: *next_id,
                payload,
            });
    }

    pub fn pending(&self, queue: &str) -> Vec<Value> {
        self.queues
            .lock()
            .unwrap()
            .get(queue)
            .map(|q| q.iter().map(|m| m.payload.clone()).collect())
            .unwrap_or_default()
    }

    pub fn fail_publish(&self, fail: bool) {
        *self.fail_publish.lock().unwrap() = fail;
    }

    /// Makes the next `count` claims fail.
    pub fn fail_next_claims(&self, count: u32) {
        *self.fail_claims.lock().unwrap() = count;
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn publish(&self, queue: &str, job: &GradingJob) -> PortResult<()> {
        if *self.fail_publish.lock().unwrap() {
            return Err(PortError::Unexpected("queue unavailable".to_string()));
        }
        self.push_raw(queue, serde_json::to_value(job)?);
        Ok(())
    }

    async fn claim(&self, queue: &str) -> PortResult<Option<QueueMessage>> {
        {
            let mut fail_claims = self.fail_claims.lock().unwrap();
            if *fail_claims > 0 {
                *fail_claims -= 1;
                return Err(PortError::Unexpected("queue unavailable".to_string()));
            }
        }
        Ok(self
            .queues
            .lock()
            .unwrap()
            .get_mut(queue)
            .and_then(|q| q.pop_front()))
    }
}
