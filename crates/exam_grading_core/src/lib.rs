pub mod aggregator;
pub mod comparator;
pub mod domain;
pub mod grading;
pub mod kpi;
pub mod ports;

pub use domain::{
    AnswerId, AnswerSubmission, DetailedFeedback, DomainStat, ExamId, ExamReport, ExamSession,
    ExamSubmission, GradingJob, JobAction, SessionStatus, SubmittedAnswer,
};
pub use grading::{grade_answers, GradedExam, GradingError};
pub use ports::{
    GradingStore, GradingUnit, JobQueue, PortError, PortResult, QueueMessage, SubmissionStore,
};
