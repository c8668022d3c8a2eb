pub mod consumer;
pub mod dispatcher;
pub mod handler;

// Re-export the main job types so the binaries can wire them up directly.
pub use consumer::{ProcessedJob, Worker};
pub use dispatcher::JobDispatcher;
pub use handler::{GradingJobHandler, JobOutcome};
