pub mod db;
pub mod queue;

pub use db::{connect_with_retry, PgGradingStore};
pub use queue::PgJobQueue;
