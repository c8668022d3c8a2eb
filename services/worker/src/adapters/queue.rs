//! services/worker/src/adapters/queue.rs
//!
//! A Postgres-backed implementation of the `JobQueue` port. Messages live in the
//! `grading_jobs` table; claiming a message deletes it, so a message is
//! acknowledged as soon as it is received.

use async_trait::async_trait;
use exam_grading_core::domain::GradingJob;
use exam_grading_core::ports::{JobQueue, PortError, PortResult, QueueMessage};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

/// A queue adapter that implements the `JobQueue` port.
#[derive(Clone)]
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    /// Creates a new `PgJobQueue`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct JobRecord {
    id: i64,
    payload: Json<Value>,
}
impl JobRecord {
    fn to_domain(self) -> QueueMessage {
        QueueMessage {
            id: self.id,
            payload: self.payload.0,
        }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn publish(&self, queue: &str, job: &GradingJob) -> PortResult<()> {
        let payload = serde_json::to_value(job)?;
        sqlx::query("INSERT INTO grading_jobs (queue, payload) VALUES ($1, $2)")
            .bind(queue)
            .bind(Json(payload))
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn claim(&self, queue: &str) -> PortResult<Option<QueueMessage>> {
        // SKIP LOCKED lets several workers poll the same queue without
        // handing out the same message twice.
        let record = sqlx::query_as::<_, JobRecord>(
            "DELETE FROM grading_jobs \
             WHERE id = ( \
                 SELECT id FROM grading_jobs \
                 WHERE queue = $1 \
                 ORDER BY id \
                 FOR UPDATE SKIP LOCKED \
                 LIMIT 1 \
             ) \
             RETURNING id, payload",
        )
        .bind(queue)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(|r| r.to_domain()))
    }
}
