//! Dead-letter table queries.
//!
//! Write path is used by the bus when a handler's retry budget is exhausted;
//! the read path is an operator surface only.

use casebridge_bus::DeadLetter;
use casebridge_core::db::DatabaseError;

use super::db::SyncDatabase;
use super::models::DeadLetterRow;

impl SyncDatabase {
    /// Persist one dead letter. The event travels as its JSON encoding.
    pub async fn record_dead_letter(&self, dead: &DeadLetter) -> Result<(), DatabaseError> {
        let payload = serde_json::to_string(&dead.event)
            .map_err(|e| DatabaseError::Query(format!("encode dead letter payload: {e}")))?;

        sqlx::query(
            "INSERT INTO dead_letters \
             (id, handler, payload, attempts, classification, last_error, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&dead.id)
        .bind(&dead.handler)
        .bind(payload)
        .bind(i64::from(dead.attempts))
        .bind(&dead.classification)
        .bind(&dead.last_error)
        .bind(dead.created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Most recent dead letters, newest first.
    pub async fn list_dead_letters(&self, limit: i64) -> Result<Vec<DeadLetterRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, DeadLetterRow>(
            "SELECT * FROM dead_letters ORDER BY created_at DESC, id LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }
}
