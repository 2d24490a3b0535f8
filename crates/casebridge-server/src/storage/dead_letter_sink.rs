//! Durable dead-letter sink backed by the sync database.

use async_trait::async_trait;

use casebridge_bus::{DeadLetter, DeadLetterSink};
use casebridge_core::SyncError;

use super::db::SyncDatabase;

/// Adapts [`SyncDatabase`] to the bus's [`DeadLetterSink`] trait.
#[derive(Clone)]
pub struct SqliteDeadLetterSink {
    db: SyncDatabase,
}

impl SqliteDeadLetterSink {
    pub const fn new(db: SyncDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeadLetterSink for SqliteDeadLetterSink {
    async fn record(&self, dead: DeadLetter) -> Result<(), SyncError> {
        self.db.record_dead_letter(&dead).await?;
        Ok(())
    }
}
