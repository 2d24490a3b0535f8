//! Dead-letter records for events that exhausted their retry budget.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use casebridge_core::db::unix_timestamp;
use casebridge_core::{SyncError, SyncEvent};

/// An event the bus gave up on, plus failure metadata for operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    pub id: String,
    /// Name of the handler whose invocations were exhausted.
    pub handler: String,
    /// The original event, unmodified.
    pub event: SyncEvent,
    /// Number of invocation attempts made.
    pub attempts: u32,
    /// Classification of the last failure (`transient`, `permanent`, ...).
    pub classification: String,
    /// Display form of the last error.
    pub last_error: String,
    pub created_at: i64,
}

impl DeadLetter {
    pub fn new(handler: &str, event: SyncEvent, attempts: u32, last_error: &SyncError) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            handler: handler.to_string(),
            event,
            attempts,
            classification: last_error.classification().to_string(),
            last_error: last_error.to_string(),
            created_at: unix_timestamp(),
        }
    }
}

/// Durable sink for dead letters.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn record(&self, dead: DeadLetter) -> Result<(), SyncError>;
}

/// In-memory sink, for tests and local runs without persistence.
#[derive(Default)]
pub struct MemoryDeadLetterSink {
    records: std::sync::Mutex<Vec<DeadLetter>>,
}

impl MemoryDeadLetterSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn drain(&self) -> Vec<DeadLetter> {
        self.records
            .lock()
            .map(|mut r| std::mem::take(&mut *r))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DeadLetterSink for MemoryDeadLetterSink {
    async fn record(&self, dead: DeadLetter) -> Result<(), SyncError> {
        if let Ok(mut records) = self.records.lock() {
            records.push(dead);
        }
        Ok(())
    }
}
