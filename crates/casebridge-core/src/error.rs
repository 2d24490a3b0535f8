//! Error taxonomy for the sync engine.
//!
//! The bus redelivers on any handler failure, so the taxonomy exists for
//! operators: a `Transient` failure is expected to succeed on redelivery, a
//! `Permanent` or `ConsistencyGap` failure will repeat the same outcome until
//! the retry cap diverts the event to the dead-letter sink.

use thiserror::Error;

use crate::db::DatabaseError;

/// Result type alias using the sync error taxonomy.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Failure classification for sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Bad or missing credential; terminates at the ingress boundary,
    /// never reaches the bus.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    /// Timeout, rate limit, or 5xx-equivalent from an upstream API or the
    /// store; safe to redeliver.
    #[error("transient upstream failure: {0}")]
    Transient(String),

    /// Validation or 4xx-equivalent; redelivery will not help.
    #[error("permanent upstream failure: {0}")]
    Permanent(String),

    /// An update/resolve event references a ticket or case with no identity
    /// mapping; signals a missed creation event.
    #[error("consistency gap: {0}")]
    ConsistencyGap(String),
}

impl SyncError {
    /// Short classification label used in logs and dead-letter records.
    pub const fn classification(&self) -> &'static str {
        match self {
            Self::AuthRejected(_) => "auth_rejected",
            Self::Transient(_) => "transient",
            Self::Permanent(_) => "permanent",
            Self::ConsistencyGap(_) => "consistency_gap",
        }
    }

    /// Whether redelivery is expected to change the outcome.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

// Store hiccups (lock contention, I/O) are retryable by redelivery.
impl From<DatabaseError> for SyncError {
    fn from(e: DatabaseError) -> Self {
        Self::Transient(format!("store: {e}"))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        Self::Permanent(format!("payload encoding: {e}"))
    }
}
