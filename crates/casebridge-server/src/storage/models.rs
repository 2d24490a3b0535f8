//! Data models for CaseBridge sync storage.

use serde::{Deserialize, Serialize};

/// One row of the identity map: the durable correlation between a helpdesk
/// ticket and the cloud support case opened for it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IdentityMapping {
    pub helpdesk_ticket_id: String,
    pub cloud_case_id: String,
    /// `open` or `resolved`; see [`MappingStatus`].
    pub status: String,
    pub created_at: i64,
    pub last_synced_at: i64,
}

impl IdentityMapping {
    pub fn is_resolved(&self) -> bool {
        self.status == MappingStatus::Resolved.as_str()
    }
}

/// Lifecycle status of an identity mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingStatus {
    Open,
    Resolved,
}

impl MappingStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dead-lettered event with its failure metadata, as stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeadLetterRow {
    pub id: String,
    pub handler: String,
    /// Original `SyncEvent` as JSON.
    pub payload: String,
    pub attempts: i64,
    pub classification: String,
    pub last_error: String,
    pub created_at: i64,
}
