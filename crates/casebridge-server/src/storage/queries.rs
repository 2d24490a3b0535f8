//! Identity-map queries.
//!
//! Every write is atomic at single-mapping granularity. There is no
//! cross-invocation locking anywhere in the server; concurrent duplicate
//! events are handled by the conditional, newer-timestamp-wins updates here.

use casebridge_core::db::{DatabaseError, unix_timestamp};

use super::db::SyncDatabase;
use super::models::{IdentityMapping, MappingStatus};

impl SyncDatabase {
    /// Insert a new mapping with `status = open`.
    ///
    /// Returns `false` when a mapping for this ticket already exists (a
    /// concurrent duplicate delivery won the race); the row is untouched.
    pub async fn insert_mapping(
        &self,
        helpdesk_ticket_id: &str,
        cloud_case_id: &str,
        synced_at: i64,
    ) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO identity_mappings \
             (helpdesk_ticket_id, cloud_case_id, status, created_at, last_synced_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(helpdesk_ticket_id) DO NOTHING",
        )
        .bind(helpdesk_ticket_id)
        .bind(cloud_case_id)
        .bind(MappingStatus::Open.as_str())
        .bind(now)
        .bind(synced_at)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite-by-key upsert of a full mapping row.
    pub async fn put_mapping(&self, mapping: &IdentityMapping) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT OR REPLACE INTO identity_mappings \
             (helpdesk_ticket_id, cloud_case_id, status, created_at, last_synced_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&mapping.helpdesk_ticket_id)
        .bind(&mapping.cloud_case_id)
        .bind(&mapping.status)
        .bind(mapping.created_at)
        .bind(mapping.last_synced_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Forward lookup by helpdesk ticket id.
    pub async fn get_by_helpdesk_id(
        &self,
        helpdesk_ticket_id: &str,
    ) -> Result<Option<IdentityMapping>, DatabaseError> {
        let mapping = sqlx::query_as::<_, IdentityMapping>(
            "SELECT * FROM identity_mappings WHERE helpdesk_ticket_id = ?",
        )
        .bind(helpdesk_ticket_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(mapping)
    }

    /// Reverse lookup by cloud case id, backed by the unique index.
    pub async fn get_by_cloud_case_id(
        &self,
        cloud_case_id: &str,
    ) -> Result<Option<IdentityMapping>, DatabaseError> {
        let mapping = sqlx::query_as::<_, IdentityMapping>(
            "SELECT * FROM identity_mappings WHERE cloud_case_id = ?",
        )
        .bind(cloud_case_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(mapping)
    }

    /// Conditionally set the mapping status.
    ///
    /// No-ops (returns `false`) unless `synced_at` is strictly newer than the
    /// stored `last_synced_at`, so out-of-order duplicates cannot regress
    /// state.
    pub async fn update_status(
        &self,
        helpdesk_ticket_id: &str,
        status: MappingStatus,
        synced_at: i64,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE identity_mappings SET status = ?, last_synced_at = ? \
             WHERE helpdesk_ticket_id = ? AND last_synced_at < ?",
        )
        .bind(status.as_str())
        .bind(synced_at)
        .bind(helpdesk_ticket_id)
        .bind(synced_at)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Advance `last_synced_at` without touching the status; same strictly-
    /// newer rule as [`Self::update_status`].
    pub async fn touch_synced(
        &self,
        helpdesk_ticket_id: &str,
        synced_at: i64,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE identity_mappings SET last_synced_at = ? \
             WHERE helpdesk_ticket_id = ? AND last_synced_at < ?",
        )
        .bind(synced_at)
        .bind(helpdesk_ticket_id)
        .bind(synced_at)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
