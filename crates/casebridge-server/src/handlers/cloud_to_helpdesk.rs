//! Cloud → helpdesk sync: support-engineer activity on a case is posted
//! back onto the originating helpdesk ticket.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use casebridge_bus::EventHandler;
use casebridge_core::{SyncError, SyncEvent};

use crate::clients::TicketApi;
use crate::storage::{IdentityMapping, MappingStatus, SyncDatabase};

/// Consumes cloud-sourced case events, resolves the mapped helpdesk ticket
/// via the reverse lookup, and posts the corresponding update.
///
/// Cases with no mapping did not originate from this system (opened directly
/// in the provider console) and are skipped without error. Replays are
/// filtered by the newer-timestamp rule: an event not strictly newer than
/// the mapping's `last_synced_at` has already been applied.
pub struct CloudToHelpdeskHandler {
    db: SyncDatabase,
    helpdesk: Arc<dyn TicketApi>,
}

impl CloudToHelpdeskHandler {
    pub fn new(db: SyncDatabase, helpdesk: Arc<dyn TicketApi>) -> Self {
        Self { db, helpdesk }
    }

    async fn mapping_for(&self, case_id: &str) -> Result<Option<IdentityMapping>, SyncError> {
        let mapping = self.db.get_by_cloud_case_id(case_id).await?;
        if mapping.is_none() {
            debug!(case_id = %case_id, "Case has no mapping, not ours to sync");
        }
        Ok(mapping)
    }

    fn already_applied(mapping: &IdentityMapping, occurred_at: i64) -> bool {
        occurred_at <= mapping.last_synced_at
    }

    async fn on_case_opened(&self, case_id: &str, occurred_at: i64) -> Result<(), SyncError> {
        let Some(mapping) = self.mapping_for(case_id).await? else {
            return Ok(());
        };
        // Confirmation of a case we opened; just advance the sync cursor.
        self.db
            .touch_synced(&mapping.helpdesk_ticket_id, occurred_at)
            .await?;
        Ok(())
    }

    async fn on_status_changed(
        &self,
        case_id: &str,
        status: &str,
        message: &str,
        occurred_at: i64,
    ) -> Result<(), SyncError> {
        let Some(mapping) = self.mapping_for(case_id).await? else {
            return Ok(());
        };
        if Self::already_applied(&mapping, occurred_at) {
            debug!(case_id = %case_id, "Stale status change, already applied");
            return Ok(());
        }

        let comment = format!("Support case status changed to \"{status}\": {message}");
        self.helpdesk
            .add_comment(&mapping.helpdesk_ticket_id, &comment)
            .await?;
        self.db
            .touch_synced(&mapping.helpdesk_ticket_id, occurred_at)
            .await?;
        Ok(())
    }

    async fn on_case_resolved(
        &self,
        case_id: &str,
        message: Option<&str>,
        occurred_at: i64,
    ) -> Result<(), SyncError> {
        let Some(mapping) = self.mapping_for(case_id).await? else {
            return Ok(());
        };
        if Self::already_applied(&mapping, occurred_at) {
            debug!(case_id = %case_id, "Stale resolution, already applied");
            return Ok(());
        }

        let comment = message.map_or_else(
            || "Support case resolved by the provider.".to_string(),
            |m| format!("Support case resolved by the provider: {m}"),
        );
        self.helpdesk
            .solve(&mapping.helpdesk_ticket_id, &comment)
            .await?;
        self.db
            .update_status(&mapping.helpdesk_ticket_id, MappingStatus::Resolved, occurred_at)
            .await?;
        info!(
            case_id = %case_id,
            ticket_id = %mapping.helpdesk_ticket_id,
            "Helpdesk ticket solved from cloud case resolution"
        );
        Ok(())
    }
}

#[async_trait]
impl EventHandler for CloudToHelpdeskHandler {
    fn name(&self) -> &'static str {
        "cloud-to-helpdesk"
    }

    async fn handle(&self, event: &SyncEvent) -> Result<(), SyncError> {
        match event {
            SyncEvent::CaseOpened {
                case_id,
                occurred_at,
            } => self.on_case_opened(case_id, *occurred_at).await,
            SyncEvent::CaseStatusChanged {
                case_id,
                status,
                message,
                occurred_at,
            } => {
                self.on_status_changed(case_id, status, message, *occurred_at)
                    .await
            }
            SyncEvent::CaseResolved {
                case_id,
                message,
                occurred_at,
            } => {
                self.on_case_resolved(case_id, message.as_deref(), *occurred_at)
                    .await
            }
            SyncEvent::TicketCreated { .. }
            | SyncEvent::TicketUpdated { .. }
            | SyncEvent::TicketResolved { .. } => Ok(()),
        }
    }
}
