//! Helpdesk → cloud sync: ticket events open, update, and resolve cloud
//! support cases.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use casebridge_bus::EventHandler;
use casebridge_core::{SyncError, SyncEvent};

use crate::clients::{NewCaseRequest, SupportCaseApi};
use crate::storage::{MappingStatus, SyncDatabase};

/// Consumes helpdesk-sourced events and mirrors them onto the cloud
/// support-case API, recording the identity mapping on first sight of a
/// ticket.
pub struct HelpdeskToCloudHandler {
    db: SyncDatabase,
    cloud: Arc<dyn SupportCaseApi>,
}

impl HelpdeskToCloudHandler {
    pub fn new(db: SyncDatabase, cloud: Arc<dyn SupportCaseApi>) -> Self {
        Self { db, cloud }
    }

    async fn on_ticket_created(
        &self,
        ticket_id: &str,
        request: NewCaseRequest,
        occurred_at: i64,
    ) -> Result<(), SyncError> {
        if self.db.get_by_helpdesk_id(ticket_id).await?.is_some() {
            // Duplicate delivery: the case already exists.
            debug!(ticket_id = %ticket_id, "Mapping exists, ignoring duplicate creation event");
            return Ok(());
        }

        let case_id = self.cloud.create_case(&request).await?;

        let inserted = self
            .db
            .insert_mapping(ticket_id, &case_id, occurred_at)
            .await?;
        if inserted {
            info!(
                ticket_id = %ticket_id,
                case_id = %case_id,
                "Identity mapping recorded"
            );
        } else {
            // A concurrent duplicate invocation created the mapping between
            // our lookup and insert; its case won, ours is now orphaned on
            // the cloud side.
            warn!(
                ticket_id = %ticket_id,
                case_id = %case_id,
                "Concurrent creation lost the insert race, keeping existing mapping"
            );
        }
        Ok(())
    }

    async fn on_ticket_updated(
        &self,
        ticket_id: &str,
        comment: &str,
        occurred_at: i64,
    ) -> Result<(), SyncError> {
        let Some(mapping) = self.db.get_by_helpdesk_id(ticket_id).await? else {
            // Never fabricate a case; surface the gap so the event
            // dead-letters for manual reconciliation.
            return Err(SyncError::ConsistencyGap(format!(
                "update for ticket {ticket_id} with no identity mapping"
            )));
        };

        // Same newer-wins rule as the cloud side: a redelivery whose
        // timestamp is not past the sync cursor was already posted.
        if occurred_at <= mapping.last_synced_at {
            debug!(ticket_id = %ticket_id, "Stale ticket update, already applied");
            return Ok(());
        }

        self.cloud
            .add_communication(&mapping.cloud_case_id, comment)
            .await?;
        self.db.touch_synced(ticket_id, occurred_at).await?;
        Ok(())
    }

    async fn on_ticket_resolved(&self, ticket_id: &str, occurred_at: i64) -> Result<(), SyncError> {
        let Some(mapping) = self.db.get_by_helpdesk_id(ticket_id).await? else {
            debug!(ticket_id = %ticket_id, "No mapping for resolved ticket, nothing to resolve");
            return Ok(());
        };

        if mapping.is_resolved() {
            debug!(ticket_id = %ticket_id, "Mapping already resolved, ignoring duplicate");
            return Ok(());
        }

        self.cloud.resolve_case(&mapping.cloud_case_id).await?;
        self.db
            .update_status(ticket_id, MappingStatus::Resolved, occurred_at)
            .await?;
        info!(
            ticket_id = %ticket_id,
            case_id = %mapping.cloud_case_id,
            "Cloud case resolved from helpdesk"
        );
        Ok(())
    }
}

#[async_trait]
impl EventHandler for HelpdeskToCloudHandler {
    fn name(&self) -> &'static str {
        "helpdesk-to-cloud"
    }

    async fn handle(&self, event: &SyncEvent) -> Result<(), SyncError> {
        match event {
            SyncEvent::TicketCreated {
                ticket_id,
                subject,
                severity_code,
                service_code,
                category_code,
                description,
                requester_email,
                occurred_at,
            } => {
                let request = NewCaseRequest {
                    subject: subject.clone(),
                    severity_code: severity_code.clone(),
                    service_code: service_code.clone(),
                    category_code: category_code.clone(),
                    description: description.clone(),
                    requester_email: requester_email.clone(),
                };
                self.on_ticket_created(ticket_id, request, *occurred_at)
                    .await
            }
            SyncEvent::TicketUpdated {
                ticket_id,
                comment,
                occurred_at,
            } => self.on_ticket_updated(ticket_id, comment, *occurred_at).await,
            SyncEvent::TicketResolved {
                ticket_id,
                occurred_at,
                ..
            } => self.on_ticket_resolved(ticket_id, *occurred_at).await,
            // Cloud-sourced events belong to the other subscription; seeing
            // one here is harmless.
            SyncEvent::CaseOpened { .. }
            | SyncEvent::CaseStatusChanged { .. }
            | SyncEvent::CaseResolved { .. } => Ok(()),
        }
    }
}
