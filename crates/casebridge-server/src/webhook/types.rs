//! Wire types for the webhook ingress.

use serde::Deserialize;

use casebridge_core::SyncEvent;
use casebridge_core::db::unix_timestamp;

/// Helpdesk webhook payload, shared by the create/update/solved endpoints.
///
/// The helpdesk sends the same flat body to every endpoint; which fields are
/// meaningful depends on the route. `occurred_at` is optional because older
/// webhook configurations omit it; ingestion time is used as a fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketWebhook {
    pub ticket_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub severity_code: String,
    #[serde(default)]
    pub service_code: String,
    #[serde(default)]
    pub category_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub requester_email: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<i64>,
}

impl TicketWebhook {
    fn occurred_at(&self) -> i64 {
        self.occurred_at.unwrap_or_else(unix_timestamp)
    }

    pub fn into_created_event(self) -> SyncEvent {
        let occurred_at = self.occurred_at();
        SyncEvent::TicketCreated {
            ticket_id: self.ticket_id,
            subject: self.subject,
            severity_code: self.severity_code,
            service_code: self.service_code,
            category_code: self.category_code,
            description: self.description,
            requester_email: self.requester_email,
            occurred_at,
        }
    }

    pub fn into_updated_event(self) -> SyncEvent {
        let occurred_at = self.occurred_at();
        SyncEvent::TicketUpdated {
            ticket_id: self.ticket_id,
            comment: self.comment,
            occurred_at,
        }
    }

    pub fn into_resolved_event(self) -> SyncEvent {
        let occurred_at = self.occurred_at();
        let comment = if self.comment.is_empty() {
            None
        } else {
            Some(self.comment)
        };
        SyncEvent::TicketResolved {
            ticket_id: self.ticket_id,
            comment,
            occurred_at,
        }
    }
}

/// Cloud-provider case notification delivered to `/case-event`.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseWebhook {
    pub case_id: String,
    pub kind: CaseEventKind,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub occurred_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseEventKind {
    Opened,
    StatusChanged,
    Resolved,
}

impl CaseWebhook {
    pub fn into_event(self) -> SyncEvent {
        let occurred_at = self.occurred_at.unwrap_or_else(unix_timestamp);
        match self.kind {
            CaseEventKind::Opened => SyncEvent::CaseOpened {
                case_id: self.case_id,
                occurred_at,
            },
            CaseEventKind::StatusChanged => SyncEvent::CaseStatusChanged {
                case_id: self.case_id,
                status: self.status,
                message: self.message,
                occurred_at,
            },
            CaseEventKind::Resolved => {
                let message = if self.message.is_empty() {
                    None
                } else {
                    Some(self.message)
                };
                SyncEvent::CaseResolved {
                    case_id: self.case_id,
                    message,
                    occurred_at,
                }
            }
        }
    }
}
