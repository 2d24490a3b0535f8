//! Sync events exchanged between the helpdesk and cloud-support sides.
//!
//! Events are a closed tagged enum: every consumer matches exhaustively, so
//! an unhandled event kind is a compile error rather than a runtime branch
//! falling through on an unknown string discriminator.

use serde::{Deserialize, Serialize};

/// Originating system of a [`SyncEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventSource {
    /// The helpdesk ticketing platform (webhook side).
    Helpdesk,
    /// The cloud provider's support-case system.
    CloudSupport,
}

impl EventSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Helpdesk => "helpdesk",
            Self::CloudSupport => "cloud-support",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One synchronization event travelling on the bus.
///
/// Helpdesk-sourced events reference tickets by `ticket_id`; cloud-sourced
/// events reference cases by `case_id`. `occurred_at` is unix seconds and is
/// the only ordering signal; the bus itself guarantees no ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A ticket was created in the helpdesk.
    TicketCreated {
        ticket_id: String,
        subject: String,
        severity_code: String,
        service_code: String,
        category_code: String,
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        requester_email: Option<String>,
        occurred_at: i64,
    },
    /// A ticket received a new public comment or field change.
    TicketUpdated {
        ticket_id: String,
        comment: String,
        occurred_at: i64,
    },
    /// A ticket was marked solved in the helpdesk.
    TicketResolved {
        ticket_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
        occurred_at: i64,
    },
    /// The cloud provider acknowledged a newly opened case.
    CaseOpened { case_id: String, occurred_at: i64 },
    /// A support engineer changed the case status or replied.
    CaseStatusChanged {
        case_id: String,
        status: String,
        message: String,
        occurred_at: i64,
    },
    /// The case was resolved on the cloud side.
    CaseResolved {
        case_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        occurred_at: i64,
    },
}

impl SyncEvent {
    /// Which system emitted this event.
    pub const fn source(&self) -> EventSource {
        match self {
            Self::TicketCreated { .. } | Self::TicketUpdated { .. } | Self::TicketResolved { .. } => {
                EventSource::Helpdesk
            }
            Self::CaseOpened { .. } | Self::CaseStatusChanged { .. } | Self::CaseResolved { .. } => {
                EventSource::CloudSupport
            }
        }
    }

    /// Stable discriminator, matching the serde tag.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TicketCreated { .. } => "ticket_created",
            Self::TicketUpdated { .. } => "ticket_updated",
            Self::TicketResolved { .. } => "ticket_resolved",
            Self::CaseOpened { .. } => "case_opened",
            Self::CaseStatusChanged { .. } => "case_status_changed",
            Self::CaseResolved { .. } => "case_resolved",
        }
    }

    /// The native identifier in the originating system (ticket id or case id).
    pub fn native_id(&self) -> &str {
        match self {
            Self::TicketCreated { ticket_id, .. }
            | Self::TicketUpdated { ticket_id, .. }
            | Self::TicketResolved { ticket_id, .. } => ticket_id,
            Self::CaseOpened { case_id, .. }
            | Self::CaseStatusChanged { case_id, .. }
            | Self::CaseResolved { case_id, .. } => case_id,
        }
    }

    /// Unix timestamp (seconds) at which the event occurred.
    pub const fn occurred_at(&self) -> i64 {
        match self {
            Self::TicketCreated { occurred_at, .. }
            | Self::TicketUpdated { occurred_at, .. }
            | Self::TicketResolved { occurred_at, .. }
            | Self::CaseOpened { occurred_at, .. }
            | Self::CaseStatusChanged { occurred_at, .. }
            | Self::CaseResolved { occurred_at, .. } => *occurred_at,
        }
    }
}
