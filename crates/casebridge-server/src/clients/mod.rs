//! Outbound API capability traits and their reqwest implementations.
//!
//! Handlers depend on the traits, never on the HTTP clients directly, so the
//! state machines are testable without a network.

mod cloud;
mod helpdesk;


use async_trait::async_trait;

use casebridge_core::SyncError;

pub use cloud::{CloudSupportClient, CloudSupportConfig};
pub use helpdesk::{HelpdeskClient, HelpdeskConfig};

/// Fields used to open a cloud support case.
#[derive(Debug, Clone)]
pub struct NewCaseRequest {
    pub subject: String,
    pub severity_code: String,
    pub service_code: String,
    pub category_code: String,
    pub description: String,
    pub requester_email: Option<String>,
}

/// The cloud provider's support-case API.
#[async_trait]
pub trait SupportCaseApi: Send + Sync {
    /// Open a case; returns the provider's case id.
    async fn create_case(&self, request: &NewCaseRequest) -> Result<String, SyncError>;

    /// Append a communication to an open case.
    async fn add_communication(&self, case_id: &str, body: &str) -> Result<(), SyncError>;

    /// Resolve the case.
    async fn resolve_case(&self, case_id: &str) -> Result<(), SyncError>;
}

/// The helpdesk ticketing API.
#[async_trait]
pub trait TicketApi: Send + Sync {
    /// Add a public comment to a ticket.
    async fn add_comment(&self, ticket_id: &str, comment: &str) -> Result<(), SyncError>;

    /// Mark the ticket solved, with a closing comment.
    async fn solve(&self, ticket_id: &str, comment: &str) -> Result<(), SyncError>;
}

/// Map an HTTP response status to the sync failure taxonomy.
///
/// Rate limits and 5xx are worth redelivering; the rest of 4xx means the
/// request itself is bad and retrying repeats the outcome.
pub(crate) fn classify_status(status: reqwest::StatusCode, context: &str) -> SyncError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        SyncError::Transient(format!("{context}: HTTP {status}"))
    } else {
        SyncError::Permanent(format!("{context}: HTTP {status}"))
    }
}

/// Map a reqwest transport error (connect failure, timeout) to the taxonomy.
///
/// Transport-level failures are always transient.
pub(crate) fn classify_transport(err: &reqwest::Error, context: &str) -> SyncError {
    SyncError::Transient(format!("{context}: {err}"))
}
