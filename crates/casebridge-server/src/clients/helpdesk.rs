//! Helpdesk ticketing API client.
//!
//! Ticket updates go through a single `PUT /api/v2/tickets/{id}.json` with a
//! comment body and an optional `solved` status, mirroring the platform's
//! ticket-update endpoint.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::info;

use casebridge_core::SyncError;

use super::{TicketApi, classify_status, classify_transport};

/// Configuration for the helpdesk API.
#[derive(Debug, Clone)]
pub struct HelpdeskConfig {
    /// Instance base URL (e.g. "<https://acme.helpdesk.example>").
    pub base_url: String,
    /// OAuth access token, fetched from the secret store by the caller.
    pub token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// REST client for the helpdesk ticket-update endpoint.
#[derive(Debug)]
pub struct HelpdeskClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct TicketUpdateBody<'a> {
    ticket: TicketUpdate<'a>,
}

#[derive(Serialize)]
struct TicketUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    comment: TicketComment<'a>,
}

#[derive(Serialize)]
struct TicketComment<'a> {
    body: &'a str,
}

impl HelpdeskClient {
    /// Create a new helpdesk API client.
    pub fn new(config: &HelpdeskConfig) -> Result<Self, SyncError> {
        if config.base_url.is_empty() {
            return Err(SyncError::Permanent("helpdesk base_url is empty".into()));
        }
        if config.token.is_empty() {
            return Err(SyncError::Permanent("helpdesk API token is empty".into()));
        }

        let mut headers = HeaderMap::new();
        let token_val = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| SyncError::Permanent("Invalid helpdesk token format".into()))?;
        headers.insert(AUTHORIZATION, token_val);

        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Permanent(format!("helpdesk client build: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub(crate) fn ticket_url(&self, ticket_id: &str) -> String {
        format!("{}/api/v2/tickets/{ticket_id}.json", self.base_url)
    }

    async fn update_ticket(
        &self,
        ticket_id: &str,
        comment: &str,
        solve: bool,
    ) -> Result<(), SyncError> {
        let url = self.ticket_url(ticket_id);
        let body = TicketUpdateBody {
            ticket: TicketUpdate {
                status: solve.then_some("solved"),
                comment: TicketComment { body: comment },
            },
        };

        let resp = self
            .http
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&e, "update ticket"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(status, "update ticket"));
        }

        info!(ticket_id = %ticket_id, solved = solve, "Helpdesk ticket updated");
        Ok(())
    }
}

#[async_trait]
impl TicketApi for HelpdeskClient {
    async fn add_comment(&self, ticket_id: &str, comment: &str) -> Result<(), SyncError> {
        self.update_ticket(ticket_id, comment, false).await
    }

    async fn solve(&self, ticket_id: &str, comment: &str) -> Result<(), SyncError> {
        self.update_ticket(ticket_id, comment, true).await
    }
}
