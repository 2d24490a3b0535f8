//! Axum routes for the webhook ingress.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use casebridge_bus::EventBus;
use casebridge_core::SyncEvent;

use crate::auth::{AuthDecision, BearerAuthenticator};

use super::types::{CaseWebhook, TicketWebhook};

#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<EventBus>,
    pub auth: Arc<BearerAuthenticator>,
}

/// Build the ingress router.
///
/// The three ticket endpoints mirror the helpdesk's webhook targets; the
/// case-event endpoint receives provider-side notifications. Everything
/// except the health probe requires the shared bearer secret.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/create", post(ticket_created))
        .route("/update", post(ticket_updated))
        .route("/solved", post(ticket_solved))
        .route("/case-event", post(case_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn ticket_created(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    accept(&state, &headers, &body, TicketWebhook::into_created_event).await
}

async fn ticket_updated(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    accept(&state, &headers, &body, TicketWebhook::into_updated_event).await
}

async fn ticket_solved(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    accept(&state, &headers, &body, TicketWebhook::into_resolved_event).await
}

async fn case_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    accept(&state, &headers, &body, CaseWebhook::into_event).await
}

/// Authenticate, then parse the body, then hand the event to the bus.
///
/// The bearer check runs on the raw headers before any byte of the body is
/// deserialized; an unauthenticated request is answered 401 no matter what
/// the body contains.
///
/// Acceptance means "queued for delivery", not "synced": a 200 is returned
/// as soon as the event is on the bus, and delivery failures are handled by
/// the bus's retry and dead-letter machinery.
async fn accept<T, F>(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    to_event: F,
) -> StatusCode
where
    T: DeserializeOwned,
    F: FnOnce(T) -> SyncEvent,
{
    if state.auth.check(headers) == AuthDecision::Deny {
        return StatusCode::UNAUTHORIZED;
    }

    let payload: T = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "Rejecting webhook with malformed body");
            return StatusCode::UNPROCESSABLE_ENTITY;
        }
    };
    let event = to_event(payload);

    match state.bus.publish(&event).await {
        Ok(delivered) => {
            info!(
                kind = event.kind(),
                native_id = event.native_id(),
                subscribers = delivered,
                "Webhook event accepted"
            );
            StatusCode::OK
        }
        Err(err) => {
            error!(kind = event.kind(), error = %err, "Failed to enqueue webhook event");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
