//! HTTP ingress: authenticated webhook endpoints feeding the event bus.

mod routes;
mod types;

pub use routes::{AppState, router};
pub use types::{CaseEventKind, CaseWebhook, TicketWebhook};
