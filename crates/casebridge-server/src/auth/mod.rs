//! Inbound webhook authentication.
//!
//! Validates the shared-secret bearer credential before any event is
//! accepted onto the bus. A rejection terminates at this boundary; nothing
//! is published.

mod bearer;

pub use bearer::{AuthDecision, BearerAuthenticator, constant_time_compare};
