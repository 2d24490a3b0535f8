//! Bearer-token authenticator for the webhook ingress.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::{debug, warn};

use casebridge_core::secrets::SecretCache;

/// Outcome of authenticating one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// Credential matched the expected bearer secret.
    Allow,
    /// Missing, malformed, or mismatched credential.
    Deny,
}

/// Validates `Authorization: Bearer <token>` against the webhook secret.
///
/// The secret comes from the process-scoped [`SecretCache`]: it is fetched
/// once and held for the process lifetime, so a rotation needs new process
/// instances (or a `refresh()` from a lifecycle hook) to take effect. The
/// authenticator never mutates the identity map or the bus.
pub struct BearerAuthenticator {
    secrets: Arc<SecretCache>,
    secret_name: String,
}

impl BearerAuthenticator {
    pub const fn new(secrets: Arc<SecretCache>, secret_name: String) -> Self {
        Self {
            secrets,
            secret_name,
        }
    }

    /// Authenticate one request from its headers.
    pub fn check(&self, headers: &HeaderMap) -> AuthDecision {
        let Ok(expected) = self.secrets.get(&self.secret_name) else {
            warn!(secret = %self.secret_name, "Webhook secret unavailable, denying request");
            return AuthDecision::Deny;
        };

        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match presented {
            Some(token) if constant_time_compare(token, &expected) => {
                debug!("Webhook request authenticated");
                AuthDecision::Allow
            }
            Some(_) => {
                warn!("Webhook bearer token mismatch");
                AuthDecision::Deny
            }
            None => {
                warn!("Webhook request missing or malformed Authorization header");
                AuthDecision::Deny
            }
        }
    }
}

/// Constant-time string comparison to prevent timing side-channels.
///
/// Both inputs are compared padded to the longer length so neither content
/// nor length leaks through timing; `subtle` keeps the comparison itself
/// constant-time.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    let max_len = std::cmp::max(a.len(), b.len());

    // Different pad bytes guarantee a mismatch when lengths differ.
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}
