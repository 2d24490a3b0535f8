//! Cloud support-case REST client.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::info;

use casebridge_core::SyncError;

use super::{NewCaseRequest, SupportCaseApi, classify_status, classify_transport};

/// Configuration for the cloud support-case API.
#[derive(Debug, Clone)]
pub struct CloudSupportConfig {
    /// API base URL (e.g. "<https://support.cloud.example>").
    pub base_url: String,
    /// API token, fetched from the secret store by the caller.
    pub token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// REST client for the cloud provider's support-case endpoints.
#[derive(Debug)]
pub struct CloudSupportClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct CreateCaseBody<'a> {
    subject: &'a str,
    severity_code: &'a str,
    service_code: &'a str,
    category_code: &'a str,
    communication_body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc_email_addresses: Option<[&'a str; 1]>,
}

#[derive(Deserialize)]
struct CreateCaseResponse {
    case_id: String,
}

#[derive(Serialize)]
struct AddCommunicationBody<'a> {
    communication_body: &'a str,
}

impl CloudSupportClient {
    /// Create a new cloud support API client.
    pub fn new(config: &CloudSupportConfig) -> Result<Self, SyncError> {
        if config.base_url.is_empty() {
            return Err(SyncError::Permanent("cloud base_url is empty".into()));
        }
        if config.token.is_empty() {
            return Err(SyncError::Permanent("cloud API token is empty".into()));
        }

        let mut headers = HeaderMap::new();
        let token_val = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| SyncError::Permanent("Invalid cloud API token format".into()))?;
        headers.insert(AUTHORIZATION, token_val);

        // Ensure a TLS crypto provider is installed (reqwest uses rustls-no-provider).
        // The `Err` case just means it was already installed — safe to ignore.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Permanent(format!("cloud client build: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }
}

#[async_trait]
impl SupportCaseApi for CloudSupportClient {
    async fn create_case(&self, request: &NewCaseRequest) -> Result<String, SyncError> {
        let url = self.api_url("/cases");
        let body = CreateCaseBody {
            subject: &request.subject,
            severity_code: &request.severity_code,
            service_code: &request.service_code,
            category_code: &request.category_code,
            communication_body: &request.description,
            cc_email_addresses: request.requester_email.as_deref().map(|e| [e]),
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&e, "create case"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(status, "create case"));
        }

        let created: CreateCaseResponse = resp
            .json()
            .await
            .map_err(|e| classify_transport(&e, "create case response"))?;

        info!(case_id = %created.case_id, "Cloud support case opened");
        Ok(created.case_id)
    }

    async fn add_communication(&self, case_id: &str, body: &str) -> Result<(), SyncError> {
        let url = self.api_url(&format!("/cases/{case_id}/communications"));

        let resp = self
            .http
            .post(&url)
            .json(&AddCommunicationBody {
                communication_body: body,
            })
            .send()
            .await
            .map_err(|e| classify_transport(&e, "add communication"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(status, "add communication"));
        }
        Ok(())
    }

    async fn resolve_case(&self, case_id: &str) -> Result<(), SyncError> {
        let url = self.api_url(&format!("/cases/{case_id}/resolve"));

        let resp = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| classify_transport(&e, "resolve case"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(status, "resolve case"));
        }

        info!(case_id = %case_id, "Cloud support case resolved");
        Ok(())
    }
}
