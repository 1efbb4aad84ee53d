//! Transactional mail adapters
//!
//! [`HttpMailer`] posts to a Resend-compatible email API. Deployments
//! without a mail provider (local development, staging) wire in
//! [`NoopMailer`], which logs the would-be delivery and reports success
//! so outbox intents drain instead of piling up.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use core_kernel::{DomainPort, PortError};
use domain_claims::Mailer;

use crate::error::{status_error, transport_error};

const SERVICE: &str = "mail provider";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.resend.com/emails";

    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Result<Self, PortError> {
        Self::with_endpoint(Self::DEFAULT_ENDPOINT, api_key, from)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build mail client".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

impl DomainPort for HttpMailer {}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), PortError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "html": html_body,
            }))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, body));
        }
        debug!(to, subject, "email dispatched");
        Ok(())
    }
}

/// Stand-in mailer for deployments without a provider
pub struct NoopMailer;

impl DomainPort for NoopMailer {}

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), PortError> {
        info!(to, subject, "mail provider not configured, dropping email");
        Ok(())
    }
}
