//! PDF rendering adapter
//!
//! Posts template fields to the rendering service and receives the
//! finished PDF bytes back. Template selection rides on the URL path
//! using the document kind's tag.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use core_kernel::{DomainPort, PortError};
use domain_claims::{DocumentFields, DocumentKind, DocumentRenderer};

use crate::error::{status_error, transport_error};

const SERVICE: &str = "document renderer";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stand-in for deployments without a rendering service.
///
/// Generation is best-effort at the call site, so failing every render
/// simply leaves the generated-document slots empty.
pub struct DisabledRenderer;

impl DomainPort for DisabledRenderer {}

#[async_trait]
impl DocumentRenderer for DisabledRenderer {
    async fn render(
        &self,
        _kind: DocumentKind,
        _fields: &DocumentFields,
    ) -> Result<Vec<u8>, PortError> {
        Err(PortError::ServiceUnavailable {
            service: SERVICE.to_string(),
        })
    }
}

pub struct RenderServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl RenderServiceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build renderer client".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl DomainPort for RenderServiceClient {}

#[async_trait]
impl DocumentRenderer for RenderServiceClient {
    async fn render(
        &self,
        kind: DocumentKind,
        fields: &DocumentFields,
    ) -> Result<Vec<u8>, PortError> {
        let response = self
            .client
            .post(format!("{}/render/{}", self.base_url, kind.tag()))
            .json(fields)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, body));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        debug!(kind = kind.tag(), size = bytes.len(), "document rendered");
        Ok(bytes.to_vec())
    }
}
