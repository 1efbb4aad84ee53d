//! Object storage adapter
//!
//! Talks to a Supabase-compatible storage API: direct object upload,
//! short-lived signed download URLs, and batched removal. Buckets stay
//! private; every read goes through a signed URL.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use core_kernel::{DomainPort, PortError};
use domain_claims::ObjectStorage;

use crate::error::{status_error, transport_error};

const SERVICE: &str = "object storage";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BucketStorage {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl BucketStorage {
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build storage client".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            api_key: api_key.into(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

impl DomainPort for BucketStorage {}

#[async_trait]
impl ObjectStorage for BucketStorage {
    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, PortError> {
        let path = format!("{folder}/{filename}");
        let response = self
            .client
            .post(self.object_url(&path))
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, body));
        }
        debug!(path, "object uploaded");
        Ok(path)
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, PortError> {
        let response = self
            .client
            .post(format!(
                "{}/storage/v1/object/sign/{}/{}",
                self.base_url, self.bucket, path
            ))
            .bearer_auth(&self.api_key)
            .json(&json!({ "expiresIn": ttl_secs }))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, body));
        }
        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }

    async fn remove(&self, paths: &[String]) -> Result<(), PortError> {
        let response = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .bearer_auth(&self.api_key)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, body));
        }
        debug!(count = paths.len(), "objects removed");
        Ok(())
    }
}
