//! Claims Domain Ports
//!
//! Every external collaborator of the claims lifecycle sits behind one of
//! these traits. Production adapters live in `infra_db` (claim and outbox
//! stores) and `infra_external` (object storage, document rendering,
//! mail); in-memory versions live in [`crate::testing`].

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, IntentId, PortError, TrackingCode, UserId};

use crate::claim::{Claim, ClaimStatus};
use crate::documents::{DocumentFields, DocumentKind};
use crate::outbox::NotificationIntent;

/// Narrowing criteria for claim listings.
///
/// Helper constructors cover the query shapes the interface layer needs;
/// an empty filter lists everything.
#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    pub created_by: Option<UserId>,
    pub handler: Option<UserId>,
    /// Matches claims created by any of these users (organizer downline)
    pub created_by_any: Option<Vec<UserId>>,
}

impl ClaimFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(status: ClaimStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn by_creator(id: UserId) -> Self {
        Self {
            created_by: Some(id),
            ..Self::default()
        }
    }

    pub fn by_handler(id: UserId) -> Self {
        Self {
            handler: Some(id),
            ..Self::default()
        }
    }

    pub fn by_creators(ids: Vec<UserId>) -> Self {
        Self {
            created_by_any: Some(ids),
            ..Self::default()
        }
    }
}

/// Port over the claim store
#[async_trait]
pub trait ClaimStore: DomainPort {
    /// Persists a new claim; fails with `Conflict` when the tracking code
    /// is already taken
    async fn insert(&self, claim: &Claim) -> Result<(), PortError>;

    /// Writes back the full current state of an existing claim
    async fn update(&self, claim: &Claim) -> Result<(), PortError>;

    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, PortError>;

    async fn find_by_tracking(&self, code: &TrackingCode) -> Result<Option<Claim>, PortError>;

    /// Lists claims matching the filter, newest first
    async fn list(&self, filter: &ClaimFilter) -> Result<Vec<Claim>, PortError>;

    /// Removes a claim permanently
    async fn delete(&self, id: ClaimId) -> Result<(), PortError>;
}

/// Port over the external object store holding claim documents
#[async_trait]
pub trait ObjectStorage: DomainPort {
    /// Stores a blob and returns its storage path
    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, PortError>;

    /// Produces a time-limited download URL for a stored path
    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, PortError>;

    /// Removes every stored object under the given paths
    async fn remove(&self, paths: &[String]) -> Result<(), PortError>;
}

/// Port over the PDF rendering service
#[async_trait]
pub trait DocumentRenderer: DomainPort {
    /// Renders a document template with the given fields to PDF bytes
    async fn render(&self, kind: DocumentKind, fields: &DocumentFields)
        -> Result<Vec<u8>, PortError>;
}

/// Port over the outbound email provider
#[async_trait]
pub trait Mailer: DomainPort {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), PortError>;
}

/// Port over the durable notification outbox
#[async_trait]
pub trait OutboxStore: DomainPort {
    async fn enqueue(&self, intent: &NotificationIntent) -> Result<(), PortError>;

    /// Pending intents whose next attempt is due, oldest first
    async fn due(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        limit: usize,
    ) -> Result<Vec<NotificationIntent>, PortError>;

    async fn mark_sent(&self, id: IntentId) -> Result<(), PortError>;

    /// Schedules another attempt after a failed delivery
    async fn mark_retry(
        &self,
        id: IntentId,
        attempts: u32,
        next_attempt_at: chrono::DateTime<chrono::Utc>,
        error: &str,
    ) -> Result<(), PortError>;

    /// Gives up on an intent permanently, recording the final attempt count
    async fn mark_dead(&self, id: IntentId, attempts: u32, error: &str) -> Result<(), PortError>;
}
