//! In-memory port adapters
//!
//! Deterministic implementations of every port, used by the integration
//! tests here and in the interface crate. They live in the library proper
//! rather than behind `cfg(test)` so downstream crates can drive the full
//! lifecycle without a database or network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{ClaimId, DomainPort, IntentId, PortError, TrackingCode, UserId};
use domain_party::{NewUser, User, UserDirectory};

use crate::claim::Claim;
use crate::documents::{DocumentFields, DocumentKind};
use crate::outbox::{IntentStatus, NotificationIntent};
use crate::ports::{
    ClaimFilter, ClaimStore, DocumentRenderer, Mailer, ObjectStorage, OutboxStore,
};

/// Claim store backed by a mutex-guarded map
#[derive(Default)]
pub struct InMemoryClaimStore {
    claims: Mutex<HashMap<ClaimId, Claim>>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.claims.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DomainPort for InMemoryClaimStore {}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn insert(&self, claim: &Claim) -> Result<(), PortError> {
        let mut claims = self.claims.lock().unwrap();
        if claims
            .values()
            .any(|c| c.tracking_code == claim.tracking_code)
        {
            return Err(PortError::conflict(format!(
                "tracking code {} already exists",
                claim.tracking_code.as_str()
            )));
        }
        claims.insert(claim.id, claim.clone());
        Ok(())
    }

    async fn update(&self, claim: &Claim) -> Result<(), PortError> {
        let mut claims = self.claims.lock().unwrap();
        if !claims.contains_key(&claim.id) {
            return Err(PortError::not_found("Claim", claim.id));
        }
        claims.insert(claim.id, claim.clone());
        Ok(())
    }

    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, PortError> {
        Ok(self.claims.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_tracking(&self, code: &TrackingCode) -> Result<Option<Claim>, PortError> {
        Ok(self
            .claims
            .lock()
            .unwrap()
            .values()
            .find(|c| &c.tracking_code == code)
            .cloned())
    }

    async fn list(&self, filter: &ClaimFilter) -> Result<Vec<Claim>, PortError> {
        let claims = self.claims.lock().unwrap();
        let mut matched: Vec<Claim> = claims
            .values()
            .filter(|c| filter.status.map_or(true, |s| c.status == s))
            .filter(|c| filter.created_by.map_or(true, |u| c.created_by == Some(u)))
            .filter(|c| filter.handler.map_or(true, |u| c.handler == Some(u)))
            .filter(|c| {
                filter.created_by_any.as_ref().map_or(true, |ids| {
                    c.created_by.map_or(false, |u| ids.contains(&u))
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn delete(&self, id: ClaimId) -> Result<(), PortError> {
        match self.claims.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(PortError::not_found("Claim", id)),
        }
    }
}

/// User directory backed by a mutex-guarded map
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a pre-built user, bypassing the `create` flow
    pub fn add(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }
}

impl DomainPort for InMemoryUserDirectory {}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, PortError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, PortError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, PortError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == new_user.email) {
            return Err(PortError::conflict(format!(
                "email {} already registered",
                new_user.email
            )));
        }
        let mut user = User::new(
            new_user.name,
            new_user.email,
            new_user.password_hash,
            new_user.role,
        );
        user.national_id = new_user.national_id;
        user.phone = new_user.phone;
        user.register_number = new_user.register_number;
        user.referred_by = new_user.referred_by;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_referred_by(&self, id: UserId) -> Result<Vec<User>, PortError> {
        let users = self.users.lock().unwrap();
        let mut referred: Vec<User> = users
            .values()
            .filter(|u| u.referred_by == Some(id))
            .cloned()
            .collect();
        referred.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(referred)
    }

    async fn list(&self) -> Result<Vec<User>, PortError> {
        let users = self.users.lock().unwrap();
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn set_approved(&self, id: UserId, approved: bool) -> Result<User, PortError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("User", id))?;
        user.is_approved = approved;
        Ok(user.clone())
    }
}

/// Outbox keeping intents in a vector, with inspection helpers
#[derive(Default)]
pub struct InMemoryOutbox {
    intents: Mutex<Vec<NotificationIntent>>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intents(&self) -> Vec<NotificationIntent> {
        self.intents.lock().unwrap().clone()
    }

    pub fn count_with_status(&self, status: IntentStatus) -> usize {
        self.intents
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.status == status)
            .count()
    }
}

impl DomainPort for InMemoryOutbox {}

#[async_trait]
impl OutboxStore for InMemoryOutbox {
    async fn enqueue(&self, intent: &NotificationIntent) -> Result<(), PortError> {
        self.intents.lock().unwrap().push(intent.clone());
        Ok(())
    }

    async fn due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<NotificationIntent>, PortError> {
        let intents = self.intents.lock().unwrap();
        Ok(intents
            .iter()
            .filter(|i| i.status == IntentStatus::Pending && i.next_attempt_at <= now)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_sent(&self, id: IntentId) -> Result<(), PortError> {
        self.update_intent(id, |i| {
            i.status = IntentStatus::Sent;
            i.last_error = None;
        })
    }

    async fn mark_retry(
        &self,
        id: IntentId,
        attempts: u32,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> Result<(), PortError> {
        self.update_intent(id, |i| {
            i.attempts = attempts;
            i.next_attempt_at = next_attempt_at;
            i.last_error = Some(error.to_string());
        })
    }

    async fn mark_dead(&self, id: IntentId, attempts: u32, error: &str) -> Result<(), PortError> {
        self.update_intent(id, |i| {
            i.status = IntentStatus::Dead;
            i.attempts = attempts;
            i.last_error = Some(error.to_string());
        })
    }
}

impl InMemoryOutbox {
    fn update_intent(
        &self,
        id: IntentId,
        f: impl FnOnce(&mut NotificationIntent),
    ) -> Result<(), PortError> {
        let mut intents = self.intents.lock().unwrap();
        let intent = intents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| PortError::not_found("NotificationIntent", id))?;
        f(intent);
        Ok(())
    }
}

/// Object store that records uploads and fabricates paths and URLs
#[derive(Default)]
pub struct StubStorage {
    uploads: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
}

impl StubStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn removed_paths(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

impl DomainPort for StubStorage {}

#[async_trait]
impl ObjectStorage for StubStorage {
    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, PortError> {
        let path = format!("{folder}/{filename}");
        self.uploads.lock().unwrap().push(path.clone());
        Ok(path)
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, PortError> {
        Ok(format!("https://files.test/{path}?expires={ttl_secs}"))
    }

    async fn remove(&self, paths: &[String]) -> Result<(), PortError> {
        self.removed.lock().unwrap().extend_from_slice(paths);
        Ok(())
    }
}

/// Renderer producing a constant PDF stub
#[derive(Default)]
pub struct StubRenderer {
    rendered: Mutex<Vec<DocumentKind>>,
}

impl StubRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered_kinds(&self) -> Vec<DocumentKind> {
        self.rendered.lock().unwrap().clone()
    }
}

impl DomainPort for StubRenderer {}

#[async_trait]
impl DocumentRenderer for StubRenderer {
    async fn render(
        &self,
        kind: DocumentKind,
        _fields: &DocumentFields,
    ) -> Result<Vec<u8>, PortError> {
        self.rendered.lock().unwrap().push(kind);
        Ok(b"%PDF-1.4 stub".to_vec())
    }
}

/// Renderer that always fails, for best-effort generation tests
pub struct FailingRenderer;

impl DomainPort for FailingRenderer {}

#[async_trait]
impl DocumentRenderer for FailingRenderer {
    async fn render(
        &self,
        _kind: DocumentKind,
        _fields: &DocumentFields,
    ) -> Result<Vec<u8>, PortError> {
        Err(PortError::ServiceUnavailable {
            service: "renderer".into(),
        })
    }
}

/// Mailer that records deliveries instead of sending them
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs of (recipient, subject), in delivery order
    pub fn deliveries(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl DomainPort for RecordingMailer {}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), PortError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Mailer that fails a configurable number of times before succeeding
pub struct FlakyMailer {
    failures_left: Mutex<u32>,
    transient: bool,
    sent: Mutex<Vec<String>>,
}

impl FlakyMailer {
    /// Fails `failures` times with a transient error, then delivers
    pub fn transient(failures: u32) -> Self {
        Self {
            failures_left: Mutex::new(failures),
            transient: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with a permanent error
    pub fn permanent() -> Self {
        Self {
            failures_left: Mutex::new(u32::MAX),
            transient: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn delivered_to(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl DomainPort for FlakyMailer {}

#[async_trait]
impl Mailer for FlakyMailer {
    async fn send(&self, to: &str, _subject: &str, _html_body: &str) -> Result<(), PortError> {
        let mut left = self.failures_left.lock().unwrap();
        if *left > 0 {
            *left = left.saturating_sub(1);
            return Err(if self.transient {
                PortError::ServiceUnavailable {
                    service: "mail".into(),
                }
            } else {
                PortError::validation("recipient address rejected")
            });
        }
        drop(left);
        self.sent.lock().unwrap().push(to.to_string());
        Ok(())
    }
}
