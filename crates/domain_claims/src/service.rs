//! Claim lifecycle orchestration
//!
//! [`ClaimService`] is the single entry point for everything that happens
//! to a claim: intake, status changes, handler assignment, messages and
//! notes, tracking lookups, listings, file access, corrections, and
//! removal. It owns no I/O itself; every collaborator arrives as a port.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use core_kernel::{ClaimId, PortError, TrackingCode, UserId};
use domain_party::{OrganizationChain, ReferralResolver, User, UserDirectory, UserRole};

use crate::claim::{Claim, ClaimantRole, ClaimStatus, DocumentCategory, LogEntry};
use crate::documents::{DocumentFields, DocumentKind};
use crate::error::ClaimError;
use crate::intake::{IntakeLimits, IntakeRequest, IntakeValidator};
use crate::notify::Notifier;
use crate::patch::ClaimPatch;
use crate::ports::{ClaimFilter, ClaimStore, DocumentRenderer, ObjectStorage};

/// Storage folder for claimant uploads and generated documents
const CLAIMS_FOLDER: &str = "claims";

/// How many tracking codes to try before giving up on a conflicting insert
const TRACKING_INSERT_ATTEMPTS: u32 = 3;

pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 300;

/// What the intake endpoint returns to the anonymous claimant
#[derive(Debug, Clone, Serialize)]
pub struct CreatedClaim {
    pub claim_id: ClaimId,
    pub tracking_code: TrackingCode,
}

/// Public progress view for the tracking lookup
#[derive(Debug, Clone, Serialize)]
pub struct TrackingView {
    pub tracking_code: TrackingCode,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct ClaimService {
    store: Arc<dyn ClaimStore>,
    storage: Arc<dyn ObjectStorage>,
    renderer: Arc<dyn DocumentRenderer>,
    directory: Arc<dyn UserDirectory>,
    notifier: Arc<Notifier>,
    validator: IntakeValidator,
    resolver: ReferralResolver,
    chain: OrganizationChain,
    signed_url_ttl_secs: u64,
}

impl ClaimService {
    pub fn new(
        store: Arc<dyn ClaimStore>,
        storage: Arc<dyn ObjectStorage>,
        renderer: Arc<dyn DocumentRenderer>,
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            store,
            storage,
            renderer,
            resolver: ReferralResolver::new(Arc::clone(&directory)),
            chain: OrganizationChain::new(Arc::clone(&directory)),
            directory,
            notifier,
            validator: IntakeValidator::default(),
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
        }
    }

    pub fn with_limits(mut self, limits: IntakeLimits) -> Self {
        self.validator = IntakeValidator::new(limits);
        self
    }

    pub fn with_signed_url_ttl(mut self, ttl_secs: u64) -> Self {
        self.signed_url_ttl_secs = ttl_secs;
        self
    }

    pub fn with_chain_depth(mut self, depth: usize) -> Self {
        self.chain = self.chain.with_max_depth(depth);
        self
    }

    /// Files a new claim from the public intake form.
    ///
    /// Validates the whole request up front, resolves the optional
    /// referral, then uploads the claimant's files and renders the legal
    /// documents concurrently. Uploads are mandatory; document rendering
    /// is best-effort and a failed render leaves the slot empty. The
    /// insert retries with fresh tracking codes on a code collision.
    pub async fn create(&self, mut request: IntakeRequest) -> Result<CreatedClaim, ClaimError> {
        self.validator.validate(&request)?;

        let agent = match request.referral_code.as_deref() {
            Some(code) => self.resolver.resolve(code).await,
            None => None,
        };
        let organizer = match &agent {
            Some(agent) => self.nearest_organizer(agent.id).await,
            None => None,
        };

        let files = std::mem::take(&mut request.files);
        let national_id = request.claimant.national_id.clone();
        let stamp = Utc::now().timestamp_millis();

        let uploads_fut = async {
            let mut set: JoinSet<Result<(DocumentCategory, String), PortError>> = JoinSet::new();
            for (idx, file) in files.into_iter().enumerate() {
                let storage = Arc::clone(&self.storage);
                let name = format!(
                    "{national_id}-{}-{stamp}-{idx}{}",
                    file.category.tag(),
                    file.extension(),
                );
                set.spawn(async move {
                    let path = storage
                        .upload(CLAIMS_FOLDER, &name, &file.content_type, file.bytes)
                        .await?;
                    Ok((file.category, path))
                });
            }
            let mut uploaded = Vec::new();
            while let Some(joined) = set.join_next().await {
                let result = joined
                    .map_err(|e| PortError::Internal {
                        message: "upload task panicked".into(),
                        source: Some(Box::new(e)),
                    })?;
                uploaded.push(result?);
            }
            Ok::<_, PortError>(uploaded)
        };

        let needs_affidavit = request.claimant_role == ClaimantRole::Driver
            && !request.flags.has_own_insurance;
        let docs_fut = async {
            let letter = self.render_and_store(
                DocumentKind::RepresentationLetter,
                DocumentFields::representation_letter(&request),
                &national_id,
                stamp,
            );
            let fee = self.render_and_store(
                DocumentKind::FeeAgreement,
                DocumentFields::fee_agreement(&request),
                &national_id,
                stamp,
            );
            let affidavit = async {
                if needs_affidavit {
                    self.render_and_store(
                        DocumentKind::NoInsuranceAffidavit,
                        DocumentFields::affidavit(&request),
                        &national_id,
                        stamp,
                    )
                    .await
                } else {
                    None
                }
            };
            let (letter, fee, affidavit) = tokio::join!(letter, fee, affidavit);
            [letter, fee, affidavit]
        };

        let (uploaded, generated) = tokio::join!(uploads_fut, docs_fut);
        let uploaded = uploaded?;

        let mut claim = Claim::new(
            TrackingCode::generate(),
            request.claimant.clone(),
            request.claimant_role,
        );
        claim.flags = request.flags;
        claim.incident = request.incident.clone();
        claim.counterparty = request.counterparty.clone();
        claim.bank_account = request.bank_account.clone();
        claim.created_by = agent.as_ref().map(|a| a.id);
        for (category, path) in uploaded {
            claim.attachments.attach(category, path);
        }
        // Generated documents go last so the affidavit takes the
        // insurance-certificate slot.
        for (category, path) in generated.into_iter().flatten() {
            claim.attachments.attach(category, path);
        }

        let mut attempt = 1;
        loop {
            match self.store.insert(&claim).await {
                Ok(()) => break,
                Err(e) if e.is_conflict() && attempt < TRACKING_INSERT_ATTEMPTS => {
                    warn!(
                        code = claim.tracking_code.as_str(),
                        attempt, "tracking code collision, regenerating"
                    );
                    claim.tracking_code = TrackingCode::generate();
                    attempt += 1;
                }
                Err(e) if e.is_conflict() => {
                    return Err(ClaimError::Conflict(
                        "could not allocate a unique tracking code".into(),
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let queued = self
            .notifier
            .claim_created(&claim, agent.as_ref(), organizer.as_ref())
            .await;
        info!(
            claim = %claim.id,
            code = claim.tracking_code.as_str(),
            notifications = queued,
            "claim filed"
        );

        Ok(CreatedClaim {
            claim_id: claim.id,
            tracking_code: claim.tracking_code,
        })
    }

    /// Moves a claim to a new status and fans out notifications
    pub async fn update_status(
        &self,
        id: ClaimId,
        target: ClaimStatus,
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.load(id).await?;
        let old = claim.status;
        claim.update_status(target)?;
        self.store.update(&claim).await?;

        let (agent, organizer) = self.stakeholders(&claim).await;
        let queued = self
            .notifier
            .status_changed(&claim, old, target, agent.as_ref(), organizer.as_ref())
            .await;
        info!(claim = %id, from = %old, to = %target, notifications = queued, "status changed");

        Ok(claim)
    }

    /// Assigns a staff handler.
    ///
    /// Only admins and handlers qualify. The first assignment of a fresh
    /// claim auto-advances it to `Received` and notifies accordingly;
    /// reassignment only moves the reference.
    pub async fn assign_handler(
        &self,
        id: ClaimId,
        handler_id: UserId,
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.load(id).await?;
        let handler = self
            .directory
            .find_by_id(handler_id)
            .await?
            .ok_or_else(|| ClaimError::not_found(format!("User {handler_id}")))?;
        if !handler.role.can_handle_claims() {
            return Err(ClaimError::permission(format!(
                "{} cannot be assigned claims",
                handler.name
            )));
        }

        let advanced = claim.assign_handler(handler_id);
        self.store.update(&claim).await?;

        if advanced {
            let (agent, organizer) = self.stakeholders(&claim).await;
            self.notifier
                .status_changed(
                    &claim,
                    ClaimStatus::Submitted,
                    ClaimStatus::Received,
                    agent.as_ref(),
                    organizer.as_ref(),
                )
                .await;
        }
        info!(claim = %id, handler = %handler_id, advanced, "handler assigned");

        Ok(claim)
    }

    /// Appends an entry to the claimant-visible message thread
    pub async fn append_message(
        &self,
        id: ClaimId,
        author: &str,
        text: String,
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.load(id).await?;
        claim.append_message(LogEntry::new(author, text));
        self.store.update(&claim).await?;
        Ok(claim)
    }

    /// Appends a staff-only note
    pub async fn append_note(
        &self,
        id: ClaimId,
        author: &str,
        text: String,
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.load(id).await?;
        claim.append_note(LogEntry::new(author, text));
        self.store.update(&claim).await?;
        Ok(claim)
    }

    /// Anonymous progress lookup by tracking code plus national id.
    ///
    /// Both must match; a correct code with the wrong national id looks
    /// identical to an unknown code.
    pub async fn track(
        &self,
        code: &str,
        national_id: &str,
    ) -> Result<TrackingView, ClaimError> {
        let not_found =
            || ClaimError::not_found("No claim matches that tracking code and national id");

        let code = TrackingCode::from_str(code).map_err(|_| not_found())?;
        let claim = self
            .store
            .find_by_tracking(&code)
            .await?
            .ok_or_else(not_found)?;
        if claim.claimant.national_id.trim() != national_id.trim() {
            return Err(not_found());
        }
        Ok(TrackingView {
            tracking_code: claim.tracking_code,
            status: claim.status,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        })
    }

    pub async fn get(&self, id: ClaimId) -> Result<Claim, ClaimError> {
        self.load(id).await
    }

    pub async fn list(&self, filter: &ClaimFilter) -> Result<Vec<Claim>, ClaimError> {
        Ok(self.store.list(filter).await?)
    }

    /// Claims filed through an organizer's network: their own referral
    /// link plus the links of everyone they directly referred
    pub async fn list_for_organizer(&self, organizer: UserId) -> Result<Vec<Claim>, ClaimError> {
        let mut creators: Vec<UserId> = self
            .directory
            .find_referred_by(organizer)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect();
        creators.push(organizer);
        Ok(self.store.list(&ClaimFilter::by_creators(creators)).await?)
    }

    /// Time-limited download URL for one attached file
    pub async fn file_url(
        &self,
        id: ClaimId,
        category: DocumentCategory,
        index: usize,
    ) -> Result<String, ClaimError> {
        let claim = self.load(id).await?;
        let paths = claim.attachments.paths(category);
        let path = paths.get(index).ok_or_else(|| {
            ClaimError::not_found(format!(
                "Claim {id} has no {} file at index {index}",
                category.tag()
            ))
        })?;
        Ok(self.storage.signed_url(path, self.signed_url_ttl_secs).await?)
    }

    /// Applies a whitelisted partial update
    pub async fn apply_patch(&self, id: ClaimId, patch: ClaimPatch) -> Result<Claim, ClaimError> {
        let mut claim = self.load(id).await?;
        if patch.is_empty() {
            return Ok(claim);
        }
        patch.apply(&mut claim);
        claim.updated_at = Utc::now();
        self.store.update(&claim).await?;
        Ok(claim)
    }

    /// Permanently removes a claim and its stored files.
    ///
    /// File removal is best-effort; the record is deleted even when the
    /// object store declines, leaving orphaned blobs rather than a
    /// half-deleted claim.
    pub async fn remove(&self, id: ClaimId) -> Result<(), ClaimError> {
        let claim = self.load(id).await?;
        let paths: Vec<String> = claim
            .attachments
            .iter()
            .flat_map(|(_, paths)| paths.iter().cloned())
            .collect();
        if !paths.is_empty() {
            if let Err(e) = self.storage.remove(&paths).await {
                warn!(claim = %id, error = %e, "failed to remove stored files");
            }
        }
        self.store.delete(id).await?;
        info!(claim = %id, "claim removed");
        Ok(())
    }

    async fn load(&self, id: ClaimId) -> Result<Claim, ClaimError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ClaimError::not_found(format!("Claim {id}")))
    }

    /// Nearest ancestor with the organizer role, if any
    async fn nearest_organizer(&self, agent: UserId) -> Option<User> {
        match self.chain.ancestors(agent).await {
            Ok(chain) => chain.into_iter().find(|u| u.role == UserRole::Organizer),
            Err(e) => {
                warn!(agent = %agent, error = %e, "organizer lookup failed");
                None
            }
        }
    }

    /// Agent and organizer to copy on claim events, both optional
    async fn stakeholders(&self, claim: &Claim) -> (Option<User>, Option<User>) {
        let agent = match claim.created_by {
            Some(id) => match self.directory.find_by_id(id).await {
                Ok(agent) => agent,
                Err(e) => {
                    warn!(claim = %claim.id, error = %e, "agent lookup failed");
                    None
                }
            },
            None => None,
        };
        let organizer = match &agent {
            Some(agent) => self.nearest_organizer(agent.id).await,
            None => None,
        };
        (agent, organizer)
    }

    async fn render_and_store(
        &self,
        kind: DocumentKind,
        fields: DocumentFields,
        national_id: &str,
        stamp: i64,
    ) -> Option<(DocumentCategory, String)> {
        let pdf = match self.renderer.render(kind, &fields).await {
            Ok(pdf) => pdf,
            Err(e) => {
                warn!(kind = ?kind, error = %e, "document render failed");
                return None;
            }
        };
        let name = format!("{national_id}-{}-{stamp}.pdf", kind.tag());
        match self
            .storage
            .upload(CLAIMS_FOLDER, &name, "application/pdf", pdf)
            .await
        {
            Ok(path) => Some((kind.category(), path)),
            Err(e) => {
                warn!(kind = ?kind, error = %e, "generated document upload failed");
                None
            }
        }
    }
}
