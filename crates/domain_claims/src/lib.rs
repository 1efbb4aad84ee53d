//! Claims Domain
//!
//! This crate implements the claim lifecycle from public intake through
//! settlement, and the notification fan-out that keeps every stakeholder
//! informed:
//!
//! ```text
//! Submitted -> Received -> Initiated -> Negotiating -> AwaitingPayout -> Paid
//!                                \--------------- Rejected ---------------/
//! ```
//!
//! The [`service::ClaimService`] orchestrates intake validation, referral
//! resolution, file uploads, generated legal documents, persistence, and the
//! notification outbox. Every collaborator arrives through a port trait, so
//! the whole lifecycle runs against in-memory adapters in tests (see
//! [`testing`]).

pub mod claim;
pub mod documents;
pub mod error;
pub mod intake;
pub mod notify;
pub mod outbox;
pub mod patch;
pub mod ports;
pub mod service;
pub mod testing;

pub use claim::{
    Attachments, Claim, Claimant, ClaimantRole, ClaimStatus, Counterparty, DocumentCategory,
    IncidentDetails, ClaimFlags, LogEntry,
};
pub use documents::{DocumentFields, DocumentKind};
pub use error::ClaimError;
pub use intake::{IntakeLimits, IntakeRequest, IntakeValidator, UploadedFile};
pub use notify::{Notifier, Recipient};
pub use outbox::{IntentStatus, NotificationIntent, OutboxWorker, RetryPolicy};
pub use patch::ClaimPatch;
pub use ports::{ClaimFilter, ClaimStore, DocumentRenderer, Mailer, ObjectStorage, OutboxStore};
pub use service::{ClaimService, CreatedClaim, TrackingView};
