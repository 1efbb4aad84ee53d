//! Claim aggregate
//!
//! A [`Claim`] is created by an anonymous member of the public and then
//! shepherded through a linear lifecycle by internal staff. The aggregate
//! owns the state machine; everything that touches status goes through
//! [`Claim::update_status`] so the transition rules hold everywhere.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, CoreError, TrackingCode, UserId};

use crate::error::ClaimError;

/// Lifecycle status of a claim.
///
/// The six non-terminal-to-terminal statuses form an ordered pipeline;
/// `Rejected` is reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Just filed via public intake, nobody has looked at it yet
    Submitted,
    /// A handler picked it up and is reviewing documentation
    Received,
    /// Formally opened before the counterparty's insurer
    Initiated,
    /// Compensation amount under negotiation
    Negotiating,
    /// Agreement closed, payout pending
    AwaitingPayout,
    /// Settled and paid out
    Paid,
    /// Refused after legal review
    Rejected,
}

impl ClaimStatus {
    /// Position in the happy-path pipeline; `None` for `Rejected`
    fn pipeline_index(self) -> Option<u8> {
        match self {
            Self::Submitted => Some(0),
            Self::Received => Some(1),
            Self::Initiated => Some(2),
            Self::Negotiating => Some(3),
            Self::AwaitingPayout => Some(4),
            Self::Paid => Some(5),
            Self::Rejected => None,
        }
    }

    /// Whether the claim can leave this status at all
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Rejected)
    }

    /// Validates a requested transition.
    ///
    /// Forward movement along the pipeline is allowed, including skips
    /// (a claim may go straight from `Received` to `Negotiating`).
    /// Backward movement, self-transitions, and leaving a terminal status
    /// are refused. `Rejected` is reachable from any non-terminal status.
    pub fn can_transition_to(self, target: ClaimStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if target == Self::Rejected {
            return true;
        }
        match (self.pipeline_index(), target.pipeline_index()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::Received => "received",
            Self::Initiated => "initiated",
            Self::Negotiating => "negotiating",
            Self::AwaitingPayout => "awaiting_payout",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

impl FromStr for ClaimStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(Self::Submitted),
            "received" => Ok(Self::Received),
            "initiated" => Ok(Self::Initiated),
            "negotiating" => Ok(Self::Negotiating),
            "awaiting_payout" => Ok(Self::AwaitingPayout),
            "paid" => Ok(Self::Paid),
            "rejected" => Ok(Self::Rejected),
            other => Err(CoreError::validation(format!(
                "unknown claim status: {other}"
            ))),
        }
    }
}

/// How the claimant was involved in the incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimantRole {
    Driver,
    Passenger,
    Pedestrian,
}

impl FromStr for ClaimantRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(Self::Driver),
            "passenger" => Ok(Self::Passenger),
            "pedestrian" => Ok(Self::Pedestrian),
            other => Err(CoreError::validation(format!(
                "unknown claimant role: {other}"
            ))),
        }
    }
}

/// Identity and contact details of the person filing the claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claimant {
    pub name: String,
    pub national_id: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Details about the other party in the incident.
///
/// Which fields are present depends on whether the claimant carries their
/// own insurance: insured claimants report the counterparty's insurer,
/// uninsured ones identify the counterparty directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counterparty {
    #[serde(default)]
    pub insurer_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub vehicle_description: Option<String>,
}

/// When and where the incident happened
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentDetails {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Free-form time of day as reported by the claimant
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub narrative: Option<String>,
}

/// Circumstance flags collected at intake; each one changes which
/// documents are required or which legal process applies
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimFlags {
    pub has_own_insurance: bool,
    pub filed_police_report: bool,
    /// Incident happened on the way to or from work
    pub occurred_during_commute: bool,
    pub has_occupational_insurance: bool,
    pub suffered_injury: bool,
    pub police_intervened: bool,
    pub ambulance_intervened: bool,
}

/// Slot an uploaded or generated file occupies on the claim
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Identity,
    License,
    VehicleRegistration,
    InsuranceCertificate,
    PoliceReport,
    Photos,
    MedicalRecords,
    BudgetEstimate,
    BankProof,
    CriminalComplaint,
    Supplementary,
    RepresentationLetter,
    FeeAgreement,
}

impl DocumentCategory {
    /// Categories that hold more than one file
    pub fn is_multi(self) -> bool {
        matches!(self, Self::Photos | Self::Supplementary)
    }

    /// Short tag used when deriving storage object names
    pub fn tag(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::License => "license",
            Self::VehicleRegistration => "registration",
            Self::InsuranceCertificate => "insurance",
            Self::PoliceReport => "police-report",
            Self::Photos => "photo",
            Self::MedicalRecords => "medical",
            Self::BudgetEstimate => "budget",
            Self::BankProof => "bank",
            Self::CriminalComplaint => "complaint",
            Self::Supplementary => "extra",
            Self::RepresentationLetter => "representation-letter",
            Self::FeeAgreement => "fee-agreement",
        }
    }
}

impl FromStr for DocumentCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" => Ok(Self::Identity),
            "license" => Ok(Self::License),
            "vehicle_registration" => Ok(Self::VehicleRegistration),
            "insurance_certificate" => Ok(Self::InsuranceCertificate),
            "police_report" => Ok(Self::PoliceReport),
            "photos" => Ok(Self::Photos),
            "medical_records" => Ok(Self::MedicalRecords),
            "budget_estimate" => Ok(Self::BudgetEstimate),
            "bank_proof" => Ok(Self::BankProof),
            "criminal_complaint" => Ok(Self::CriminalComplaint),
            "supplementary" => Ok(Self::Supplementary),
            "representation_letter" => Ok(Self::RepresentationLetter),
            "fee_agreement" => Ok(Self::FeeAgreement),
            other => Err(CoreError::validation(format!(
                "unknown document category: {other}"
            ))),
        }
    }
}

/// Storage paths of the files attached to a claim, keyed by category.
///
/// Single-file categories overwrite on re-attach; multi-file categories
/// ([`DocumentCategory::is_multi`]) accumulate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attachments {
    slots: BTreeMap<DocumentCategory, Vec<String>>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a stored file under its category
    pub fn attach(&mut self, category: DocumentCategory, path: impl Into<String>) {
        let slot = self.slots.entry(category).or_default();
        if !category.is_multi() {
            slot.clear();
        }
        slot.push(path.into());
    }

    /// Paths stored under a category, empty when nothing was attached
    pub fn paths(&self, category: DocumentCategory) -> &[String] {
        self.slots.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, category: DocumentCategory) -> bool {
        !self.paths(category).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocumentCategory, &[String])> {
        self.slots.iter().map(|(c, p)| (*c, p.as_slice()))
    }
}

/// Timestamped entry in a claim's message thread or internal notes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

impl LogEntry {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            author: author.into(),
            text: text.into(),
        }
    }
}

/// An insurance claim filed through the public intake form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    /// Short public code the claimant uses to check progress
    pub tracking_code: TrackingCode,
    pub status: ClaimStatus,
    pub claimant: Claimant,
    pub claimant_role: ClaimantRole,
    pub flags: ClaimFlags,
    pub incident: IncidentDetails,
    pub counterparty: Counterparty,
    /// Bank account (CBU or alias) for the eventual payout
    #[serde(default)]
    pub bank_account: Option<String>,
    pub attachments: Attachments,
    /// Agent whose referral code was used at intake, if any
    #[serde(default)]
    pub created_by: Option<UserId>,
    /// Staff member currently working the claim
    #[serde(default)]
    pub handler: Option<UserId>,
    /// Conversation with the claimant, oldest first
    #[serde(default)]
    pub messages: Vec<LogEntry>,
    /// Staff-only annotations, oldest first
    #[serde(default)]
    pub notes: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    pub fn new(
        tracking_code: TrackingCode,
        claimant: Claimant,
        claimant_role: ClaimantRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ClaimId::new_v7(),
            tracking_code,
            status: ClaimStatus::Submitted,
            claimant,
            claimant_role,
            flags: ClaimFlags::default(),
            incident: IncidentDetails::default(),
            counterparty: Counterparty::default(),
            bank_account: None,
            attachments: Attachments::new(),
            created_by: None,
            handler: None,
            messages: Vec::new(),
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the claim to a new status, enforcing the transition rules
    pub fn update_status(&mut self, target: ClaimStatus) -> Result<(), ClaimError> {
        if !self.status.can_transition_to(target) {
            return Err(ClaimError::InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    /// Points the claim at a staff handler.
    ///
    /// The first assignment of a freshly submitted claim advances it to
    /// `Received`; returns whether that advance happened. Reassignment is
    /// idempotent with respect to status.
    pub fn assign_handler(&mut self, handler: UserId) -> bool {
        self.handler = Some(handler);
        let advanced = self.status == ClaimStatus::Submitted;
        if advanced {
            self.status = ClaimStatus::Received;
        }
        self.touch();
        advanced
    }

    pub fn append_message(&mut self, entry: LogEntry) {
        self.messages.push(entry);
        self.touch();
    }

    pub fn append_note(&mut self, entry: LogEntry) {
        self.notes.push(entry);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn claimant() -> Claimant {
        Claimant {
            name: "Maria Lopez".into(),
            national_id: "30123456".into(),
            email: "maria@example.com".into(),
            phone: None,
            address: None,
        }
    }

    #[test]
    fn forward_transitions_allowed_including_skips() {
        assert!(ClaimStatus::Submitted.can_transition_to(ClaimStatus::Received));
        assert!(ClaimStatus::Received.can_transition_to(ClaimStatus::Negotiating));
        assert!(ClaimStatus::Submitted.can_transition_to(ClaimStatus::Paid));
    }

    #[test]
    fn backward_and_self_transitions_refused() {
        assert!(!ClaimStatus::Negotiating.can_transition_to(ClaimStatus::Received));
        assert!(!ClaimStatus::Initiated.can_transition_to(ClaimStatus::Initiated));
    }

    #[test]
    fn terminal_statuses_cannot_move() {
        for target in [
            ClaimStatus::Submitted,
            ClaimStatus::Negotiating,
            ClaimStatus::Rejected,
        ] {
            assert!(!ClaimStatus::Paid.can_transition_to(target));
            assert!(!ClaimStatus::Rejected.can_transition_to(target));
        }
    }

    #[test]
    fn rejected_reachable_from_any_non_terminal() {
        for from in [
            ClaimStatus::Submitted,
            ClaimStatus::Received,
            ClaimStatus::Initiated,
            ClaimStatus::Negotiating,
            ClaimStatus::AwaitingPayout,
        ] {
            assert!(from.can_transition_to(ClaimStatus::Rejected));
        }
    }

    #[test]
    fn update_status_rejects_invalid_moves() {
        let mut claim = Claim::new(TrackingCode::generate(), claimant(), ClaimantRole::Driver);
        claim.update_status(ClaimStatus::Negotiating).unwrap();
        let err = claim.update_status(ClaimStatus::Received).unwrap_err();
        assert!(matches!(
            err,
            ClaimError::InvalidStatusTransition {
                from: ClaimStatus::Negotiating,
                to: ClaimStatus::Received,
            }
        ));
        assert_eq!(claim.status, ClaimStatus::Negotiating);
    }

    #[test]
    fn first_handler_assignment_advances_to_received() {
        let mut claim = Claim::new(TrackingCode::generate(), claimant(), ClaimantRole::Driver);
        let handler = UserId::new();
        assert!(claim.assign_handler(handler));
        assert_eq!(claim.status, ClaimStatus::Received);

        // Reassignment keeps the current status.
        claim.update_status(ClaimStatus::Negotiating).unwrap();
        assert!(!claim.assign_handler(UserId::new()));
        assert_eq!(claim.status, ClaimStatus::Negotiating);
    }

    #[test]
    fn single_file_categories_overwrite_multi_accumulate() {
        let mut attachments = Attachments::new();
        attachments.attach(DocumentCategory::Identity, "a.pdf");
        attachments.attach(DocumentCategory::Identity, "b.pdf");
        assert_eq!(attachments.paths(DocumentCategory::Identity), ["b.pdf"]);

        attachments.attach(DocumentCategory::Photos, "p1.jpg");
        attachments.attach(DocumentCategory::Photos, "p2.jpg");
        assert_eq!(
            attachments.paths(DocumentCategory::Photos),
            ["p1.jpg", "p2.jpg"]
        );
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            ClaimStatus::Submitted,
            ClaimStatus::Received,
            ClaimStatus::Initiated,
            ClaimStatus::Negotiating,
            ClaimStatus::AwaitingPayout,
            ClaimStatus::Paid,
            ClaimStatus::Rejected,
        ] {
            let parsed: ClaimStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    fn any_status() -> impl Strategy<Value = ClaimStatus> {
        prop::sample::select(vec![
            ClaimStatus::Submitted,
            ClaimStatus::Received,
            ClaimStatus::Initiated,
            ClaimStatus::Negotiating,
            ClaimStatus::AwaitingPayout,
            ClaimStatus::Paid,
            ClaimStatus::Rejected,
        ])
    }

    proptest! {
        // Under any update sequence the pipeline only moves forward, and a
        // refused update leaves the status untouched.
        #[test]
        fn prop_status_never_moves_backward(
            targets in prop::collection::vec(any_status(), 1..12),
        ) {
            let mut claim =
                Claim::new(TrackingCode::generate(), claimant(), ClaimantRole::Driver);
            for target in targets {
                let before = claim.status;
                match claim.update_status(target) {
                    Ok(()) => {
                        prop_assert!(!before.is_terminal());
                        prop_assert!(
                            target == ClaimStatus::Rejected
                                || target.pipeline_index() > before.pipeline_index()
                        );
                        prop_assert_eq!(claim.status, target);
                    }
                    Err(_) => prop_assert_eq!(claim.status, before),
                }
            }
        }
    }
}
