//! Generated legal documents
//!
//! Three documents are produced at intake and stored alongside the
//! claimant's uploads: a representation letter and a fee agreement for
//! every claim, and a no-insurance affidavit for uninsured drivers. The
//! affidavit takes the insurance-certificate slot, since the two are
//! mutually exclusive.

use serde::Serialize;

use crate::claim::DocumentCategory;
use crate::intake::IntakeRequest;

/// Document templates the renderer knows how to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    NoInsuranceAffidavit,
    RepresentationLetter,
    FeeAgreement,
}

impl DocumentKind {
    /// Attachment slot the rendered document is stored under
    pub fn category(self) -> DocumentCategory {
        match self {
            Self::NoInsuranceAffidavit => DocumentCategory::InsuranceCertificate,
            Self::RepresentationLetter => DocumentCategory::RepresentationLetter,
            Self::FeeAgreement => DocumentCategory::FeeAgreement,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::NoInsuranceAffidavit => "affidavit",
            Self::RepresentationLetter => "representation-letter",
            Self::FeeAgreement => "fee-agreement",
        }
    }
}

/// Fields substituted into a document template.
///
/// The affidavit uses the full set; the letter and fee agreement only
/// need the identity fields and leave the rest empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentFields {
    pub claimant_name: String,
    pub claimant_national_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_national_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_vehicle: Option<String>,
}

impl DocumentFields {
    fn identity_only(request: &IntakeRequest) -> Self {
        Self {
            claimant_name: request.claimant.name.clone(),
            claimant_national_id: request.claimant.national_id.clone(),
            ..Self::default()
        }
    }

    pub fn representation_letter(request: &IntakeRequest) -> Self {
        Self::identity_only(request)
    }

    pub fn fee_agreement(request: &IntakeRequest) -> Self {
        Self::identity_only(request)
    }

    pub fn affidavit(request: &IntakeRequest) -> Self {
        let incident = &request.incident;
        let counterparty = &request.counterparty;
        let vehicle = match (&counterparty.plate, &counterparty.vehicle_description) {
            (Some(plate), Some(desc)) => Some(format!("{desc} ({plate})")),
            (Some(plate), None) => Some(plate.clone()),
            (None, desc) => desc.clone(),
        };
        Self {
            incident_date: incident.date.map(|d| d.format("%d/%m/%Y").to_string()),
            incident_place: incident.location.clone().or_else(|| incident.locality.clone()),
            narrative: incident.narrative.clone(),
            counterparty_name: counterparty.name.clone(),
            counterparty_national_id: counterparty.national_id.clone(),
            counterparty_vehicle: vehicle,
            ..Self::identity_only(request)
        }
    }
}
