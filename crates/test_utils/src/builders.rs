//! Fluent builders for intake requests and users

use domain_claims::{
    Claimant, ClaimantRole, ClaimFlags, Counterparty, DocumentCategory, IncidentDetails,
    IntakeRequest, UploadedFile,
};
use domain_party::{User, UserRole};

use crate::fixtures;

/// Builds intake requests starting from complete, valid presets
pub struct IntakeRequestBuilder {
    request: IntakeRequest,
}

impl IntakeRequestBuilder {
    /// Driver with their own insurance and the full document set
    pub fn insured_driver() -> Self {
        let mut flags = ClaimFlags::default();
        flags.has_own_insurance = true;
        flags.filed_police_report = true;
        Self {
            request: IntakeRequest {
                claimant: fixtures::claimant(),
                claimant_role: ClaimantRole::Driver,
                flags,
                incident: fixtures::incident(),
                counterparty: Counterparty {
                    insurer_name: Some("Seguros del Sur".into()),
                    ..Counterparty::default()
                },
                bank_account: None,
                referral_code: None,
                files: vec![
                    fixtures::document(DocumentCategory::Identity),
                    fixtures::document(DocumentCategory::License),
                    fixtures::document(DocumentCategory::VehicleRegistration),
                    fixtures::document(DocumentCategory::InsuranceCertificate),
                    fixtures::document(DocumentCategory::PoliceReport),
                    fixtures::document(DocumentCategory::BudgetEstimate),
                ],
            },
        }
    }

    /// Driver without insurance, carrying the counterparty details the
    /// affidavit needs
    pub fn uninsured_driver() -> Self {
        Self {
            request: IntakeRequest {
                claimant: fixtures::claimant(),
                claimant_role: ClaimantRole::Driver,
                flags: ClaimFlags::default(),
                incident: fixtures::incident(),
                counterparty: fixtures::counterparty(),
                bank_account: None,
                referral_code: None,
                files: vec![
                    fixtures::document(DocumentCategory::Identity),
                    fixtures::document(DocumentCategory::License),
                    fixtures::document(DocumentCategory::VehicleRegistration),
                ],
            },
        }
    }

    /// Pedestrian with identity and medical records
    pub fn pedestrian() -> Self {
        Self {
            request: IntakeRequest {
                claimant: fixtures::claimant(),
                claimant_role: ClaimantRole::Pedestrian,
                flags: ClaimFlags::default(),
                incident: fixtures::incident(),
                counterparty: Counterparty::default(),
                bank_account: None,
                referral_code: None,
                files: vec![
                    fixtures::document(DocumentCategory::Identity),
                    fixtures::document(DocumentCategory::MedicalRecords),
                ],
            },
        }
    }

    pub fn claimant(mut self, claimant: Claimant) -> Self {
        self.request.claimant = claimant;
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.request.claimant.email = email.into();
        self
    }

    pub fn referral_code(mut self, code: impl Into<String>) -> Self {
        self.request.referral_code = Some(code.into());
        self
    }

    pub fn incident(mut self, incident: IncidentDetails) -> Self {
        self.request.incident = incident;
        self
    }

    pub fn flag_injury(mut self) -> Self {
        self.request.flags.suffered_injury = true;
        self
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.request.files.push(file);
        self
    }

    /// Drops every file of a category, for missing-document scenarios
    pub fn without_document(mut self, category: DocumentCategory) -> Self {
        self.request.files.retain(|f| f.category != category);
        self
    }

    pub fn build(self) -> IntakeRequest {
        self.request
    }
}

/// Builds approved users with sensible defaults per role
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    pub fn new(name: &str, role: UserRole) -> Self {
        let email = format!(
            "{}@example.com",
            name.to_lowercase().replace(' ', ".")
        );
        let mut user = User::new(name, email, fixtures::PASSWORD_HASH, role);
        user.approve();
        Self { user }
    }

    pub fn admin() -> Self {
        Self::new("Ana Gomez", UserRole::Admin)
    }

    pub fn handler() -> Self {
        Self::new("Lucia Fernandez", UserRole::Handler)
    }

    pub fn producer() -> Self {
        Self::new("Pedro Sosa", UserRole::Producer)
    }

    pub fn organizer() -> Self {
        Self::new("Olga Ramirez", UserRole::Organizer)
    }

    pub fn unapproved(mut self) -> Self {
        self.user.is_approved = false;
        self
    }

    pub fn referred_by(mut self, referrer: &User) -> Self {
        self.user.referred_by = Some(referrer.id);
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.user.email = email.into();
        self
    }

    pub fn build(self) -> User {
        self.user
    }
}
