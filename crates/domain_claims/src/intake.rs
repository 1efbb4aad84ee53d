//! Intake validation
//!
//! The public intake form accepts claimant details plus a bundle of files.
//! Which documents are mandatory depends on the claimant's role in the
//! incident and the circumstance flags, so the whole request is validated
//! as a unit before anything is uploaded or persisted.

use crate::claim::{Claimant, ClaimantRole, ClaimFlags, Counterparty, DocumentCategory, IncidentDetails};
use crate::error::ClaimError;

/// Content types accepted for uploaded documents
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// A file received from the intake form, not yet stored
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub category: DocumentCategory,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Extension of the original filename, including the dot
    pub fn extension(&self) -> &str {
        match self.filename.rfind('.') {
            Some(idx) if idx > 0 => &self.filename[idx..],
            _ => "",
        }
    }
}

/// Everything the public intake form submits
#[derive(Debug, Clone)]
pub struct IntakeRequest {
    pub claimant: Claimant,
    pub claimant_role: ClaimantRole,
    pub flags: ClaimFlags,
    pub incident: IncidentDetails,
    pub counterparty: Counterparty,
    pub bank_account: Option<String>,
    /// Opaque referral identifier from an agent's shared link
    pub referral_code: Option<String>,
    pub files: Vec<UploadedFile>,
}

impl IntakeRequest {
    fn has(&self, category: DocumentCategory) -> bool {
        self.files.iter().any(|f| f.category == category)
    }
}

/// Upload constraints applied file by file
#[derive(Debug, Clone)]
pub struct IntakeLimits {
    pub max_file_bytes: usize,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Validates intake requests against role- and flag-dependent rules
#[derive(Debug, Clone, Default)]
pub struct IntakeValidator {
    limits: IntakeLimits,
}

impl IntakeValidator {
    pub fn new(limits: IntakeLimits) -> Self {
        Self { limits }
    }

    pub fn validate(&self, request: &IntakeRequest) -> Result<(), ClaimError> {
        self.validate_claimant(&request.claimant)?;
        for file in &request.files {
            self.validate_file(file)?;
        }
        self.validate_documents(request)
    }

    fn validate_claimant(&self, claimant: &Claimant) -> Result<(), ClaimError> {
        if claimant.name.trim().is_empty() {
            return Err(ClaimError::validation("Claimant name is required"));
        }
        if claimant.national_id.trim().is_empty() {
            return Err(ClaimError::validation("Claimant national id is required"));
        }
        if !claimant.email.contains('@') {
            return Err(ClaimError::validation("Claimant email is not valid"));
        }
        Ok(())
    }

    fn validate_file(&self, file: &UploadedFile) -> Result<(), ClaimError> {
        if !ALLOWED_CONTENT_TYPES.contains(&file.content_type.as_str()) {
            return Err(ClaimError::Validation(format!(
                "File {} has unsupported type {}; accepted types are PDF, JPEG, and PNG",
                file.filename, file.content_type
            )));
        }
        if file.size() > self.limits.max_file_bytes {
            return Err(ClaimError::Validation(format!(
                "File {} exceeds the {} MiB size limit",
                file.filename,
                self.limits.max_file_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }

    /// Role- and flag-dependent document requirements.
    ///
    /// - everyone: identity document
    /// - drivers: license and vehicle registration
    /// - insured drivers: insurance certificate, police report, budget estimate
    /// - uninsured drivers: incident narrative plus counterparty name, national
    ///   id, and vehicle details (feeds the generated affidavit)
    /// - passengers and pedestrians: medical records
    /// - anyone reporting an injury: medical records
    fn validate_documents(&self, request: &IntakeRequest) -> Result<(), ClaimError> {
        if !request.has(DocumentCategory::Identity) {
            return Err(ClaimError::validation("Missing identity document"));
        }

        match request.claimant_role {
            ClaimantRole::Driver => {
                if !request.has(DocumentCategory::License) {
                    return Err(ClaimError::validation("Missing driver's license"));
                }
                if !request.has(DocumentCategory::VehicleRegistration) {
                    return Err(ClaimError::validation("Missing vehicle registration"));
                }
                if request.flags.has_own_insurance {
                    if !request.has(DocumentCategory::InsuranceCertificate) {
                        return Err(ClaimError::validation("Missing insurance certificate"));
                    }
                    if !request.has(DocumentCategory::PoliceReport) {
                        return Err(ClaimError::validation("Missing police report"));
                    }
                    if !request.has(DocumentCategory::BudgetEstimate) {
                        return Err(ClaimError::validation("Missing repair budget estimate"));
                    }
                } else {
                    self.validate_uninsured_driver(request)?;
                }
            }
            ClaimantRole::Passenger | ClaimantRole::Pedestrian => {
                if !request.has(DocumentCategory::MedicalRecords) {
                    return Err(ClaimError::validation(
                        "Missing medical records documenting the injuries",
                    ));
                }
            }
        }

        if request.flags.suffered_injury && !request.has(DocumentCategory::MedicalRecords) {
            return Err(ClaimError::validation(
                "Missing medical records documenting the reported injury",
            ));
        }

        Ok(())
    }

    fn validate_uninsured_driver(&self, request: &IntakeRequest) -> Result<(), ClaimError> {
        if request
            .incident
            .narrative
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
        {
            return Err(ClaimError::validation(
                "An incident narrative is required when the claimant has no insurance",
            ));
        }
        let counterparty = &request.counterparty;
        let missing = counterparty.name.is_none()
            || counterparty.national_id.is_none()
            || (counterparty.plate.is_none() && counterparty.vehicle_description.is_none());
        if missing {
            return Err(ClaimError::validation(
                "Counterparty name, national id, and vehicle details are required \
                 when the claimant has no insurance",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(category: DocumentCategory) -> UploadedFile {
        UploadedFile {
            category,
            filename: format!("{}.pdf", category.tag()),
            content_type: "application/pdf".into(),
            bytes: vec![0u8; 128],
        }
    }

    fn base_request(role: ClaimantRole) -> IntakeRequest {
        IntakeRequest {
            claimant: Claimant {
                name: "Juan Perez".into(),
                national_id: "28111222".into(),
                email: "juan@example.com".into(),
                phone: None,
                address: None,
            },
            claimant_role: role,
            flags: ClaimFlags::default(),
            incident: IncidentDetails::default(),
            counterparty: Counterparty::default(),
            bank_account: None,
            referral_code: None,
            files: vec![file(DocumentCategory::Identity)],
        }
    }

    fn assert_validation_mentions(result: Result<(), ClaimError>, needle: &str) {
        match result {
            Err(ClaimError::Validation(msg)) => {
                assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn identity_document_always_required() {
        let mut request = base_request(ClaimantRole::Pedestrian);
        request.files.clear();
        request.files.push(file(DocumentCategory::MedicalRecords));
        assert_validation_mentions(
            IntakeValidator::default().validate(&request),
            "identity",
        );
    }

    #[test]
    fn insured_driver_needs_certificate_report_and_budget() {
        let mut request = base_request(ClaimantRole::Driver);
        request.flags.has_own_insurance = true;
        request.files.push(file(DocumentCategory::License));
        request.files.push(file(DocumentCategory::VehicleRegistration));
        request.files.push(file(DocumentCategory::InsuranceCertificate));
        request.files.push(file(DocumentCategory::PoliceReport));
        assert_validation_mentions(
            IntakeValidator::default().validate(&request),
            "budget",
        );

        request.files.push(file(DocumentCategory::BudgetEstimate));
        IntakeValidator::default().validate(&request).unwrap();
    }

    #[test]
    fn uninsured_driver_needs_narrative_and_counterparty() {
        let mut request = base_request(ClaimantRole::Driver);
        request.files.push(file(DocumentCategory::License));
        request.files.push(file(DocumentCategory::VehicleRegistration));
        assert_validation_mentions(
            IntakeValidator::default().validate(&request),
            "narrative",
        );

        request.incident.narrative = Some("Rear-ended at a red light".into());
        assert_validation_mentions(
            IntakeValidator::default().validate(&request),
            "Counterparty",
        );

        request.counterparty.name = Some("Carlos Diaz".into());
        request.counterparty.national_id = Some("25999888".into());
        request.counterparty.plate = Some("AB123CD".into());
        IntakeValidator::default().validate(&request).unwrap();
    }

    #[test]
    fn passenger_needs_medical_records() {
        let request = base_request(ClaimantRole::Passenger);
        assert_validation_mentions(
            IntakeValidator::default().validate(&request),
            "medical records",
        );
    }

    #[test]
    fn injury_flag_requires_medical_records_for_drivers() {
        let mut request = base_request(ClaimantRole::Driver);
        request.files.push(file(DocumentCategory::License));
        request.files.push(file(DocumentCategory::VehicleRegistration));
        request.incident.narrative = Some("Side collision".into());
        request.counterparty.name = Some("Ana Ruiz".into());
        request.counterparty.national_id = Some("30555111".into());
        request.counterparty.vehicle_description = Some("Gray sedan".into());
        request.flags.suffered_injury = true;
        assert_validation_mentions(
            IntakeValidator::default().validate(&request),
            "medical records",
        );
    }

    #[test]
    fn oversized_and_foreign_types_rejected() {
        let mut request = base_request(ClaimantRole::Pedestrian);
        request.files.push(UploadedFile {
            category: DocumentCategory::MedicalRecords,
            filename: "scan.tiff".into(),
            content_type: "image/tiff".into(),
            bytes: vec![0u8; 16],
        });
        assert_validation_mentions(
            IntakeValidator::default().validate(&request),
            "unsupported type",
        );

        request.files.pop();
        request.files.push(UploadedFile {
            category: DocumentCategory::MedicalRecords,
            filename: "scan.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: vec![0u8; 10 * 1024 * 1024 + 1],
        });
        assert_validation_mentions(
            IntakeValidator::default().validate(&request),
            "size limit",
        );
    }
}
