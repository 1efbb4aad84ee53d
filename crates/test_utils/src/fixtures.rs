//! Canonical sample data

use chrono::NaiveDate;

use domain_claims::{Claimant, Counterparty, DocumentCategory, IncidentDetails, UploadedFile};

/// Bcrypt hash of "hunter2hunter2" at cost 10
pub const PASSWORD_HASH: &str =
    "$2b$10$CwTycUXWue0Thq9StjUM0uJ8e/OMkOW3xYbZkO0u0EPekwO0FZGfa";

pub fn claimant() -> Claimant {
    Claimant {
        name: "Maria Lopez".into(),
        national_id: "30123456".into(),
        email: "maria@example.com".into(),
        phone: Some("+54 11 5555 1234".into()),
        address: Some("Calle 7 1234, La Plata".into()),
    }
}

pub fn incident() -> IncidentDetails {
    IncidentDetails {
        date: NaiveDate::from_ymd_opt(2025, 3, 14),
        time: Some("14:30".into()),
        location: Some("Av. 13 y 44".into()),
        locality: Some("La Plata".into()),
        province: Some("Buenos Aires".into()),
        narrative: Some("Rear-ended while stopped at a red light".into()),
    }
}

pub fn counterparty() -> Counterparty {
    Counterparty {
        insurer_name: None,
        name: Some("Carlos Diaz".into()),
        national_id: Some("25999888".into()),
        plate: Some("AB123CD".into()),
        vehicle_description: Some("Gray sedan".into()),
    }
}

/// A small valid PDF upload for the given slot
pub fn document(category: DocumentCategory) -> UploadedFile {
    UploadedFile {
        category,
        filename: format!("{}.pdf", category.tag()),
        content_type: "application/pdf".into(),
        bytes: vec![0x25, 0x50, 0x44, 0x46, 0x2d, 0x31, 0x2e, 0x34],
    }
}
