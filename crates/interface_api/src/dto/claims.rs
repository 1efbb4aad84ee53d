//! Claim request bodies and the intake multipart parser
//!
//! The public intake form posts one multipart request: text fields carry
//! the claimant and incident data, and every file part is named after the
//! document category it fills (`identity`, `license`, `photos`, ...).
//! Unknown text fields are ignored so the form can evolve ahead of the
//! API.

use axum::extract::Multipart;
use chrono::NaiveDate;
use serde::Deserialize;

use core_kernel::UserId;
use domain_claims::{
    Claimant, ClaimantRole, ClaimFlags, ClaimStatus, Counterparty, DocumentCategory,
    IncidentDetails, IntakeRequest, UploadedFile,
};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub national_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<ClaimStatus>,
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: ClaimStatus,
}

#[derive(Debug, Deserialize)]
pub struct HandlerBody {
    pub handler_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct EntryBody {
    pub text: String,
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1" | "on" | "yes")
}

/// Drains an intake multipart request into an [`IntakeRequest`].
///
/// Validation of the assembled request is the domain's job; this only
/// rejects malformed transport (bad multipart, unparseable role/date).
pub async fn parse_intake(mut multipart: Multipart) -> Result<IntakeRequest, ApiError> {
    let mut claimant = Claimant {
        name: String::new(),
        national_id: String::new(),
        email: String::new(),
        phone: None,
        address: None,
    };
    let mut role: Option<ClaimantRole> = None;
    let mut flags = ClaimFlags::default();
    let mut incident = IncidentDetails::default();
    let mut counterparty = Counterparty::default();
    let mut bank_account = None;
    let mut referral_code = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Ok(category) = name.parse::<DocumentCategory>() {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("failed to read {name}: {e}")))?;
            files.push(UploadedFile {
                category,
                filename,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read {name}: {e}")))?;
        match name.as_str() {
            "name" => claimant.name = value,
            "national_id" => claimant.national_id = value,
            "email" => claimant.email = value,
            "phone" => claimant.phone = Some(value),
            "address" => claimant.address = Some(value),
            "role" => {
                role = Some(value.parse::<ClaimantRole>().map_err(ApiError::from)?);
            }
            "has_own_insurance" => flags.has_own_insurance = parse_flag(&value),
            "filed_police_report" => flags.filed_police_report = parse_flag(&value),
            "occurred_during_commute" => flags.occurred_during_commute = parse_flag(&value),
            "has_occupational_insurance" => {
                flags.has_occupational_insurance = parse_flag(&value)
            }
            "suffered_injury" => flags.suffered_injury = parse_flag(&value),
            "police_intervened" => flags.police_intervened = parse_flag(&value),
            "ambulance_intervened" => flags.ambulance_intervened = parse_flag(&value),
            "incident_date" => {
                let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
                    ApiError::bad_request(format!("'{value}' is not a valid date (YYYY-MM-DD)"))
                })?;
                incident.date = Some(date);
            }
            "incident_time" => incident.time = Some(value),
            "incident_location" => incident.location = Some(value),
            "incident_locality" => incident.locality = Some(value),
            "incident_province" => incident.province = Some(value),
            "narrative" => incident.narrative = Some(value),
            "counterparty_insurer_name" => counterparty.insurer_name = Some(value),
            "counterparty_name" => counterparty.name = Some(value),
            "counterparty_national_id" => counterparty.national_id = Some(value),
            "counterparty_plate" => counterparty.plate = Some(value),
            "counterparty_vehicle_description" => {
                counterparty.vehicle_description = Some(value)
            }
            "bank_account" => bank_account = Some(value),
            "referral_code" => referral_code = Some(value),
            _ => {}
        }
    }

    let claimant_role =
        role.ok_or_else(|| ApiError::bad_request("the claimant role field is required"))?;

    Ok(IntakeRequest {
        claimant,
        claimant_role,
        flags,
        incident,
        counterparty,
        bank_account,
        referral_code,
        files,
    })
}
