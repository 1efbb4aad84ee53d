//! Partial claim updates
//!
//! Staff correct claimant contact details, incident facts, and payout
//! data after intake. [`ClaimPatch`] whitelists exactly which fields can
//! change; identifiers, status, attachments, and audit fields are not
//! reachable through it.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::claim::Claim;

/// Field-by-field optional update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClaimPatch {
    pub claimant_email: Option<String>,
    pub claimant_phone: Option<String>,
    pub claimant_address: Option<String>,
    pub incident_date: Option<NaiveDate>,
    pub incident_time: Option<String>,
    pub incident_location: Option<String>,
    pub incident_locality: Option<String>,
    pub incident_province: Option<String>,
    pub incident_narrative: Option<String>,
    pub counterparty_insurer_name: Option<String>,
    pub counterparty_name: Option<String>,
    pub counterparty_national_id: Option<String>,
    pub counterparty_plate: Option<String>,
    pub counterparty_vehicle_description: Option<String>,
    pub bank_account: Option<String>,
}

impl ClaimPatch {
    pub fn is_empty(&self) -> bool {
        self.claimant_email.is_none()
            && self.claimant_phone.is_none()
            && self.claimant_address.is_none()
            && self.incident_date.is_none()
            && self.incident_time.is_none()
            && self.incident_location.is_none()
            && self.incident_locality.is_none()
            && self.incident_province.is_none()
            && self.incident_narrative.is_none()
            && self.counterparty_insurer_name.is_none()
            && self.counterparty_name.is_none()
            && self.counterparty_national_id.is_none()
            && self.counterparty_plate.is_none()
            && self.counterparty_vehicle_description.is_none()
            && self.bank_account.is_none()
    }

    /// Applies every present field to the claim
    pub fn apply(self, claim: &mut Claim) {
        if let Some(v) = self.claimant_email {
            claim.claimant.email = v;
        }
        if let Some(v) = self.claimant_phone {
            claim.claimant.phone = Some(v);
        }
        if let Some(v) = self.claimant_address {
            claim.claimant.address = Some(v);
        }
        if let Some(v) = self.incident_date {
            claim.incident.date = Some(v);
        }
        if let Some(v) = self.incident_time {
            claim.incident.time = Some(v);
        }
        if let Some(v) = self.incident_location {
            claim.incident.location = Some(v);
        }
        if let Some(v) = self.incident_locality {
            claim.incident.locality = Some(v);
        }
        if let Some(v) = self.incident_province {
            claim.incident.province = Some(v);
        }
        if let Some(v) = self.incident_narrative {
            claim.incident.narrative = Some(v);
        }
        if let Some(v) = self.counterparty_insurer_name {
            claim.counterparty.insurer_name = Some(v);
        }
        if let Some(v) = self.counterparty_name {
            claim.counterparty.name = Some(v);
        }
        if let Some(v) = self.counterparty_national_id {
            claim.counterparty.national_id = Some(v);
        }
        if let Some(v) = self.counterparty_plate {
            claim.counterparty.plate = Some(v);
        }
        if let Some(v) = self.counterparty_vehicle_description {
            claim.counterparty.vehicle_description = Some(v);
        }
        if let Some(v) = self.bank_account {
            claim.bank_account = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{Claimant, ClaimantRole, ClaimStatus};
    use core_kernel::TrackingCode;

    #[test]
    fn applies_only_present_fields() {
        let mut claim = Claim::new(
            TrackingCode::generate(),
            Claimant {
                name: "Maria Lopez".into(),
                national_id: "30123456".into(),
                email: "old@example.com".into(),
                phone: Some("111".into()),
                address: None,
            },
            ClaimantRole::Pedestrian,
        );

        let patch = ClaimPatch {
            claimant_email: Some("new@example.com".into()),
            bank_account: Some("2850590940090418135201".into()),
            ..ClaimPatch::default()
        };
        patch.apply(&mut claim);

        assert_eq!(claim.claimant.email, "new@example.com");
        assert_eq!(claim.claimant.phone.as_deref(), Some("111"));
        assert!(claim.bank_account.is_some());
        assert_eq!(claim.status, ClaimStatus::Submitted);
    }

    #[test]
    fn empty_patch_detected() {
        assert!(ClaimPatch::default().is_empty());
        let patch = ClaimPatch {
            incident_time: Some("14:30".into()),
            ..ClaimPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
