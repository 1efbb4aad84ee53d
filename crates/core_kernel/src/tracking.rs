//! Public tracking codes
//!
//! A tracking code is the short identifier a claimant uses to self-serve
//! status checks. Codes are 6 uppercase hex characters derived from 3 random
//! bytes, giving a 16.7M code space. Uniqueness is enforced by the store;
//! callers regenerate on a duplicate report.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A 6-character uppercase hexadecimal tracking code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingCode(String);

impl TrackingCode {
    /// Generates a new random tracking code from 3 random bytes
    pub fn generate() -> Self {
        let mut bytes = [0u8; 3];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(format!(
            "{:02X}{:02X}{:02X}",
            bytes[0], bytes[1], bytes[2]
        ))
    }

    /// Returns the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TrackingCode {
    type Err = CoreError;

    /// Parses a tracking code, accepting lowercase input from claimants
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        if normalized.len() != 6 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::validation(format!(
                "'{}' is not a valid tracking code",
                s
            )));
        }
        Ok(Self(normalized))
    }
}
