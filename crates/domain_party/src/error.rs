//! Party domain errors

use thiserror::Error;

/// Errors that can occur in the party domain
#[derive(Debug, Error)]
pub enum PartyError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Account is pending approval")]
    NotApproved,

    #[error("Invalid credentials")]
    InvalidCredentials,
}
