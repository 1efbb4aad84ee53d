//! Claims domain errors

use core_kernel::PortError;
use thiserror::Error;

use crate::claim::ClaimStatus;

/// Errors that can occur while operating on claims
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Intake or input validation failure, with a message naming the problem
    #[error("{0}")]
    Validation(String),

    #[error("Cannot transition claim from {from:?} to {to:?}")]
    InvalidStatusTransition { from: ClaimStatus, to: ClaimStatus },

    #[error("Claim not found: {0}")]
    NotFound(String),

    #[error("Operation not permitted: {0}")]
    Permission(String),

    /// A retriable persistence conflict that ran out of retries
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission(message.into())
    }
}
