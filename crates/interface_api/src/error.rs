//! API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use core_kernel::{CoreError, PortError};
use domain_claims::ClaimError;
use domain_party::PartyError;

/// Error carrying the HTTP status it should be reported with
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Logs the underlying failure and hides it behind a generic message
    pub fn internal(source: impl std::fmt::Display) -> Self {
        error!(error = %source, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ClaimError> for ApiError {
    fn from(e: ClaimError) -> Self {
        match e {
            ClaimError::Validation(msg) => Self::bad_request(msg),
            ClaimError::InvalidStatusTransition { .. } => Self::conflict(e.to_string()),
            ClaimError::NotFound(msg) => Self::not_found(msg),
            ClaimError::Permission(msg) => Self::forbidden(msg),
            ClaimError::Conflict(msg) => Self::conflict(msg),
            ClaimError::Port(port) => port.into(),
        }
    }
}

impl From<PortError> for ApiError {
    fn from(e: PortError) -> Self {
        match &e {
            PortError::NotFound { .. } => Self::not_found(e.to_string()),
            PortError::Validation { message } => Self::bad_request(message.clone()),
            PortError::Conflict { message } => Self::conflict(message.clone()),
            PortError::Unauthorized { message } => Self::unauthorized(message.clone()),
            _ => Self::internal(e),
        }
    }
}

impl From<PartyError> for ApiError {
    fn from(e: PartyError) -> Self {
        match &e {
            PartyError::UserNotFound(_) => Self::not_found(e.to_string()),
            PartyError::EmailTaken(_) => Self::conflict(e.to_string()),
            PartyError::NotApproved => Self::forbidden(e.to_string()),
            PartyError::InvalidCredentials => Self::unauthorized(e.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::bad_request(e.to_string())
    }
}
