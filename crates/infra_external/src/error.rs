//! Mapping from HTTP failures to port errors

use core_kernel::PortError;
use reqwest::StatusCode;

/// Converts a transport-level reqwest failure
pub(crate) fn transport_error(service: &str, e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        return PortError::Timeout {
            operation: format!("{service} request"),
            duration_ms: 0,
        };
    }
    if e.is_connect() {
        return PortError::Connection {
            message: format!("could not reach {service}"),
            source: Some(Box::new(e)),
        };
    }
    PortError::Internal {
        message: format!("{service} request failed"),
        source: Some(Box::new(e)),
    }
}

/// Converts a non-success HTTP status
pub(crate) fn status_error(service: &str, status: StatusCode, body: String) -> PortError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            PortError::unauthorized(format!("{service} rejected credentials: {body}"))
        }
        StatusCode::NOT_FOUND => PortError::not_found(service, body),
        StatusCode::TOO_MANY_REQUESTS => PortError::RateLimited {
            retry_after_secs: 60,
        },
        s if s.is_server_error() => PortError::ServiceUnavailable {
            service: service.to_string(),
        },
        s => PortError::internal(format!("{service} returned {s}: {body}")),
    }
}
