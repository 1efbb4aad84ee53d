//! Repository implementations of the domain port traits

mod claims;
mod outbox;
mod users;

pub use claims::PgClaimStore;
pub use outbox::PgOutboxStore;
pub use users::PgUserDirectory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use core_kernel::PortError;

use crate::error::corrupt_column;

/// Serializes a unit-variant enum to its snake_case text form
pub(crate) fn enum_text<T: Serialize>(value: &T) -> Result<String, PortError> {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => Ok(s),
        Ok(other) => Err(PortError::internal(format!(
            "expected enum to serialize to a string, got {other}"
        ))),
        Err(e) => Err(PortError::Internal {
            message: "enum serialization failed".into(),
            source: Some(Box::new(e)),
        }),
    }
}

/// Parses a snake_case text column back into a unit-variant enum
pub(crate) fn enum_from_text<T: DeserializeOwned>(
    text: &str,
    column: &str,
) -> Result<T, PortError> {
    serde_json::from_value(Value::String(text.to_string()))
        .map_err(|e| corrupt_column(column, e))
}

/// Serializes a structured sub-document for a JSONB column
pub(crate) fn json_column<T: Serialize>(value: &T, column: &str) -> Result<Value, PortError> {
    serde_json::to_value(value).map_err(|e| PortError::Internal {
        message: format!("failed to serialize {column} column"),
        source: Some(Box::new(e)),
    })
}

/// Deserializes a JSONB column back into its domain type
pub(crate) fn from_json_column<T: DeserializeOwned>(
    value: Value,
    column: &str,
) -> Result<T, PortError> {
    serde_json::from_value(value).map_err(|e| corrupt_column(column, e))
}
