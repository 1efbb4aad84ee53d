//! Mapping from sqlx errors to port errors

use core_kernel::PortError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Converts a database error into the port error vocabulary.
///
/// Unique violations surface as `Conflict` so callers can react (the
/// tracking-code retry loop and duplicate email registration both depend
/// on this); connection-level failures map to transient variants.
pub fn db_error(e: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(ref db) = e {
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return PortError::conflict(db.message().to_string()),
            Some(FOREIGN_KEY_VIOLATION) => {
                return PortError::validation(db.message().to_string())
            }
            _ => {}
        }
    }
    match e {
        sqlx::Error::PoolTimedOut => PortError::Timeout {
            operation: "acquire database connection".into(),
            duration_ms: 0,
        },
        sqlx::Error::Io(err) => PortError::Connection {
            message: "database connection failed".into(),
            source: Some(Box::new(err)),
        },
        other => PortError::Internal {
            message: "database operation failed".into(),
            source: Some(Box::new(other)),
        },
    }
}

/// Converts a JSONB column that failed to deserialize
pub(crate) fn corrupt_column(column: &str, e: serde_json::Error) -> PortError {
    PortError::Internal {
        message: format!("corrupt {column} column"),
        source: Some(Box::new(e)),
    }
}
