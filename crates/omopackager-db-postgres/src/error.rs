//! Error types for the PostgreSQL warehouse backend.

use omopackager_warehouse::WarehouseError;
use sqlx_core::error::Error as SqlxError;

/// PostgreSQL error code for serialization failure (40001).
pub const PG_SERIALIZATION_FAILURE: &str = "40001";

/// PostgreSQL error code for deadlock detected (40P01).
pub const PG_DEADLOCK_DETECTED: &str = "40P01";

/// PostgreSQL error code for lock not available (55P03).
pub const PG_LOCK_NOT_AVAILABLE: &str = "55P03";

/// PostgreSQL error code for query cancelled (57014).
pub const PG_QUERY_CANCELED: &str = "57014";

/// Checks if a sqlx error has a specific PostgreSQL error code.
pub fn has_pg_error_code(err: &SqlxError, code: &str) -> bool {
    if let SqlxError::Database(db_err) = err {
        db_err.code().as_deref() == Some(code)
    } else {
        false
    }
}

/// Returns `true` if re-issuing the query may succeed.
///
/// Serialization failures, deadlocks, lock timeouts, cancelled statements
/// and socket errors are transient. Pool timeouts and closure, TLS,
/// protocol, decode and all other database errors are not.
pub fn is_transient(err: &SqlxError) -> bool {
    match err {
        SqlxError::Io(_) => true,
        SqlxError::Database(_) => [
            PG_SERIALIZATION_FAILURE,
            PG_DEADLOCK_DETECTED,
            PG_LOCK_NOT_AVAILABLE,
            PG_QUERY_CANCELED,
        ]
        .iter()
        .any(|code| has_pg_error_code(err, code)),
        _ => false,
    }
}

/// Errors specific to the PostgreSQL warehouse backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Error reported by sqlx (connection, query or row decoding).
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns `true` if the operation may be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database(e) => is_transient(e),
            Self::Config { .. } => false,
        }
    }
}

impl From<PostgresError> for WarehouseError {
    fn from(err: PostgresError) -> Self {
        if err.is_transient() {
            WarehouseError::transient(err.to_string())
        } else {
            WarehouseError::fatal(err.to_string())
        }
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;
