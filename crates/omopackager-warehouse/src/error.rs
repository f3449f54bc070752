//! Warehouse error types.

use std::fmt;

/// Errors raised while fetching rows from the warehouse.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WarehouseError {
    /// A failure that may succeed if the query is issued again
    /// (serialization failure, deadlock, dropped socket).
    #[error("Transient data source error: {message}")]
    Transient {
        /// Description of the failure.
        message: String,
    },

    /// A failure that will not go away by retrying
    /// (pool exhaustion, bad configuration, schema mismatch).
    #[error("Fatal data source error: {message}")]
    Fatal {
        /// Description of the failure.
        message: String,
    },
}

impl WarehouseError {
    /// Creates a new `Transient` error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Creates a new `Fatal` error.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// Returns `true` if the operation may be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transient { .. } => ErrorCategory::Transient,
            Self::Fatal { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Categories of warehouse errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Retryable failure.
    Transient,
    /// Infrastructure/connection failure.
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WarehouseError::transient("deadlock detected");
        assert_eq!(
            err.to_string(),
            "Transient data source error: deadlock detected"
        );

        let err = WarehouseError::fatal("pool timed out");
        assert_eq!(err.to_string(), "Fatal data source error: pool timed out");
    }

    #[test]
    fn test_error_predicates() {
        assert!(WarehouseError::transient("x").is_transient());
        assert!(!WarehouseError::fatal("x").is_transient());
        assert_eq!(
            WarehouseError::fatal("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(ErrorCategory::Transient.to_string(), "transient");
    }
}
