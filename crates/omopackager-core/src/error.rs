use thiserror::Error;

/// Core error types for phenopacket model construction
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid ontology class id: {0}")]
    InvalidCurie(String),

    #[error("Invalid interval: start {start} is after end {end}")]
    InvalidInterval { start: String, end: String },

    #[error("Invalid person id: {0}")]
    InvalidPersonId(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl CoreError {
    /// Create a new InvalidCurie error
    pub fn invalid_curie(id: impl Into<String>) -> Self {
        Self::InvalidCurie(id.into())
    }

    /// Create a new InvalidInterval error
    pub fn invalid_interval(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self::InvalidInterval {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Create a new InvalidPersonId error
    pub fn invalid_person_id(id: impl Into<String>) -> Self {
        Self::InvalidPersonId(id.into())
    }

    /// Create a new InvalidTimestamp error
    pub fn invalid_timestamp(message: impl Into<String>) -> Self {
        Self::InvalidTimestamp(message.into())
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCurie(_) | Self::InvalidInterval { .. } => ErrorCategory::Model,
            Self::InvalidPersonId(_) => ErrorCategory::Request,
            Self::InvalidTimestamp(_) => ErrorCategory::Model,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Model,
    Request,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Request => write!(f, "request"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::invalid_curie("no-colon");
        assert_eq!(err.to_string(), "Invalid ontology class id: no-colon");
        assert_eq!(err.category(), ErrorCategory::Model);

        let err = CoreError::invalid_interval("2020-01-02", "2020-01-01");
        assert!(err.to_string().contains("2020-01-02"));
        assert_eq!(err.category(), ErrorCategory::Model);

        let err = CoreError::invalid_person_id("abc");
        assert_eq!(err.category(), ErrorCategory::Request);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Model.to_string(), "model");
        assert_eq!(ErrorCategory::Request.to_string(), "request");
    }
}
