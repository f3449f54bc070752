//! Error taxonomy for the export engine.
//!
//! Two levels exist. [`RowError`] belongs to a single source row: the row is
//! reported and skipped, its siblings are still mapped. [`ExportError`]
//! belongs to the whole request and means no record is produced.

use std::fmt;
use std::time::Duration;

use omopackager_core::PersonId;
use omopackager_warehouse::WarehouseError;

/// Source table a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Person,
    Death,
    Measurement,
    DrugExposure,
    Procedure,
    Condition,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person => write!(f, "person"),
            Self::Death => write!(f, "death"),
            Self::Measurement => write!(f, "measurement"),
            Self::DrugExposure => write!(f, "drug_exposure"),
            Self::Procedure => write!(f, "procedure_occurrence"),
            Self::Condition => write!(f, "condition_occurrence"),
        }
    }
}

/// One of the four concurrent fetches that make up an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Subject,
    Measurements,
    MedicalActions,
    Diseases,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Subject,
        Section::Measurements,
        Section::MedicalActions,
        Section::Diseases,
    ];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject => write!(f, "subject"),
            Self::Measurements => write!(f, "measurements"),
            Self::MedicalActions => write!(f, "medical_actions"),
            Self::Diseases => write!(f, "diseases"),
        }
    }
}

/// A source row that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("{entity} {row}: missing required field '{field}'")]
    MissingRequiredField {
        entity: Entity,
        row: i64,
        field: &'static str,
    },

    #[error("{entity} {row}: invalid field '{field}': {message}")]
    InvalidField {
        entity: Entity,
        row: i64,
        field: &'static str,
        message: String,
    },
}

impl RowError {
    pub fn entity(&self) -> Entity {
        match self {
            Self::MissingRequiredField { entity, .. } | Self::InvalidField { entity, .. } => *entity,
        }
    }

    pub fn row(&self) -> i64 {
        match self {
            Self::MissingRequiredField { row, .. } | Self::InvalidField { row, .. } => *row,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingRequiredField { field, .. } | Self::InvalidField { field, .. } => field,
        }
    }
}

/// Errors that end an export request without a record.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The person does not exist in the warehouse.
    #[error("Person not found: {person_id}")]
    NotFound { person_id: PersonId },

    /// The person exists but its own row cannot be mapped (e.g. no birth date).
    #[error("Person {person_id} cannot be exported: {source}")]
    UnmappableSubject {
        person_id: PersonId,
        source: RowError,
    },

    /// A retryable data-source error persisted through every retry.
    #[error("Transient data source error while fetching {section}: {source}")]
    TransientDataSource {
        section: Section,
        source: WarehouseError,
    },

    /// A data-source error that is not retried.
    #[error("Fatal data source error while fetching {section}: {source}")]
    FatalDataSource {
        section: Section,
        source: WarehouseError,
    },

    #[error("Export timed out after {} ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("Export cancelled")]
    Cancelled,

    #[error("Internal export error: {message}")]
    Internal { message: String },
}

impl ExportError {
    /// Wraps a warehouse error raised by `section`.
    #[must_use]
    pub fn data_source(section: Section, source: WarehouseError) -> Self {
        if source.is_transient() {
            Self::TransientDataSource { section, source }
        } else {
            Self::FatalDataSource { section, source }
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the error category for logging and status mapping.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::UnmappableSubject { .. } => ErrorCategory::InvalidData,
            Self::TransientDataSource { .. } | Self::FatalDataSource { .. } => {
                ErrorCategory::DataSource
            }
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of export errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    InvalidData,
    DataSource,
    Timeout,
    Cancelled,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::InvalidData => write!(f, "invalid_data"),
            Self::DataSource => write!(f, "data_source"),
            Self::Timeout => write!(f, "timeout"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Convenience result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
