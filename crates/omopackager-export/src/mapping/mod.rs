//! Per-entity row decoders and the mappers built on top of them.
//!
//! Each `decode_*` function turns one warehouse row into one record or a
//! [`RowError`]. Decoders are pure: they never touch the warehouse and can be
//! tested on literal rows. The `map_*`/`resolve_*` functions fetch the rows
//! for a person and run the decoder over them.

pub mod disease;
pub mod individual;
pub mod measurement;
pub mod medical_action;

use omopackager_core::{OntologyClass, Timestamp};
use tracing::warn;

use crate::error::{Entity, RowError};

pub use disease::{decode_disease, map_diseases};
pub use individual::{decode_individual, resolve_individual, sex_from_gender_concept};
pub use measurement::{decode_measurement, map_measurements};
pub use medical_action::{decode_procedure, decode_treatment, map_medical_actions};

/// Records decoded from a batch of rows, plus the rows that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapped<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RowError>,
}

impl<T> Default for Mapped<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Mapped<T> {
    /// Appends another batch, keeping record order.
    pub fn extend_with<U>(&mut self, other: Mapped<U>)
    where
        U: Into<T>,
    {
        self.records.extend(other.records.into_iter().map(Into::into));
        self.rejected.extend(other.rejected);
    }
}

/// Decodes every row, skipping and logging the ones that fail.
pub fn map_rows<R, T>(rows: &[R], decode: impl Fn(&R) -> Result<T, RowError>) -> Mapped<T> {
    let mut mapped = Mapped {
        records: Vec::with_capacity(rows.len()),
        rejected: Vec::new(),
    };
    for row in rows {
        match decode(row) {
            Ok(record) => mapped.records.push(record),
            Err(err) => {
                warn!(
                    entity = %err.entity(),
                    row = err.row(),
                    field = err.field(),
                    error = %err,
                    "skipping unmappable row"
                );
                mapped.rejected.push(err);
            }
        }
    }
    mapped
}

/// Identifies the row being decoded, for error reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowContext {
    pub entity: Entity,
    pub row: i64,
}

impl RowContext {
    pub fn new(entity: Entity, row: i64) -> Self {
        Self { entity, row }
    }

    pub fn missing(&self, field: &'static str) -> RowError {
        RowError::MissingRequiredField {
            entity: self.entity,
            row: self.row,
            field,
        }
    }

    pub fn invalid(&self, field: &'static str, message: impl Into<String>) -> RowError {
        RowError::InvalidField {
            entity: self.entity,
            row: self.row,
            field,
            message: message.into(),
        }
    }

    pub fn required(&self, value: Option<Timestamp>, field: &'static str) -> Result<Timestamp, RowError> {
        value.ok_or_else(|| self.missing(field))
    }

    /// A term whose absent parts default to "".
    pub fn term(
        &self,
        id: Option<&str>,
        label: Option<&str>,
        field: &'static str,
    ) -> Result<OntologyClass, RowError> {
        OntologyClass::or_empty(id, label).map_err(|e| self.invalid(field, e.to_string()))
    }

    /// A term that exists only when both id and label are present.
    pub fn optional_term(
        &self,
        id: Option<&str>,
        label: Option<&str>,
        field: &'static str,
    ) -> Result<Option<OntologyClass>, RowError> {
        match (id, label) {
            (Some(id), Some(label)) => OntologyClass::new(id, label)
                .map(Some)
                .map_err(|e| self.invalid(field, e.to_string())),
            _ => Ok(None),
        }
    }
}
