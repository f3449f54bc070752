//! SQL queries against the OMOP CDM tables, one module per warehouse row.
//!
//! Every query is scoped by `person_id` (`$1`), has a total `ORDER BY`, and
//! resolves concept relationships through `LATERAL ... LIMIT 1` so that one
//! occurrence row always yields one result row. Concept ids are rendered as
//! `VOCABULARY:CODE` (spaces in the vocabulary id become `_`), or `NULL`
//! when the concept does not resolve.

pub mod condition;
pub mod death;
pub mod drug_exposure;
pub mod measurement;
pub mod person;
pub mod procedure;

use chrono::{DateTime, NaiveDateTime, Utc};
use omopackager_core::Timestamp;
use sqlx_core::error::Error as SqlxError;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;
use time::OffsetDateTime;

/// Converts chrono DateTime to time OffsetDateTime.
///
/// Values outside the range `time` supports are a decode error.
fn chrono_to_time(dt: DateTime<Utc>) -> Result<OffsetDateTime, SqlxError> {
    let seconds = OffsetDateTime::from_unix_timestamp(dt.timestamp())
        .map_err(|e| SqlxError::Decode(Box::new(e)))?;
    seconds
        .checked_add(time::Duration::nanoseconds(i64::from(dt.timestamp_subsec_nanos())))
        .ok_or_else(|| SqlxError::Decode(format!("timestamp {dt} is out of range").into()))
}

/// Reads a `timestamp without time zone` column, interpreted as UTC.
pub(crate) fn timestamp(row: &PgRow, column: &str) -> Result<Option<Timestamp>, SqlxError> {
    let value: Option<NaiveDateTime> = row.try_get(column)?;
    value
        .map(|naive| chrono_to_time(naive.and_utc()).map(Timestamp::new))
        .transpose()
}
