//! Measurement rows with assay, unit and categorical value concepts.

use omopackager_warehouse::MeasurementRow;
use sqlx_core::error::Error as SqlxError;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;

use super::timestamp;

/// Numeric columns are cast to `float8`; the categorical label prefers the
/// raw source value over the concept name.
pub const SQL: &str = r#"
SELECT m.measurement_id::int8 AS measurement_id,
       CASE WHEN ca.concept_id IS NULL THEN NULL
            ELSE replace(ca.vocabulary_id, ' ', '_') || ':' || ca.concept_code END AS assay_id,
       ca.concept_name AS assay_label,
       m.value_as_number::float8 AS value_as_number,
       CASE WHEN cv.concept_id IS NULL THEN NULL
            ELSE replace(cv.vocabulary_id, ' ', '_') || ':' || cv.concept_code END AS value_id,
       coalesce(m.value_source_value, cv.concept_name) AS value_label,
       CASE WHEN cu.concept_id IS NULL THEN NULL
            ELSE replace(cu.vocabulary_id, ' ', '_') || ':' || cu.concept_code END AS unit_id,
       cu.concept_name AS unit_label,
       m.unit_source_value,
       m.range_low::float8 AS range_low,
       m.range_high::float8 AS range_high,
       coalesce(m.measurement_datetime, m.measurement_date::timestamp) AS measurement_datetime
FROM measurement m
LEFT JOIN concept ca ON ca.concept_id = m.measurement_concept_id
LEFT JOIN concept cu ON cu.concept_id = m.unit_concept_id
LEFT JOIN concept cv ON cv.concept_id = m.value_as_concept_id
WHERE m.person_id = $1
ORDER BY m.measurement_date, m.measurement_datetime NULLS LAST, m.measurement_id
"#;

pub(crate) fn decode(row: &PgRow) -> Result<MeasurementRow, SqlxError> {
    Ok(MeasurementRow {
        measurement_id: row.try_get("measurement_id")?,
        assay_id: row.try_get("assay_id")?,
        assay_label: row.try_get("assay_label")?,
        value_as_number: row.try_get("value_as_number")?,
        value_id: row.try_get("value_id")?,
        value_label: row.try_get("value_label")?,
        unit_id: row.try_get("unit_id")?,
        unit_label: row.try_get("unit_label")?,
        unit_source_value: row.try_get("unit_source_value")?,
        range_low: row.try_get("range_low")?,
        range_high: row.try_get("range_high")?,
        measurement_datetime: timestamp(row, "measurement_datetime")?,
    })
}
