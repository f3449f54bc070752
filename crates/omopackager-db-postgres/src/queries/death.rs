//! Death row with its cause concept.

use omopackager_core::PersonId;
use omopackager_warehouse::DeathRow;
use sqlx_core::error::Error as SqlxError;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;

use super::timestamp;

/// Latest death record. The time falls back to the death date.
pub const SQL: &str = r#"
SELECT d.person_id::int8 AS person_id,
       coalesce(d.death_datetime, d.death_date::timestamp) AS death_datetime,
       CASE WHEN c.concept_id IS NULL THEN NULL
            ELSE replace(c.vocabulary_id, ' ', '_') || ':' || c.concept_code END AS cause_id,
       c.concept_name AS cause_label
FROM death d
LEFT JOIN concept c ON c.concept_id = d.cause_concept_id
WHERE d.person_id = $1
ORDER BY d.death_date DESC, d.death_datetime DESC NULLS LAST
LIMIT 1
"#;

pub(crate) fn decode(row: &PgRow) -> Result<DeathRow, SqlxError> {
    Ok(DeathRow {
        person_id: PersonId::new(row.try_get("person_id")?),
        death_datetime: timestamp(row, "death_datetime")?,
        cause_id: row.try_get("cause_id")?,
        cause_label: row.try_get("cause_label")?,
    })
}
