//! Drug exposure rows joined with one drug strength entry.

use omopackager_warehouse::DrugExposureRow;
use sqlx_core::error::Error as SqlxError;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;

use super::timestamp;

/// A drug with several ingredients has several strength rows; the one with
/// the lowest ingredient concept id is used.
pub const SQL: &str = r#"
SELECT de.drug_exposure_id::int8 AS drug_exposure_id,
       CASE WHEN c.concept_id IS NULL THEN NULL
            ELSE replace(c.vocabulary_id, ' ', '_') || ':' || c.concept_code END AS agent_id,
       c.concept_name AS agent_label,
       CASE WHEN cr.concept_id IS NULL THEN NULL
            ELSE replace(cr.vocabulary_id, ' ', '_') || ':' || cr.concept_code END AS route_id,
       cr.concept_name AS route_label,
       CASE WHEN cu.concept_id IS NULL THEN NULL
            ELSE replace(cu.vocabulary_id, ' ', '_') || ':' || cu.concept_code END AS quantity_unit_id,
       cu.concept_name AS quantity_unit_label,
       ds.amount_value AS quantity_value,
       de.drug_exposure_start_date::timestamp AS exposure_start,
       de.days_supply::int4 AS days_supply
FROM drug_exposure de
LEFT JOIN LATERAL (
    SELECT s.amount_value::float8 AS amount_value, s.amount_unit_concept_id
    FROM drug_strength s
    WHERE s.drug_concept_id = de.drug_concept_id
    ORDER BY s.ingredient_concept_id
    LIMIT 1
) ds ON true
LEFT JOIN concept c ON c.concept_id = de.drug_concept_id
LEFT JOIN concept cr ON cr.concept_id = de.route_concept_id
LEFT JOIN concept cu ON cu.concept_id = ds.amount_unit_concept_id
WHERE de.person_id = $1
ORDER BY de.drug_exposure_start_date, de.drug_exposure_id
"#;

pub(crate) fn decode(row: &PgRow) -> Result<DrugExposureRow, SqlxError> {
    Ok(DrugExposureRow {
        drug_exposure_id: row.try_get("drug_exposure_id")?,
        agent_id: row.try_get("agent_id")?,
        agent_label: row.try_get("agent_label")?,
        route_id: row.try_get("route_id")?,
        route_label: row.try_get("route_label")?,
        quantity_unit_id: row.try_get("quantity_unit_id")?,
        quantity_unit_label: row.try_get("quantity_unit_label")?,
        quantity_value: row.try_get("quantity_value")?,
        exposure_start: timestamp(row, "exposure_start")?,
        days_supply: row.try_get("days_supply")?,
    })
}
