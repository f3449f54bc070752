//! Condition rows with their morphology and finding-site relationships.

use omopackager_warehouse::ConditionRow;
use sqlx_core::error::Error as SqlxError;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;

use super::timestamp;

/// Each relationship join filters on its own relationship id.
pub const SQL: &str = r#"
SELECT co.condition_occurrence_id::int8 AS condition_occurrence_id,
       CASE WHEN c.concept_id IS NULL THEN NULL
            ELSE replace(c.vocabulary_id, ' ', '_') || ':' || c.concept_code END AS term_id,
       c.concept_name AS term_label,
       co.condition_start_date::timestamp AS onset,
       co.condition_end_date::timestamp AS resolution,
       CASE WHEN morph.concept_id IS NULL THEN NULL
            ELSE replace(morph.vocabulary_id, ' ', '_') || ':' || morph.concept_code END AS clinical_finding_id,
       morph.concept_name AS clinical_finding_label,
       CASE WHEN site.concept_id IS NULL THEN NULL
            ELSE replace(site.vocabulary_id, ' ', '_') || ':' || site.concept_code END AS primary_site_id,
       site.concept_name AS primary_site_label
FROM condition_occurrence co
LEFT JOIN concept c ON c.concept_id = co.condition_concept_id
LEFT JOIN LATERAL (
    SELECT cm.concept_id, cm.vocabulary_id, cm.concept_code, cm.concept_name
    FROM concept_relationship rel
    JOIN concept cm ON cm.concept_id = rel.concept_id_2
    WHERE rel.concept_id_1 = co.condition_concept_id
      AND rel.relationship_id = 'Has asso morph'
      AND rel.invalid_reason IS NULL
    ORDER BY rel.concept_id_2
    LIMIT 1
) morph ON true
LEFT JOIN LATERAL (
    SELECT cs.concept_id, cs.vocabulary_id, cs.concept_code, cs.concept_name
    FROM concept_relationship rel
    JOIN concept cs ON cs.concept_id = rel.concept_id_2
    WHERE rel.concept_id_1 = co.condition_concept_id
      AND rel.relationship_id = 'Has finding site'
      AND rel.invalid_reason IS NULL
    ORDER BY rel.concept_id_2
    LIMIT 1
) site ON true
WHERE co.person_id = $1
ORDER BY co.condition_start_date, co.condition_occurrence_id
"#;

pub(crate) fn decode(row: &PgRow) -> Result<ConditionRow, SqlxError> {
    Ok(ConditionRow {
        condition_occurrence_id: row.try_get("condition_occurrence_id")?,
        term_id: row.try_get("term_id")?,
        term_label: row.try_get("term_label")?,
        onset: timestamp(row, "onset")?,
        resolution: timestamp(row, "resolution")?,
        clinical_finding_id: row.try_get("clinical_finding_id")?,
        clinical_finding_label: row.try_get("clinical_finding_label")?,
        primary_site_id: row.try_get("primary_site_id")?,
        primary_site_label: row.try_get("primary_site_label")?,
    })
}
