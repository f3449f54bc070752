//! Procedure rows with their "Has proc site" body site.

use omopackager_warehouse::ProcedureRow;
use sqlx_core::error::Error as SqlxError;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;

use super::timestamp;

pub const SQL: &str = r#"
SELECT po.procedure_occurrence_id::int8 AS procedure_occurrence_id,
       CASE WHEN c.concept_id IS NULL THEN NULL
            ELSE replace(c.vocabulary_id, ' ', '_') || ':' || c.concept_code END AS code_id,
       c.concept_name AS code_label,
       CASE WHEN site.concept_id IS NULL THEN NULL
            ELSE replace(site.vocabulary_id, ' ', '_') || ':' || site.concept_code END AS body_site_id,
       site.concept_name AS body_site_label,
       coalesce(po.procedure_datetime, po.procedure_date::timestamp) AS performed
FROM procedure_occurrence po
LEFT JOIN concept c ON c.concept_id = po.procedure_concept_id
LEFT JOIN LATERAL (
    SELECT cs.concept_id, cs.vocabulary_id, cs.concept_code, cs.concept_name
    FROM concept_relationship rel
    JOIN concept cs ON cs.concept_id = rel.concept_id_2
    WHERE rel.concept_id_1 = po.procedure_concept_id
      AND rel.relationship_id = 'Has proc site'
      AND rel.invalid_reason IS NULL
    ORDER BY rel.concept_id_2
    LIMIT 1
) site ON true
WHERE po.person_id = $1
ORDER BY po.procedure_date, po.procedure_datetime NULLS LAST, po.procedure_occurrence_id
"#;

pub(crate) fn decode(row: &PgRow) -> Result<ProcedureRow, SqlxError> {
    Ok(ProcedureRow {
        procedure_occurrence_id: row.try_get("procedure_occurrence_id")?,
        code_id: row.try_get("code_id")?,
        code_label: row.try_get("code_label")?,
        body_site_id: row.try_get("body_site_id")?,
        body_site_label: row.try_get("body_site_label")?,
        performed: timestamp(row, "performed")?,
    })
}
