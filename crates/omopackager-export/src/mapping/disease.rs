//! Disease mapper.

use omopackager_core::{Disease, PersonId, TimeElement};
use omopackager_warehouse::{ConditionRow, Warehouse};
use tracing::instrument;

use super::{Mapped, RowContext, map_rows};
use crate::config::RetryPolicy;
use crate::error::{Entity, ExportError, RowError, Section};
use crate::retry::with_retry;

/// Decodes one condition occurrence.
///
/// `resolution` is present iff the condition has an end date. The staging
/// relationships become `clinical_tnm_finding` (at most one entry) and
/// `primary_site`, each only when both id and label resolved.
pub fn decode_disease(row: &ConditionRow) -> Result<Disease, RowError> {
    let ctx = RowContext::new(Entity::Condition, row.condition_occurrence_id);
    let onset = ctx.required(row.onset, "condition_start_date")?;
    let finding = ctx.optional_term(
        row.clinical_finding_id.as_deref(),
        row.clinical_finding_label.as_deref(),
        "clinical_finding",
    )?;

    Ok(Disease {
        term: ctx.term(row.term_id.as_deref(), row.term_label.as_deref(), "condition_concept_id")?,
        onset: TimeElement::Timestamp(onset),
        resolution: row.resolution.map(TimeElement::Timestamp),
        clinical_tnm_finding: finding.into_iter().collect(),
        primary_site: ctx.optional_term(
            row.primary_site_id.as_deref(),
            row.primary_site_label.as_deref(),
            "primary_site",
        )?,
    })
}

#[instrument(skip(warehouse, retry), fields(backend = warehouse.backend_name()))]
pub async fn map_diseases(
    warehouse: &dyn Warehouse,
    person_id: PersonId,
    retry: &RetryPolicy,
) -> Result<Mapped<Disease>, ExportError> {
    let rows = with_retry(retry, Section::Diseases, || warehouse.conditions(person_id)).await?;
    Ok(map_rows(&rows, decode_disease))
}
