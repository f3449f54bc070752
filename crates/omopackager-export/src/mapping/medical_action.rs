//! Medical action mapper: drug exposures and procedures.
//!
//! Every source row becomes exactly one action. Repeated exposures to the
//! same agent are not grouped into one treatment.

use omopackager_core::{
    DoseInterval, MedicalAction, OntologyClass, PersonId, Procedure, Quantity, TimeElement,
    TimeInterval, Treatment,
};
use omopackager_warehouse::{DrugExposureRow, ProcedureRow, Warehouse};
use tracing::instrument;

use super::{Mapped, RowContext, map_rows};
use crate::config::RetryPolicy;
use crate::error::{Entity, ExportError, RowError, Section};
use crate::retry::with_retry;

/// Decodes one drug exposure into a treatment with a single dose interval
/// spanning `[start, start + days_supply]`.
pub fn decode_treatment(row: &DrugExposureRow) -> Result<Treatment, RowError> {
    let ctx = RowContext::new(Entity::DrugExposure, row.drug_exposure_id);
    let start = ctx.required(row.exposure_start, "drug_exposure_start_date")?;
    let days = match row.days_supply {
        Some(days) if days < 0 => {
            return Err(ctx.invalid("days_supply", format!("negative supply: {days}")));
        }
        Some(days) => i64::from(days),
        None => 0,
    };
    let interval = start
        .plus_days(days)
        .and_then(|end| TimeInterval::new(start, end))
        .map_err(|e| ctx.invalid("days_supply", e.to_string()))?;

    let unit = ctx.term(
        row.quantity_unit_id.as_deref(),
        row.quantity_unit_label.as_deref(),
        "amount_unit_concept_id",
    )?;
    let dose = DoseInterval {
        quantity: Quantity::new(unit, row.quantity_value.unwrap_or(0.0)),
        schedule_frequency: OntologyClass::no_matching_concept(),
        interval,
    };

    Ok(Treatment {
        agent: ctx.term(row.agent_id.as_deref(), row.agent_label.as_deref(), "drug_concept_id")?,
        route_of_administration: ctx.term(
            row.route_id.as_deref(),
            row.route_label.as_deref(),
            "route_concept_id",
        )?,
        dose_intervals: vec![dose],
    })
}

/// Decodes one procedure occurrence.
pub fn decode_procedure(row: &ProcedureRow) -> Result<Procedure, RowError> {
    let ctx = RowContext::new(Entity::Procedure, row.procedure_occurrence_id);
    let performed = ctx.required(row.performed, "procedure_datetime")?;
    Ok(Procedure {
        code: ctx.term(row.code_id.as_deref(), row.code_label.as_deref(), "procedure_concept_id")?,
        body_site: ctx.optional_term(
            row.body_site_id.as_deref(),
            row.body_site_label.as_deref(),
            "body_site",
        )?,
        performed: TimeElement::Timestamp(performed),
    })
}

/// Fetches and decodes both sources. Treatments come first, then procedures,
/// each in warehouse order.
#[instrument(skip(warehouse, retry), fields(backend = warehouse.backend_name()))]
pub async fn map_medical_actions(
    warehouse: &dyn Warehouse,
    person_id: PersonId,
    retry: &RetryPolicy,
) -> Result<Mapped<MedicalAction>, ExportError> {
    let (exposures, procedures) = tokio::try_join!(
        with_retry(retry, Section::MedicalActions, || warehouse.drug_exposures(person_id)),
        with_retry(retry, Section::MedicalActions, || warehouse.procedures(person_id)),
    )?;

    let mut actions: Mapped<MedicalAction> = Mapped::default();
    actions.extend_with(map_rows(&exposures, decode_treatment));
    actions.extend_with(map_rows(&procedures, decode_procedure));
    Ok(actions)
}
