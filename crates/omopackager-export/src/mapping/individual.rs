//! Demographic resolver: the subject of the record and its vital status.

use omopackager_core::{Individual, OntologyClass, PersonId, Sex, TimeElement, VitalStatus};
use omopackager_warehouse::{DeathRow, PersonRow, Warehouse};
use tracing::{debug, instrument};

use super::RowContext;
use crate::config::RetryPolicy;
use crate::error::{Entity, ExportError, RowError, Section};
use crate::retry::with_retry;

/// OMOP gender concept for female.
pub const FEMALE_CONCEPT_ID: i64 = 8532;
/// OMOP gender concept for male.
pub const MALE_CONCEPT_ID: i64 = 8507;

pub fn sex_from_gender_concept(concept_id: Option<i64>) -> Sex {
    match concept_id {
        None => Sex::Unknown,
        Some(FEMALE_CONCEPT_ID) => Sex::Female,
        Some(MALE_CONCEPT_ID) => Sex::Male,
        Some(_) => Sex::Other,
    }
}

fn human() -> OntologyClass {
    // Static CURIE, always well formed.
    OntologyClass::new("NCBITaxon:9606", "human").unwrap_or_else(|_| OntologyClass::empty())
}

/// Builds the subject from its person row and, if any, its death row.
///
/// The vital status is present iff the person row flags a death event. When
/// the flag is set but the death row is gone, the subject is still deceased
/// with no time or cause.
pub fn decode_individual(person: &PersonRow, death: Option<&DeathRow>) -> Result<Individual, RowError> {
    let ctx = RowContext::new(Entity::Person, person.person_id.get());
    let date_of_birth = ctx.required(person.birth_datetime, "birth_datetime")?;

    let vital_status = if person.has_death {
        match death {
            Some(death) => Some(decode_vital_status(death)?),
            None => Some(VitalStatus::deceased(None, None)),
        }
    } else {
        None
    };

    Ok(Individual {
        id: person.person_id.to_string(),
        date_of_birth,
        time_at_last_encounter: person.last_visit_start.map(TimeElement::from),
        vital_status,
        sex: sex_from_gender_concept(person.gender_concept_id),
        taxonomy: human(),
    })
}

fn decode_vital_status(death: &DeathRow) -> Result<VitalStatus, RowError> {
    let ctx = RowContext::new(Entity::Death, death.person_id.get());
    let cause = ctx.optional_term(
        death.cause_id.as_deref(),
        death.cause_label.as_deref(),
        "cause_concept_id",
    )?;
    Ok(VitalStatus::deceased(death.death_datetime, cause))
}

/// Resolves the subject, returning `None` when the person does not exist.
///
/// The death query runs only when the person row flags a death event.
#[instrument(skip(warehouse, retry), fields(backend = warehouse.backend_name()))]
pub async fn resolve_individual(
    warehouse: &dyn Warehouse,
    person_id: PersonId,
    retry: &RetryPolicy,
) -> Result<Option<Individual>, ExportError> {
    let Some(person) = with_retry(retry, Section::Subject, || warehouse.person(person_id)).await? else {
        debug!(%person_id, "person not found");
        return Ok(None);
    };

    let death = if person.has_death {
        with_retry(retry, Section::Subject, || warehouse.death(person_id)).await?
    } else {
        None
    };

    decode_individual(&person, death.as_ref())
        .map(Some)
        .map_err(|source| ExportError::UnmappableSubject { person_id, source })
}
