//! Raw rows as fetched from the warehouse, one struct per subject-scoped query.
//!
//! Concept columns arrive already rendered as `VOCAB:CODE` ids (or `None`
//! when the join found nothing). Every column the source schema allows to be
//! null is an `Option`; decoding into the phenopacket model happens in
//! `omopackager-export`.

use omopackager_core::{PersonId, Timestamp};

/// `person` joined with its latest visit and death presence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonRow {
    pub person_id: PersonId,
    pub gender_concept_id: Option<i64>,
    pub birth_datetime: Option<Timestamp>,
    pub last_visit_start: Option<Timestamp>,
    pub has_death: bool,
}

/// `death` joined with the concept dictionary for its cause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeathRow {
    pub person_id: PersonId,
    pub death_datetime: Option<Timestamp>,
    pub cause_id: Option<String>,
    pub cause_label: Option<String>,
}

/// One `measurement` occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementRow {
    pub measurement_id: i64,
    pub assay_id: Option<String>,
    pub assay_label: Option<String>,
    pub value_as_number: Option<f64>,
    pub value_id: Option<String>,
    pub value_label: Option<String>,
    pub unit_id: Option<String>,
    pub unit_label: Option<String>,
    pub unit_source_value: Option<String>,
    pub range_low: Option<f64>,
    pub range_high: Option<f64>,
    pub measurement_datetime: Option<Timestamp>,
}

/// One `drug_exposure` joined with `drug_strength`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrugExposureRow {
    pub drug_exposure_id: i64,
    pub agent_id: Option<String>,
    pub agent_label: Option<String>,
    pub route_id: Option<String>,
    pub route_label: Option<String>,
    pub quantity_unit_id: Option<String>,
    pub quantity_unit_label: Option<String>,
    pub quantity_value: Option<f64>,
    pub exposure_start: Option<Timestamp>,
    pub days_supply: Option<i32>,
}

/// One `procedure_occurrence` with its "Has proc site" body site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcedureRow {
    pub procedure_occurrence_id: i64,
    pub code_id: Option<String>,
    pub code_label: Option<String>,
    pub body_site_id: Option<String>,
    pub body_site_label: Option<String>,
    pub performed: Option<Timestamp>,
}

/// One `condition_occurrence` with its staging relationships.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionRow {
    pub condition_occurrence_id: i64,
    pub term_id: Option<String>,
    pub term_label: Option<String>,
    pub onset: Option<Timestamp>,
    pub resolution: Option<Timestamp>,
    pub clinical_finding_id: Option<String>,
    pub clinical_finding_label: Option<String>,
    pub primary_site_id: Option<String>,
    pub primary_site_label: Option<String>,
}
