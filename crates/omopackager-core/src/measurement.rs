//! Measurements and their typed values.

use serde::Serialize;

use crate::ontology::OntologyClass;
use crate::time::TimeElement;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceRange {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quantity {
    pub unit: OntologyClass,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<ReferenceRange>,
}

impl Quantity {
    pub fn new(unit: OntologyClass, value: f64) -> Self {
        Self {
            unit,
            value,
            reference_range: None,
        }
    }

    pub fn with_reference_range(mut self, range: Option<ReferenceRange>) -> Self {
        self.reference_range = range;
        self
    }
}

/// Numeric or categorical measurement result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    Quantity(Quantity),
    OntologyClass(OntologyClass),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub assay: OntologyClass,
    pub value: Value,
    /// Always the timestamp variant.
    pub time_observed: TimeElement,
}
