//! The subject of a phenopacket.

use serde::Serialize;

use crate::ontology::OntologyClass;
use crate::time::{TimeElement, Timestamp};

/// Phenotypic sex of the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Unknown,
    Female,
    Male,
    Other,
}

/// Alive/deceased state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VitalStatusKind {
    Unknown,
    Alive,
    Deceased,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalStatus {
    pub status: VitalStatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_death: Option<TimeElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause_of_death: Option<OntologyClass>,
}

impl VitalStatus {
    pub fn deceased(time_of_death: Option<Timestamp>, cause_of_death: Option<OntologyClass>) -> Self {
        Self {
            status: VitalStatusKind::Deceased,
            time_of_death: time_of_death.map(TimeElement::Timestamp),
            cause_of_death,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Individual {
    pub id: String,
    pub date_of_birth: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_at_last_encounter: Option<TimeElement>,
    /// Present iff the subject has a recorded death event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vital_status: Option<VitalStatus>,
    pub sex: Sex,
    pub taxonomy: OntologyClass,
}
