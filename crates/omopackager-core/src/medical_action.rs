//! Treatments and procedures.

use serde::Serialize;

use crate::measurement::Quantity;
use crate::ontology::OntologyClass;
use crate::time::{TimeElement, TimeInterval};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseInterval {
    pub quantity: Quantity,
    pub schedule_frequency: OntologyClass,
    pub interval: TimeInterval,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub agent: OntologyClass,
    pub route_of_administration: OntologyClass,
    pub dose_intervals: Vec<DoseInterval>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub code: OntologyClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_site: Option<OntologyClass>,
    /// Always the timestamp variant.
    pub performed: TimeElement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MedicalAction {
    Treatment(Treatment),
    Procedure(Procedure),
}

impl MedicalAction {
    /// Every ontology term referenced by this action.
    pub fn terms(&self) -> Vec<&OntologyClass> {
        match self {
            Self::Treatment(t) => {
                let mut terms = vec![&t.agent, &t.route_of_administration];
                for dose in &t.dose_intervals {
                    terms.push(&dose.quantity.unit);
                    terms.push(&dose.schedule_frequency);
                }
                terms
            }
            Self::Procedure(p) => std::iter::once(&p.code).chain(p.body_site.as_ref()).collect(),
        }
    }
}

impl From<Treatment> for MedicalAction {
    fn from(treatment: Treatment) -> Self {
        Self::Treatment(treatment)
    }
}

impl From<Procedure> for MedicalAction {
    fn from(procedure: Procedure) -> Self {
        Self::Procedure(procedure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Timestamp;
    use time::macros::datetime;

    #[test]
    fn test_procedure_serialization() {
        let action = MedicalAction::Procedure(Procedure {
            code: OntologyClass::new("SNOMED:80146002", "Appendectomy").unwrap(),
            body_site: None,
            performed: Timestamp::new(datetime!(2019-06-01 10:00:00 UTC)).into(),
        });
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["procedure"]["code"]["id"], "SNOMED:80146002");
        assert!(json["procedure"].get("bodySite").is_none());
        assert_eq!(action.terms().len(), 1);
    }

    #[test]
    fn test_treatment_terms() {
        let start = Timestamp::new(datetime!(2020-01-01 00:00:00 UTC));
        let action = MedicalAction::Treatment(Treatment {
            agent: OntologyClass::new("RxNorm:1191", "aspirin").unwrap(),
            route_of_administration: OntologyClass::new("SNOMED:26643006", "Oral").unwrap(),
            dose_intervals: vec![DoseInterval {
                quantity: Quantity::new(OntologyClass::empty(), 81.0),
                schedule_frequency: OntologyClass::no_matching_concept(),
                interval: TimeInterval::new(start, start.plus_days(10).unwrap()).unwrap(),
            }],
        });
        assert_eq!(action.terms().len(), 4);
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json["treatment"]["doseIntervals"][0]["interval"]["end"],
            "2020-01-11T00:00:00Z"
        );
    }
}
