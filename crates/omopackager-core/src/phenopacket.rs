//! The top-level phenopacket record.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::disease::Disease;
use crate::individual::Individual;
use crate::measurement::{Measurement, Value};
use crate::medical_action::MedicalAction;
use crate::ontology::OntologyClass;
use crate::time::Timestamp;

/// Version of the phenopacket schema the records conform to.
pub const PHENOPACKET_SCHEMA_VERSION: &str = "2.0";

/// Prefix of the sentinel "no matching concept" term; never listed as a resource.
const SENTINEL_PREFIX: &str = "None";

/// An ontology resource referenced by the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub namespace_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub created: Timestamp,
    pub created_by: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    pub phenopacket_schema_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Phenopacket {
    pub id: String,
    pub subject: Individual,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub measurements: Vec<Measurement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub medical_actions: Vec<MedicalAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diseases: Vec<Disease>,
    pub meta_data: MetaData,
}

impl Phenopacket {
    /// Assembles a record; the metadata resource list is derived from the
    /// vocabularies the record's terms reference.
    pub fn new(
        id: impl Into<String>,
        subject: Individual,
        measurements: Vec<Measurement>,
        medical_actions: Vec<MedicalAction>,
        diseases: Vec<Disease>,
        created: Timestamp,
        created_by: impl Into<String>,
    ) -> Self {
        let mut packet = Self {
            id: id.into(),
            subject,
            measurements,
            medical_actions,
            diseases,
            meta_data: MetaData {
                created,
                created_by: created_by.into(),
                resources: Vec::new(),
                phenopacket_schema_version: PHENOPACKET_SCHEMA_VERSION.to_string(),
            },
        };
        packet.meta_data.resources = packet.referenced_resources();
        packet
    }

    fn referenced_resources(&self) -> Vec<Resource> {
        let mut terms: Vec<&OntologyClass> = vec![&self.subject.taxonomy];
        if let Some(cause) = self
            .subject
            .vital_status
            .as_ref()
            .and_then(|vs| vs.cause_of_death.as_ref())
        {
            terms.push(cause);
        }
        for m in &self.measurements {
            terms.push(&m.assay);
            match &m.value {
                Value::Quantity(q) => terms.push(&q.unit),
                Value::OntologyClass(term) => terms.push(term),
            }
        }
        terms.extend(self.medical_actions.iter().flat_map(MedicalAction::terms));
        terms.extend(self.diseases.iter().flat_map(Disease::terms));

        let prefixes: BTreeSet<&str> = terms
            .into_iter()
            .filter_map(OntologyClass::prefix)
            .filter(|prefix| *prefix != SENTINEL_PREFIX)
            .collect();

        prefixes
            .into_iter()
            .map(|prefix| Resource {
                id: prefix.to_ascii_lowercase(),
                namespace_prefix: prefix.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::individual::Sex;
    use crate::time::TimeElement;
    use time::macros::datetime;

    fn subject() -> Individual {
        Individual {
            id: "1".into(),
            date_of_birth: Timestamp::new(datetime!(1980-02-03 00:00:00 UTC)),
            time_at_last_encounter: None,
            vital_status: None,
            sex: Sex::Male,
            taxonomy: OntologyClass::new("NCBITaxon:9606", "human").unwrap(),
        }
    }

    #[test]
    fn test_resources_are_distinct_and_sorted() {
        let observed: TimeElement = Timestamp::new(datetime!(2020-01-01 00:00:00 UTC)).into();
        let measurement = |assay: &str| Measurement {
            assay: OntologyClass::new(assay, "x").unwrap(),
            value: Value::OntologyClass(OntologyClass::no_matching_concept()),
            time_observed: observed,
        };
        let packet = Phenopacket::new(
            "N3C:1",
            subject(),
            vec![measurement("LOINC:1"), measurement("LOINC:2"), measurement("SNOMED:3")],
            vec![],
            vec![],
            Timestamp::new(datetime!(2024-01-01 00:00:00 UTC)),
            "OMOPackager",
        );
        let prefixes: Vec<&str> = packet
            .meta_data
            .resources
            .iter()
            .map(|r| r.namespace_prefix.as_str())
            .collect();
        assert_eq!(prefixes, vec!["LOINC", "NCBITaxon", "SNOMED"]);
        assert_eq!(packet.meta_data.resources[1].id, "ncbitaxon");
        assert_eq!(packet.meta_data.phenopacket_schema_version, "2.0");
    }

    #[test]
    fn test_empty_sections_are_omitted_in_json() {
        let packet = Phenopacket::new(
            "N3C:1",
            subject(),
            vec![],
            vec![],
            vec![],
            Timestamp::new(datetime!(2024-01-01 00:00:00 UTC)),
            "OMOPackager",
        );
        assert!(packet.measurements.is_empty());
        let json = serde_json::to_value(&packet).unwrap();
        assert!(json.get("measurements").is_none());
        assert_eq!(json["metaData"]["createdBy"], "OMOPackager");
        assert_eq!(json["subject"]["taxonomy"]["id"], "NCBITaxon:9606");
    }
}
