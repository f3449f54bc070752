use serde::Serialize;

use crate::ontology::OntologyClass;
use crate::time::TimeElement;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Disease {
    pub term: OntologyClass,
    pub onset: TimeElement,
    /// Present iff the condition has an end date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<TimeElement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clinical_tnm_finding: Vec<OntologyClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_site: Option<OntologyClass>,
}

impl Disease {
    pub fn terms(&self) -> Vec<&OntologyClass> {
        std::iter::once(&self.term)
            .chain(self.clinical_tnm_finding.iter())
            .chain(self.primary_site.as_ref())
            .collect()
    }
}
