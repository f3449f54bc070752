//! Ontology terms expressed as `VOCAB:CODE` CURIEs.

use serde::Serialize;

use crate::error::{CoreError, Result};

/// Label the warehouse concept dictionary uses for its "no match" concept.
pub const NO_MATCHING_CONCEPT_LABEL: &str = "No matching concept";

/// A coded term: `id` is empty or `VOCAB:CODE`, `label` is human readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OntologyClass {
    id: String,
    label: String,
}

impl OntologyClass {
    /// Builds a term after checking the CURIE shape of `id`.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if !id.is_empty() && split_curie(&id).is_none() {
            return Err(CoreError::invalid_curie(id));
        }
        Ok(Self {
            id,
            label: label.into(),
        })
    }

    /// Builds a term from nullable columns, defaulting absent parts to "".
    pub fn or_empty(id: Option<&str>, label: Option<&str>) -> Result<Self> {
        Self::new(id.unwrap_or_default(), label.unwrap_or_default())
    }

    /// The empty term: both id and label are "".
    pub fn empty() -> Self {
        Self {
            id: String::new(),
            label: String::new(),
        }
    }

    /// Sentinel used where the source schema has no concept to offer.
    pub fn no_matching_concept() -> Self {
        Self {
            id: format!("None:{NO_MATCHING_CONCEPT_LABEL}"),
            label: NO_MATCHING_CONCEPT_LABEL.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.label.is_empty()
    }

    /// Vocabulary prefix of the id, if any.
    pub fn prefix(&self) -> Option<&str> {
        split_curie(&self.id).map(|(prefix, _)| prefix)
    }
}

fn split_curie(id: &str) -> Option<(&str, &str)> {
    let (prefix, code) = id.split_once(':')?;
    let prefix_ok = !prefix.is_empty() && !prefix.chars().any(char::is_whitespace);
    (prefix_ok && !code.is_empty()).then_some((prefix, code))
}
