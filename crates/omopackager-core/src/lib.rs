//! Phenopacket data model produced by the OMOP exporter.
//!
//! Every type in this crate is an immutable value: invariants are checked
//! when a value is constructed and nothing can be mutated afterwards.
//!
//! - [`ontology`]: `OntologyClass` CURIE terms
//! - [`time`]: timestamps, intervals and the `TimeElement` union
//! - [`individual`], [`measurement`], [`medical_action`], [`disease`]: record entities
//! - [`phenopacket`]: the top-level record and its metadata

pub mod disease;
pub mod error;
pub mod id;
pub mod individual;
pub mod measurement;
pub mod medical_action;
pub mod ontology;
pub mod phenopacket;
pub mod time;

pub use disease::Disease;
pub use error::{CoreError, ErrorCategory, Result};
pub use id::PersonId;
pub use individual::{Individual, Sex, VitalStatus, VitalStatusKind};
pub use measurement::{Measurement, Quantity, ReferenceRange, Value};
pub use medical_action::{DoseInterval, MedicalAction, Procedure, Treatment};
pub use ontology::OntologyClass;
pub use phenopacket::{MetaData, PHENOPACKET_SCHEMA_VERSION, Phenopacket, Resource};
pub use crate::time::{TimeElement, TimeInterval, Timestamp, now_utc};
