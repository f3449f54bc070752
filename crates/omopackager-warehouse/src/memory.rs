//! In-memory warehouse backed by literal row fixtures.

use std::collections::HashMap;

use async_trait::async_trait;
use omopackager_core::PersonId;
use tracing::trace;

use crate::rows::{ConditionRow, DeathRow, DrugExposureRow, MeasurementRow, PersonRow, ProcedureRow};
use crate::{Warehouse, WarehouseResult};

#[derive(Debug, Clone, Default)]
struct SubjectRows {
    person: Option<PersonRow>,
    death: Option<DeathRow>,
    measurements: Vec<MeasurementRow>,
    drug_exposures: Vec<DrugExposureRow>,
    procedures: Vec<ProcedureRow>,
    conditions: Vec<ConditionRow>,
}

/// Immutable warehouse holding rows per person.
///
/// Rows are returned in insertion order. The store is built once and never
/// mutated afterwards, so no locking is involved.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWarehouse {
    subjects: HashMap<PersonId, SubjectRows>,
}

impl InMemoryWarehouse {
    /// Creates an empty warehouse.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, person_id: PersonId) -> &mut SubjectRows {
        self.subjects.entry(person_id).or_default()
    }

    /// Adds a person row.
    #[must_use]
    pub fn with_person(mut self, row: PersonRow) -> Self {
        let person_id = row.person_id;
        self.entry(person_id).person = Some(row);
        self
    }

    /// Adds a death row.
    #[must_use]
    pub fn with_death(mut self, row: DeathRow) -> Self {
        let person_id = row.person_id;
        self.entry(person_id).death = Some(row);
        self
    }

    /// Adds measurement rows for a person.
    #[must_use]
    pub fn with_measurements(
        mut self,
        person_id: PersonId,
        rows: impl IntoIterator<Item = MeasurementRow>,
    ) -> Self {
        self.entry(person_id).measurements.extend(rows);
        self
    }

    /// Adds drug exposure rows for a person.
    #[must_use]
    pub fn with_drug_exposures(
        mut self,
        person_id: PersonId,
        rows: impl IntoIterator<Item = DrugExposureRow>,
    ) -> Self {
        self.entry(person_id).drug_exposures.extend(rows);
        self
    }

    /// Adds procedure rows for a person.
    #[must_use]
    pub fn with_procedures(
        mut self,
        person_id: PersonId,
        rows: impl IntoIterator<Item = ProcedureRow>,
    ) -> Self {
        self.entry(person_id).procedures.extend(rows);
        self
    }

    /// Adds condition rows for a person.
    #[must_use]
    pub fn with_conditions(
        mut self,
        person_id: PersonId,
        rows: impl IntoIterator<Item = ConditionRow>,
    ) -> Self {
        self.entry(person_id).conditions.extend(rows);
        self
    }

    fn rows(&self, person_id: PersonId) -> Option<&SubjectRows> {
        trace!(%person_id, "in-memory fetch");
        self.subjects.get(&person_id)
    }
}

#[async_trait]
impl Warehouse for InMemoryWarehouse {
    async fn person(&self, person_id: PersonId) -> WarehouseResult<Option<PersonRow>> {
        Ok(self.rows(person_id).and_then(|s| s.person.clone()))
    }

    async fn death(&self, person_id: PersonId) -> WarehouseResult<Option<DeathRow>> {
        Ok(self.rows(person_id).and_then(|s| s.death.clone()))
    }

    async fn measurements(&self, person_id: PersonId) -> WarehouseResult<Vec<MeasurementRow>> {
        Ok(self
            .rows(person_id)
            .map(|s| s.measurements.clone())
            .unwrap_or_default())
    }

    async fn drug_exposures(&self, person_id: PersonId) -> WarehouseResult<Vec<DrugExposureRow>> {
        Ok(self
            .rows(person_id)
            .map(|s| s.drug_exposures.clone())
            .unwrap_or_default())
    }

    async fn procedures(&self, person_id: PersonId) -> WarehouseResult<Vec<ProcedureRow>> {
        Ok(self
            .rows(person_id)
            .map(|s| s.procedures.clone())
            .unwrap_or_default())
    }

    async fn conditions(&self, person_id: PersonId) -> WarehouseResult<Vec<ConditionRow>> {
        Ok(self
            .rows(person_id)
            .map(|s| s.conditions.clone())
            .unwrap_or_default())
    }

    async fn ping(&self) -> WarehouseResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_person_yields_empty_results() {
        let warehouse = InMemoryWarehouse::new();
        let id = PersonId::new(404);
        assert!(warehouse.person(id).await.unwrap().is_none());
        assert!(warehouse.death(id).await.unwrap().is_none());
        assert!(warehouse.measurements(id).await.unwrap().is_empty());
        assert!(warehouse.conditions(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rows_are_scoped_by_person() {
        let a = PersonId::new(1);
        let b = PersonId::new(2);
        let warehouse = InMemoryWarehouse::new()
            .with_person(PersonRow {
                person_id: a,
                ..Default::default()
            })
            .with_procedures(
                a,
                [ProcedureRow {
                    procedure_occurrence_id: 10,
                    ..Default::default()
                }],
            )
            .with_procedures(
                b,
                [ProcedureRow {
                    procedure_occurrence_id: 20,
                    ..Default::default()
                }],
            );

        assert!(warehouse.person(a).await.unwrap().is_some());
        assert!(warehouse.person(b).await.unwrap().is_none());
        let rows = warehouse.procedures(a).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].procedure_occurrence_id, 10);
        assert_eq!(warehouse.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_person_and_death_rows_are_keyed_by_their_person_id() {
        let id = PersonId::new(77);
        let warehouse = InMemoryWarehouse::new()
            .with_person(PersonRow {
                person_id: id,
                has_death: true,
                ..Default::default()
            })
            .with_death(DeathRow {
                person_id: id,
                death_datetime: None,
                cause_id: Some("SNOMED:22298006".into()),
                cause_label: Some("Myocardial infarction".into()),
            });

        assert!(warehouse.person(id).await.unwrap().unwrap().has_death);
        let death = warehouse.death(id).await.unwrap().unwrap();
        assert_eq!(death.cause_id.as_deref(), Some("SNOMED:22298006"));
        assert!(warehouse.death(PersonId::new(78)).await.unwrap().is_none());
    }
}
