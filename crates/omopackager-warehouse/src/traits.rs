//! The warehouse trait.

use async_trait::async_trait;
use omopackager_core::PersonId;

use crate::WarehouseResult;
use crate::rows::{ConditionRow, DeathRow, DrugExposureRow, MeasurementRow, PersonRow, ProcedureRow};

/// Subject-scoped, read-only queries against the OMOP warehouse.
///
/// Implementations must be thread-safe (`Send + Sync`): the exporter issues
/// the per-table fetches of one request concurrently. Each call is expected
/// to hold a pooled connection only for the duration of its query.
///
/// # Example
///
/// ```ignore
/// async fn birth(warehouse: &dyn Warehouse, id: PersonId) -> WarehouseResult<Option<Timestamp>> {
///     Ok(warehouse.person(id).await?.and_then(|row| row.birth_datetime))
/// }
/// ```
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Fetches the aggregated person row.
    ///
    /// Returns `None` if the person does not exist; absence is not an error.
    async fn person(&self, person_id: PersonId) -> WarehouseResult<Option<PersonRow>>;

    /// Fetches the death record with its resolved cause concept.
    async fn death(&self, person_id: PersonId) -> WarehouseResult<Option<DeathRow>>;

    /// Fetches all measurement occurrences, in a stable order.
    async fn measurements(&self, person_id: PersonId) -> WarehouseResult<Vec<MeasurementRow>>;

    /// Fetches all drug exposures, in a stable order.
    async fn drug_exposures(&self, person_id: PersonId) -> WarehouseResult<Vec<DrugExposureRow>>;

    /// Fetches all procedure occurrences, in a stable order.
    async fn procedures(&self, person_id: PersonId) -> WarehouseResult<Vec<ProcedureRow>>;

    /// Fetches all condition occurrences, in a stable order.
    async fn conditions(&self, person_id: PersonId) -> WarehouseResult<Vec<ConditionRow>>;

    /// Checks that the warehouse is reachable.
    async fn ping(&self) -> WarehouseResult<()>;

    /// Returns the name of this backend, for logging.
    fn backend_name(&self) -> &'static str;
}
