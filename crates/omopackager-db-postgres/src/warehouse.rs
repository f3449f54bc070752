//! `Warehouse` implementation over a PostgreSQL OMOP CDM database.

use async_trait::async_trait;
use omopackager_core::PersonId;
use omopackager_warehouse::{
    ConditionRow, DeathRow, DrugExposureRow, MeasurementRow, PersonRow, ProcedureRow, Warehouse,
    WarehouseResult,
};
use sqlx_core::error::Error as SqlxError;
use sqlx_core::query::query;
use sqlx_postgres::{PgPool, PgRow};
use tracing::{debug, instrument};

use crate::config::PostgresConfig;
use crate::error::{PostgresError, Result};
use crate::pool;
use crate::queries::{condition, death, drug_exposure, measurement, person, procedure};

/// Read-only OMOP warehouse backed by a sqlx connection pool.
///
/// Each query checks a connection out of the pool and returns it when the
/// call finishes, whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct PostgresWarehouse {
    pool: PgPool,
}

impl PostgresWarehouse {
    /// Creates a warehouse with a fresh connection pool.
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        let pool = pool::create_pool(&config).await?;
        Ok(Self { pool })
    }

    /// Creates a warehouse from an existing connection pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch<T>(
        &self,
        sql: &'static str,
        person_id: PersonId,
        decode: fn(&PgRow) -> std::result::Result<T, SqlxError>,
    ) -> Result<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        let rows = query(sql)
            .bind(person_id.get())
            .fetch_all(&mut *conn)
            .await?;
        debug!(rows = rows.len(), "query returned");
        rows.iter()
            .map(|row| decode(row).map_err(PostgresError::from))
            .collect()
    }

    async fn fetch_optional<T>(
        &self,
        sql: &'static str,
        person_id: PersonId,
        decode: fn(&PgRow) -> std::result::Result<T, SqlxError>,
    ) -> Result<Option<T>> {
        Ok(self.fetch(sql, person_id, decode).await?.into_iter().next())
    }
}

#[async_trait]
impl Warehouse for PostgresWarehouse {
    #[instrument(skip(self))]
    async fn person(&self, person_id: PersonId) -> WarehouseResult<Option<PersonRow>> {
        Ok(self.fetch_optional(person::SQL, person_id, person::decode).await?)
    }

    #[instrument(skip(self))]
    async fn death(&self, person_id: PersonId) -> WarehouseResult<Option<DeathRow>> {
        Ok(self.fetch_optional(death::SQL, person_id, death::decode).await?)
    }

    #[instrument(skip(self))]
    async fn measurements(&self, person_id: PersonId) -> WarehouseResult<Vec<MeasurementRow>> {
        Ok(self.fetch(measurement::SQL, person_id, measurement::decode).await?)
    }

    #[instrument(skip(self))]
    async fn drug_exposures(&self, person_id: PersonId) -> WarehouseResult<Vec<DrugExposureRow>> {
        Ok(self
            .fetch(drug_exposure::SQL, person_id, drug_exposure::decode)
            .await?)
    }

    #[instrument(skip(self))]
    async fn procedures(&self, person_id: PersonId) -> WarehouseResult<Vec<ProcedureRow>> {
        Ok(self.fetch(procedure::SQL, person_id, procedure::decode).await?)
    }

    #[instrument(skip(self))]
    async fn conditions(&self, person_id: PersonId) -> WarehouseResult<Vec<ConditionRow>> {
        Ok(self.fetch(condition::SQL, person_id, condition::decode).await?)
    }

    async fn ping(&self) -> WarehouseResult<()> {
        Ok(pool::test_connection(&self.pool).await?)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
