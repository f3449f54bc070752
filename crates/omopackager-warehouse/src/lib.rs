//! # omopackager-warehouse
//!
//! Read-only access layer for the OMOP clinical-data warehouse.
//!
//! This crate defines the row types returned for one person per source table
//! and the [`Warehouse`] trait that backends implement. It does not talk to a
//! database itself; the PostgreSQL backend lives in `omopackager-db-postgres`.
//!
//! ## Backends
//!
//! ```ignore
//! use async_trait::async_trait;
//! use omopackager_warehouse::{Warehouse, WarehouseResult, PersonRow};
//!
//! struct MyWarehouse;
//!
//! #[async_trait]
//! impl Warehouse for MyWarehouse {
//!     async fn person(&self, id: PersonId) -> WarehouseResult<Option<PersonRow>> {
//!         // ...
//!     }
//!     // ... other tables
//! }
//! ```
//!
//! [`InMemoryWarehouse`] serves literal row fixtures and is used by tests.

mod error;
pub mod memory;
pub mod rows;
mod traits;

pub use error::{ErrorCategory, WarehouseError};
pub use memory::InMemoryWarehouse;
pub use rows::{ConditionRow, DeathRow, DrugExposureRow, MeasurementRow, PersonRow, ProcedureRow};
pub use traits::Warehouse;

/// Type alias for a warehouse result.
pub type WarehouseResult<T> = Result<T, WarehouseError>;

/// Type alias for a shared warehouse trait object.
pub type DynWarehouse = std::sync::Arc<dyn Warehouse>;
