//! # omopackager-export
//!
//! Turns the OMOP rows of one person into a [`Phenopacket`].
//!
//! The engine is split into pure row decoders ([`mapping`]) and the
//! [`Exporter`], which fetches the subject and the three list sections
//! concurrently, retries transient warehouse errors and assembles the
//! record.
//!
//! ```ignore
//! let exporter = Exporter::new(warehouse, ExportConfig::new("N3C"));
//! let report = exporter.export(PersonId::new(42)).await?;
//! println!("{}", report.phenopacket.id); // N3C:42
//! ```
//!
//! [`Phenopacket`]: omopackager_core::Phenopacket

mod aggregator;
pub mod clock;
pub mod config;
pub mod error;
pub mod mapping;
mod retry;

pub use aggregator::{ExportReport, Exporter, SectionFailure};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ExportConfig, RetryPolicy};
pub use error::{Entity, ErrorCategory, ExportError, Result, RowError, Section};
pub use mapping::Mapped;
pub use retry::with_retry;
