//! Assembles one phenopacket from the four concurrent section fetches.

use std::sync::Arc;

use omopackager_core::{Disease, Individual, Measurement, MedicalAction, Phenopacket, PersonId};
use omopackager_warehouse::DynWarehouse;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{ExportConfig, RetryPolicy};
use crate::error::{ExportError, Result, RowError, Section};
use crate::mapping::{Mapped, map_diseases, map_measurements, map_medical_actions, resolve_individual};

/// Outcome of a successful export.
#[derive(Debug)]
pub struct ExportReport {
    pub phenopacket: Phenopacket,
    /// Rows that were skipped, in section order.
    pub rejected_rows: Vec<RowError>,
    /// Sections emitted empty because their fetch failed.
    /// Always empty when `fail_on_section_error` is on.
    pub section_failures: Vec<SectionFailure>,
}

#[derive(Debug)]
pub struct SectionFailure {
    pub section: Section,
    pub error: ExportError,
}

enum SectionOutput {
    Subject(Option<Individual>),
    Measurements(Mapped<Measurement>),
    MedicalActions(Mapped<MedicalAction>),
    Diseases(Mapped<Disease>),
}

/// Export engine shared by all requests.
///
/// Holds no per-request state. The worker semaphore bounds how many section
/// fetches run at once, which in turn bounds the connections checked out of
/// the warehouse pool.
#[derive(Clone)]
pub struct Exporter {
    warehouse: DynWarehouse,
    config: Arc<ExportConfig>,
    workers: Arc<Semaphore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("backend", &self.warehouse.backend_name())
            .field("config", &self.config)
            .field("available_workers", &self.workers.available_permits())
            .finish()
    }
}

impl Exporter {
    pub fn new(warehouse: DynWarehouse, config: ExportConfig) -> Self {
        let workers = Arc::new(Semaphore::new(config.worker_pool_size.max(1)));
        Self {
            warehouse,
            config: Arc::new(config),
            workers,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn warehouse(&self) -> &DynWarehouse {
        &self.warehouse
    }

    /// Exports the record for `person_id` under the configured deadline.
    pub async fn export(&self, person_id: PersonId) -> Result<ExportReport> {
        self.export_with_cancel(person_id, &CancellationToken::new()).await
    }

    /// Like [`Exporter::export`], but also stops when `cancel` fires.
    ///
    /// On timeout or cancellation the in-flight fetches are aborted and no
    /// partial record is returned.
    #[instrument(skip(self, cancel), fields(backend = self.warehouse.backend_name()))]
    pub async fn export_with_cancel(
        &self,
        person_id: PersonId,
        cancel: &CancellationToken,
    ) -> Result<ExportReport> {
        let deadline = self.config.deadline();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("export cancelled");
                Err(ExportError::Cancelled)
            }
            outcome = tokio::time::timeout(deadline, self.gather(person_id)) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    warn!(deadline_ms = self.config.deadline_ms, "export deadline exceeded");
                    Err(ExportError::Timeout { after: deadline })
                }
            },
        }
    }

    async fn gather(&self, person_id: PersonId) -> Result<ExportReport> {
        let mut tasks = JoinSet::new();
        for section in Section::ALL {
            tasks.spawn(
                run_section(
                    section,
                    Arc::clone(&self.warehouse),
                    Arc::clone(&self.workers),
                    self.config.retry.clone(),
                    person_id,
                )
                .in_current_span(),
            );
        }

        let mut subject = None;
        let mut measurements = Mapped::default();
        let mut actions = Mapped::default();
        let mut diseases = Mapped::default();
        let mut section_failures = Vec::new();

        // Returning early drops `tasks`, which aborts the fetches still running.
        // List failures are held until the subject resolves, so a missing or
        // unmappable subject always wins over them.
        while let Some(joined) = tasks.join_next().await {
            let (section, result) =
                joined.map_err(|e| ExportError::internal(format!("section task failed: {e}")))?;
            match result {
                Ok(SectionOutput::Subject(Some(individual))) => subject = Some(individual),
                Ok(SectionOutput::Subject(None)) => return Err(ExportError::NotFound { person_id }),
                Ok(SectionOutput::Measurements(mapped)) => measurements = mapped,
                Ok(SectionOutput::MedicalActions(mapped)) => actions = mapped,
                Ok(SectionOutput::Diseases(mapped)) => diseases = mapped,
                Err(error) if section == Section::Subject => return Err(error),
                Err(error) => {
                    warn!(%section, %error, "section fetch failed");
                    section_failures.push(SectionFailure { section, error });
                }
            }

            if subject.is_some()
                && self.config.fail_on_section_error
                && let Some(failure) = section_failures.pop()
            {
                return Err(failure.error);
            }
        }

        let subject =
            subject.ok_or_else(|| ExportError::internal("subject section returned no result"))?;

        let mut rejected_rows = measurements.rejected;
        rejected_rows.extend(actions.rejected);
        rejected_rows.extend(diseases.rejected);

        let phenopacket = Phenopacket::new(
            format!("{}:{}", self.config.id_prefix, subject.id),
            subject,
            measurements.records,
            actions.records,
            diseases.records,
            self.clock.now(),
            self.config.producer.clone(),
        );

        info!(
            id = %phenopacket.id,
            measurements = phenopacket.measurements.len(),
            medical_actions = phenopacket.medical_actions.len(),
            diseases = phenopacket.diseases.len(),
            rejected = rejected_rows.len(),
            "phenopacket assembled"
        );

        Ok(ExportReport {
            phenopacket,
            rejected_rows,
            section_failures,
        })
    }
}

async fn run_section(
    section: Section,
    warehouse: DynWarehouse,
    workers: Arc<Semaphore>,
    retry: RetryPolicy,
    person_id: PersonId,
) -> (Section, Result<SectionOutput>) {
    let Ok(_permit) = workers.acquire_owned().await else {
        return (section, Err(ExportError::internal("worker pool closed")));
    };
    let warehouse = warehouse.as_ref();
    let output = match section {
        Section::Subject => resolve_individual(warehouse, person_id, &retry)
            .await
            .map(SectionOutput::Subject),
        Section::Measurements => map_measurements(warehouse, person_id, &retry)
            .await
            .map(SectionOutput::Measurements),
        Section::MedicalActions => map_medical_actions(warehouse, person_id, &retry)
            .await
            .map(SectionOutput::MedicalActions),
        Section::Diseases => map_diseases(warehouse, person_id, &retry)
            .await
            .map(SectionOutput::Diseases),
    };
    (section, output)
}
