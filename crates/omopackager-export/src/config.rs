use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the export engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Namespace put in front of the person id in the record id (`PREFIX:123`).
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    /// Producer written to `metaData.createdBy`.
    #[serde(default = "default_producer")]
    pub producer: String,
    /// Maximum number of section fetches running at once across all requests.
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    /// Deadline for one export, in milliseconds.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Whether a failing list section fails the whole request. When off, the
    /// section is emitted empty and reported in the export report.
    #[serde(default)]
    pub fail_on_section_error: bool,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_id_prefix() -> String {
    "OMOP".to_string()
}

fn default_producer() -> String {
    "OMOPackager".to_string()
}

fn default_worker_pool_size() -> usize {
    16
}

fn default_deadline_ms() -> u64 {
    30_000
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            producer: default_producer(),
            worker_pool_size: default_worker_pool_size(),
            deadline_ms: default_deadline_ms(),
            fail_on_section_error: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl ExportConfig {
    /// Create a config with the given id prefix and defaults for the rest.
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self {
            id_prefix: id_prefix.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    #[must_use]
    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_fail_on_section_error(mut self, fail: bool) -> Self {
        self.fail_on_section_error = fail;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id_prefix.trim().is_empty() {
            return Err("export.id_prefix must not be empty".into());
        }
        if self.id_prefix.contains(':') || self.id_prefix.contains(char::is_whitespace) {
            return Err("export.id_prefix must not contain ':' or whitespace".into());
        }
        if self.producer.trim().is_empty() {
            return Err("export.producer must not be empty".into());
        }
        if self.worker_pool_size == 0 {
            return Err("export.worker_pool_size must be > 0".into());
        }
        if self.deadline_ms == 0 {
            return Err("export.deadline_ms must be > 0".into());
        }
        self.retry.validate()
    }
}

/// Bounded exponential backoff for transient data-source errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    2_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling up to the cap.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(20);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("export.retry.max_attempts must be > 0".into());
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err("export.retry.initial_backoff_ms must be <= max_backoff_ms".into());
        }
        Ok(())
    }
}
