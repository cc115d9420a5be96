//! Terminal job results and the callback that receives them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::data_source::DataSource;
use crate::ingest::job::JobId;

/// How a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngestStatus {
    NoErrors,
    /// Data sources were added, with warnings.
    NonCriticalErrors,
    /// Nothing usable was added.
    CriticalErrors,
    /// Cancellation was observed; no data sources are reported.
    Cancelled,
}

impl fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestStatus::NoErrors => write!(f, "NoErrors"),
            IngestStatus::NonCriticalErrors => write!(f, "NonCriticalErrors"),
            IngestStatus::CriticalErrors => write!(f, "CriticalErrors"),
            IngestStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Record delivered exactly once per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub job_id: JobId,
    pub status: IngestStatus,
    pub errors: Vec<String>,
    pub new_data_sources: Vec<DataSource>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.status == IngestStatus::Cancelled
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            IngestStatus::NoErrors | IngestStatus::NonCriticalErrors
        )
    }
}

/// Receives the job's outcome. Implemented by the host.
pub trait DataSourceCallback: Send + Sync {
    fn done(&self, outcome: &IngestOutcome);
}

impl<F> DataSourceCallback for F
where
    F: Fn(&IngestOutcome) + Send + Sync,
{
    fn done(&self, outcome: &IngestOutcome) {
        self(outcome)
    }
}
