//! The case layer the ingest job writes into.
//!
//! The real case database lives outside this crate; it is reached only
//! through [`CaseDatabase`]. [`MemoryCase`] keeps data sources in memory and
//! is what tests and dry runs use.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::io;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::data_source::{DataSource, DataSourceId};
use crate::core::request::IngestRequest;
use crate::ingest::cancel::CancelFlag;
use crate::ingest::progress::ProgressMonitor;
use crate::sniff::io::{IOLimits, SafeFileReader};

/// Prefix of the names given to data sources added without a root name.
pub const DEFAULT_NAME_PREFIX: &str = "LogicalFileSet";

/// Errors raised by the case layer while adding a report.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("report rejected by case: {0}")]
    Rejected(String),

    #[error("case database error: {0}")]
    Database(String),

    #[error("add cancelled")]
    Cancelled,
}

/// What the case layer added for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseImport {
    pub data_sources: Vec<DataSource>,
    /// Non-fatal problems encountered while adding.
    pub warnings: Vec<String>,
}

/// Case database collaborator.
pub trait CaseDatabase: Send + Sync {
    /// Add the report described by `request` as one or more data sources.
    ///
    /// Implementations may poll `cancel` and stop early; partially applied
    /// state is allowed to remain.
    fn add_logical_report(
        &self,
        request: &IngestRequest,
        progress: &dyn ProgressMonitor,
        cancel: &CancelFlag,
    ) -> Result<CaseImport, CaseError>;
}

#[derive(Debug, Default)]
struct MemoryCaseState {
    next_id: u64,
    unnamed_count: u32,
    data_sources: Vec<DataSource>,
}

/// In-memory case that records every data source it is asked to add.
#[derive(Debug, Default)]
pub struct MemoryCase {
    state: Mutex<MemoryCaseState>,
    limits: IOLimits,
}

impl MemoryCase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: IOLimits) -> Self {
        Self {
            state: Mutex::default(),
            limits,
        }
    }

    pub fn data_sources(&self) -> Vec<DataSource> {
        self.lock().data_sources.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().data_sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryCaseState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn hash_report(&self, request: &IngestRequest) -> io::Result<String> {
        let mut stream =
            SafeFileReader::open(request.source_path(), self.limits.clone())?.into_buffered();
        let mut hasher = Sha256::new();
        io::copy(&mut stream, &mut hasher)?;
        Ok(hex::encode(hasher.finalize()))
    }
}

impl CaseDatabase for MemoryCase {
    fn add_logical_report(
        &self,
        request: &IngestRequest,
        progress: &dyn ProgressMonitor,
        cancel: &CancelFlag,
    ) -> Result<CaseImport, CaseError> {
        progress.set_progress_text("Hashing report");
        let sha256 = self.hash_report(request)?;
        debug!(path = ?request.source_path, sha256 = %sha256, "Hashed report");

        if cancel.is_cancelled() {
            return Err(CaseError::Cancelled);
        }

        let data_source = {
            let mut state = self.lock();
            let name = if request.uses_default_name() {
                state.unnamed_count += 1;
                format!("{DEFAULT_NAME_PREFIX}{}", state.unnamed_count)
            } else {
                request.root_virtual_directory_name.clone()
            };
            state.next_id += 1;
            let data_source = DataSource {
                id: DataSourceId(state.next_id),
                device_id: request.device_id.clone(),
                name,
                source_path: request.source_path.clone(),
                input_type: request.input_type,
                sha256: Some(sha256),
                added_at: Utc::now(),
            };
            state.data_sources.push(data_source.clone());
            data_source
        };

        info!(
            id = %data_source.id,
            name = %data_source.name,
            input_type = %data_source.input_type,
            "Added data source"
        );
        progress.set_progress(100);

        Ok(CaseImport {
            data_sources: vec![data_source],
            warnings: Vec::new(),
        })
    }
}
