//! The Cellebrite logical report data source processor.
//!
//! Ties the sniffer to background ingest jobs. Classification happens on the
//! caller's thread; everything after `run` returns happens on the job thread
//! and is reported only through the callback and the [`JobHandle`].
//!
//! Jobs started from one processor are not serialized against each other
//! unless [`DispatchConfig::single_flight`](crate::config::DispatchConfig) is
//! set; two concurrent jobs may write to the same case.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{InvalidReportPolicy, ProcessorConfig, HIGH_CONFIDENCE_SCORE};
use crate::core::report::{InputType, ReportCandidate, ReportKind};
use crate::core::request::{DeviceId, IngestRequest};
use crate::error::{CellexError, Result};
use crate::ingest::cancel::CancelFlag;
use crate::ingest::case::CaseDatabase;
use crate::ingest::job::{IngestJob, JobHandle, JobId, JobRegistry};
use crate::ingest::outcome::DataSourceCallback;
use crate::ingest::progress::ProgressMonitor;
use crate::ingest::selection::{ReportSelection, SelectionStore};
use crate::sniff::classify::{Classification, ReportSniffer};
use crate::sniff::filters::FilterSet;

/// Display name of the data source type handled here.
pub const DATA_SOURCE_TYPE: &str = "Cellebrite XML";

/// Adds Cellebrite XML logical reports to a case.
pub struct LogicalReportProcessor {
    config: ProcessorConfig,
    sniffer: ReportSniffer,
    case: Arc<dyn CaseDatabase>,
    registry: Arc<JobRegistry>,
    selection_store: Option<SelectionStore>,
}

impl LogicalReportProcessor {
    pub fn new(case: Arc<dyn CaseDatabase>) -> Self {
        Self::with_config(case, ProcessorConfig::default())
    }

    pub fn with_config(case: Arc<dyn CaseDatabase>, config: ProcessorConfig) -> Self {
        let sniffer = ReportSniffer::from_config(&config.sniff);
        Self {
            config,
            sniffer,
            case,
            registry: Arc::new(JobRegistry::default()),
            selection_store: None,
        }
    }

    /// Remember the directory of interactive selections in `store`.
    pub fn with_selection_store(mut self, store: SelectionStore) -> Self {
        self.selection_store = Some(store);
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn data_source_type(&self) -> &'static str {
        DATA_SOURCE_TYPE
    }

    /// Filters shared by selection validation and [`Self::can_process`].
    pub fn file_filters(&self) -> &FilterSet {
        self.sniffer.filters()
    }

    pub fn sniffer(&self) -> &ReportSniffer {
        &self.sniffer
    }

    pub fn selection_store(&self) -> Option<&SelectionStore> {
        self.selection_store.as_ref()
    }

    /// Start adding a report on a background thread.
    ///
    /// Returns once the thread is started. Failures while adding the report
    /// are reported to `callback`, never here.
    pub fn run(
        &self,
        device_id: DeviceId,
        root_virtual_directory_name: &str,
        source_path: impl Into<PathBuf>,
        is_handset: bool,
        progress: Arc<dyn ProgressMonitor>,
        callback: Arc<dyn DataSourceCallback>,
    ) -> Result<JobHandle> {
        if !device_id.is_valid() {
            warn!(device = %device_id, "Device id is not a printable token");
        }

        let request = IngestRequest::new(
            device_id,
            root_virtual_directory_name,
            source_path,
            InputType::from_handset_flag(is_handset),
        );
        let id = self.registry.next_id();
        let job = IngestJob {
            id,
            request,
            case: Arc::clone(&self.case),
            progress,
            callback,
            cancel: CancelFlag::new(),
        };

        let handle = job.spawn(
            Arc::clone(&self.registry),
            format!("{}-{}", self.config.dispatch.thread_name_prefix, id),
            self.config.dispatch.single_flight,
        )?;
        info!(job = %id, "Started Cellebrite ingest job");
        Ok(handle)
    }

    /// Start adding a report chosen interactively.
    ///
    /// A fresh UUID is used both as the device id and as the name of the
    /// root virtual directory.
    pub fn run_selection(
        &self,
        selection: &ReportSelection,
        progress: Arc<dyn ProgressMonitor>,
        callback: Arc<dyn DataSourceCallback>,
    ) -> Result<JobHandle> {
        selection.validate(self.file_filters())?;
        if let Some(store) = &self.selection_store {
            if let Err(e) = store.remember(selection) {
                warn!(error = %e, "Could not remember report directory");
            }
        }

        let device_id = DeviceId::generate();
        let root_name = device_id.to_string();
        self.run(
            device_id,
            &root_name,
            selection.path.clone(),
            selection.is_handset,
            progress,
            callback,
        )
    }

    /// Request cancellation of a specific job. False if it is not running.
    pub fn cancel(&self, id: JobId) -> bool {
        match self.registry.get(id) {
            Some(flag) => {
                info!(job = %id, "Cancellation requested");
                flag.cancel();
                true
            }
            None => {
                debug!(job = %id, "Cancel ignored: job is not running");
                false
            }
        }
    }

    /// Request cancellation of the most recently started job still running.
    pub fn cancel_latest(&self) -> bool {
        match self.registry.latest() {
            Some((id, flag)) => {
                info!(job = %id, "Cancellation requested");
                flag.cancel();
                true
            }
            None => {
                debug!("Cancel ignored: no job is running");
                false
            }
        }
    }

    /// Request cancellation of every running job; returns how many there were.
    pub fn cancel_all(&self) -> usize {
        let flags = self.registry.flags();
        for flag in &flags {
            flag.cancel();
        }
        if !flags.is_empty() {
            info!(jobs = flags.len(), "Cancellation requested for all jobs");
        }
        flags.len()
    }

    pub fn active_jobs(&self) -> Vec<JobId> {
        self.registry.ids()
    }

    /// Confidence (0-100) that this processor can handle `path`.
    pub fn can_process(&self, path: &Path) -> u8 {
        if self.sniffer.classify_path(path).is_recognized() {
            HIGH_CONFIDENCE_SCORE
        } else {
            0
        }
    }

    /// Classify `path` and start adding it, for automated pipelines.
    ///
    /// The device id doubles as the root virtual directory name.
    pub fn process(
        &self,
        device_id: DeviceId,
        path: &Path,
        progress: Arc<dyn ProgressMonitor>,
        callback: Arc<dyn DataSourceCallback>,
    ) -> Result<JobHandle> {
        let classification = self.sniffer.sniff(&ReportCandidate::new(path));
        let is_handset = match &classification {
            Classification::Recognized(kind) => *kind == ReportKind::HandsetLogical,
            Classification::Unrecognized(reason) => {
                match self.config.dispatch.invalid_report_policy {
                    InvalidReportPolicy::TreatAsSim => {
                        warn!(
                            path = %path.display(),
                            reason = %reason,
                            "Report type not recognized; processing as a SIM report"
                        );
                        false
                    }
                    InvalidReportPolicy::Decline => {
                        return Err(CellexError::UnrecognizedReport(format!(
                            "{}: {}",
                            path.display(),
                            reason
                        )));
                    }
                }
            }
        };

        let root_name = device_id.to_string();
        self.run(device_id, &root_name, path, is_handset, progress, callback)
    }
}
