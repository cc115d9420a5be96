//! Background ingest jobs.
//!
//! Each job runs on its own named thread, polls a [`CancelFlag`] around the
//! case-layer call, fires the host callback exactly once and then publishes
//! the same outcome on a oneshot channel held by its [`JobHandle`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info, info_span, warn};

use crate::core::data_source::DataSource;
use crate::core::request::IngestRequest;
use crate::error::{CellexError, Result};
use crate::ingest::cancel::CancelFlag;
use crate::ingest::case::{CaseDatabase, CaseError, CaseImport};
use crate::ingest::outcome::{DataSourceCallback, IngestOutcome, IngestStatus};
use crate::ingest::progress::ProgressMonitor;
use crate::timeout::{with_timeout, TimeoutConfig};

/// Identifier of a job started by a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Live jobs of one processor, keyed by id.
#[derive(Debug, Default)]
pub(crate) struct JobRegistry {
    jobs: Mutex<BTreeMap<JobId, CancelFlag>>,
    next_id: AtomicU64,
}

impl JobRegistry {
    pub(crate) fn next_id(&self) -> JobId {
        JobId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<JobId, CancelFlag>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Track a job. With `single_flight`, fails with the id of a live job.
    pub(crate) fn register(
        &self,
        id: JobId,
        cancel: CancelFlag,
        single_flight: bool,
    ) -> std::result::Result<(), JobId> {
        let mut jobs = self.lock();
        if single_flight {
            if let Some(active) = jobs.keys().next_back() {
                return Err(*active);
            }
        }
        jobs.insert(id, cancel);
        Ok(())
    }

    pub(crate) fn remove(&self, id: JobId) {
        self.lock().remove(&id);
    }

    pub(crate) fn get(&self, id: JobId) -> Option<CancelFlag> {
        self.lock().get(&id).cloned()
    }

    /// Most recently started job that is still live.
    pub(crate) fn latest(&self) -> Option<(JobId, CancelFlag)> {
        self.lock()
            .iter()
            .next_back()
            .map(|(id, flag)| (*id, flag.clone()))
    }

    pub(crate) fn ids(&self) -> Vec<JobId> {
        self.lock().keys().copied().collect()
    }

    pub(crate) fn flags(&self) -> Vec<CancelFlag> {
        self.lock().values().cloned().collect()
    }
}

/// Keeps a job in its registry until dropped, even if the job thread unwinds.
struct Registered {
    registry: Arc<JobRegistry>,
    id: JobId,
}

impl Drop for Registered {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

/// Handle to a started job.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    cancel: CancelFlag,
    completion: oneshot::Receiver<IngestOutcome>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Request best-effort cancellation. Returns false if already requested.
    pub fn cancel(&self) -> bool {
        info!(job = %self.id, "Cancellation requested");
        self.cancel.cancel()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Block the current thread until the job reports its outcome.
    ///
    /// Must not be called from inside an async runtime; use
    /// [`JobHandle::wait_async`] there.
    pub fn wait(self) -> Result<IngestOutcome> {
        let id = self.id;
        self.completion
            .blocking_recv()
            .map_err(|_| CellexError::JobLost(id))
    }

    /// Await the outcome, giving up after `timeout`.
    pub async fn wait_async(self, timeout: Duration) -> Result<IngestOutcome> {
        let id = self.id;
        let config = TimeoutConfig::new(timeout, format!("wait for ingest job {id}"));
        with_timeout(config, async move {
            self.completion.await.map_err(|_| CellexError::JobLost(id))
        })
        .await
    }
}

/// One report being added to the case.
pub(crate) struct IngestJob {
    pub(crate) id: JobId,
    pub(crate) request: IngestRequest,
    pub(crate) case: Arc<dyn CaseDatabase>,
    pub(crate) progress: Arc<dyn ProgressMonitor>,
    pub(crate) callback: Arc<dyn DataSourceCallback>,
    pub(crate) cancel: CancelFlag,
}

impl IngestJob {
    /// Start the job on a new thread and track it in `registry` until it ends.
    pub(crate) fn spawn(
        self,
        registry: Arc<JobRegistry>,
        thread_name: String,
        single_flight: bool,
    ) -> Result<JobHandle> {
        let id = self.id;
        let cancel = self.cancel.clone();
        registry
            .register(id, cancel.clone(), single_flight)
            .map_err(|active| CellexError::Busy { active })?;

        let (tx, rx) = oneshot::channel();
        let registered = Registered { registry, id };
        let spawned = thread::Builder::new().name(thread_name).spawn(move || {
            let outcome = {
                let _registered = registered;
                self.run()
            };
            // The handle may have been dropped; the callback already fired.
            let _ = tx.send(outcome);
        });

        // On failure the closure, and with it the registration, is dropped.
        if let Err(e) = spawned {
            error!(job = %id, error = %e, "Failed to spawn ingest job");
            return Err(CellexError::Spawn(e));
        }

        Ok(JobHandle {
            id,
            cancel,
            completion: rx,
        })
    }

    pub(crate) fn run(self) -> IngestOutcome {
        let span = info_span!("ingest_job", job = %self.id, device = %self.request.device_id);
        let _guard = span.enter();
        let started_at = Utc::now();

        let (status, errors, new_data_sources) =
            match panic::catch_unwind(AssertUnwindSafe(|| self.execute())) {
                Ok(settled) => settled,
                Err(_) if self.cancel.is_cancelled() => {
                    (IngestStatus::Cancelled, Vec::new(), Vec::new())
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(panic = %message, "Ingest job panicked");
                    (
                        IngestStatus::CriticalErrors,
                        vec![format!("ingest job panicked: {message}")],
                        Vec::new(),
                    )
                }
            };

        let outcome = IngestOutcome {
            job_id: self.id,
            status,
            errors,
            new_data_sources,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            status = %outcome.status,
            data_sources = outcome.new_data_sources.len(),
            errors = outcome.errors.len(),
            "Ingest job finished"
        );

        let callback = Arc::clone(&self.callback);
        if panic::catch_unwind(AssertUnwindSafe(|| callback.done(&outcome))).is_err() {
            error!("Data source callback panicked");
        }
        outcome
    }

    /// Report progress and add the report. Host code called from here may panic.
    fn execute(&self) -> (IngestStatus, Vec<String>, Vec<DataSource>) {
        info!(
            path = ?self.request.source_path,
            input_type = %self.request.input_type,
            "Adding Cellebrite logical report"
        );
        self.progress.set_indeterminate(true);
        self.progress.set_progress(0);
        self.progress.set_progress_text(&format!(
            "Adding Cellebrite {} report: {}",
            self.request.input_type,
            self.request.source_path.display()
        ));

        let settled = if self.cancel.is_cancelled() {
            (IngestStatus::Cancelled, Vec::new(), Vec::new())
        } else {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                self.case.add_logical_report(
                    &self.request,
                    self.progress.as_ref(),
                    &self.cancel,
                )
            }));
            self.settle(result)
        };

        self.progress.set_indeterminate(false);
        if settled.0 != IngestStatus::Cancelled && settled.0 != IngestStatus::CriticalErrors {
            self.progress.set_progress(100);
        }
        settled
    }

    fn settle(
        &self,
        result: thread::Result<std::result::Result<CaseImport, CaseError>>,
    ) -> (IngestStatus, Vec<String>, Vec<DataSource>) {
        if self.cancel.is_cancelled() {
            if let Ok(Ok(import)) = &result {
                if !import.data_sources.is_empty() {
                    warn!(
                        discarded = import.data_sources.len(),
                        "Cancelled after the case added data sources; not reporting them"
                    );
                }
            }
            return (IngestStatus::Cancelled, Vec::new(), Vec::new());
        }

        match result {
            Ok(Ok(import)) if import.warnings.is_empty() => {
                (IngestStatus::NoErrors, Vec::new(), import.data_sources)
            }
            Ok(Ok(import)) => {
                for warning in &import.warnings {
                    warn!(warning = %warning, "Non-critical error adding report");
                }
                (
                    IngestStatus::NonCriticalErrors,
                    import.warnings,
                    import.data_sources,
                )
            }
            Ok(Err(CaseError::Cancelled)) => (IngestStatus::Cancelled, Vec::new(), Vec::new()),
            Ok(Err(e)) => {
                error!(error = %e, "Failed to add Cellebrite report");
                (IngestStatus::CriticalErrors, vec![e.to_string()], Vec::new())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "Case layer panicked while adding report");
                (
                    IngestStatus::CriticalErrors,
                    vec![format!("case layer panicked: {message}")],
                    Vec::new(),
                )
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
