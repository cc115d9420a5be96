//! Progress sinks driven by the background ingest job.

use tracing::info;

/// Receives progress updates from a running job. Implemented by the host.
pub trait ProgressMonitor: Send + Sync {
    fn set_indeterminate(&self, indeterminate: bool);

    /// Percent complete, 0 to 100.
    fn set_progress(&self, progress: u32);

    fn set_progress_text(&self, text: &str);
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressMonitor for NullProgress {
    fn set_indeterminate(&self, _indeterminate: bool) {}

    fn set_progress(&self, _progress: u32) {}

    fn set_progress_text(&self, _text: &str) {}
}

/// Logs updates through `tracing`, for headless runs.
#[derive(Debug, Clone, Default)]
pub struct TracingProgress {
    label: String,
}

impl TracingProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ProgressMonitor for TracingProgress {
    fn set_indeterminate(&self, indeterminate: bool) {
        info!(label = %self.label, indeterminate, "progress mode");
    }

    fn set_progress(&self, progress: u32) {
        info!(label = %self.label, progress = progress.min(100), "progress");
    }

    fn set_progress_text(&self, text: &str) {
        info!(label = %self.label, "{}", text);
    }
}
