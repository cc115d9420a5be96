//! Error types for the Cellebrite report processor.
//!
//! Classification never produces these: an unrecognized report is data
//! (see [`crate::sniff::Classification`]), not an error. These cover misuse
//! of the dispatcher, configuration I/O and waiting on jobs.

use crate::ingest::JobId;
use thiserror::Error;

/// Main error type for processor operations.
#[derive(Debug, Error)]
pub enum CellexError {
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The wizard-style selection is incomplete or points at an unusable file
    #[error("Invalid report selection: {0}")]
    InvalidSelection(String),

    /// `process` declined a file the sniffer did not recognize
    #[error("Not a Cellebrite logical report: {0}")]
    UnrecognizedReport(String),

    /// Single-flight dispatch refused a new job while another is live
    #[error("Processor busy: job {active} is still running")]
    Busy { active: JobId },

    /// The worker thread could not be started
    #[error("Failed to spawn ingest job: {0}")]
    Spawn(std::io::Error),

    /// Waiting on a job exceeded its deadline
    #[error("Operation timeout after {seconds}s")]
    Timeout { seconds: u64 },

    /// The job ended without delivering an outcome
    #[error("Ingest job {0} ended without reporting an outcome")]
    JobLost(JobId),

    /// Configuration (de)serialization errors
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for processor operations
pub type Result<T> = std::result::Result<T, CellexError>;
