//! Classification and ingestion of Cellebrite XML logical reports.
//!
//! [`sniff::ReportSniffer`] decides whether a file is a handset or SIM
//! logical report; [`ingest::LogicalReportProcessor`] starts a cancellable
//! background job that adds it to a case through [`ingest::CaseDatabase`].

/// Configuration
pub mod config;
/// Core data types
pub mod core;
pub mod error;
/// Background ingest jobs and the data source processor
pub mod ingest;
pub mod logging;
/// Report type sniffing
pub mod sniff;
pub mod timeout;

pub use crate::core::{ReportCandidate, ReportKind};
pub use error::{CellexError, Result};
pub use ingest::LogicalReportProcessor;
