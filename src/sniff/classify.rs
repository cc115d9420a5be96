//! Report type classification.
//!
//! Classification is fail-soft: every way a candidate can fail to be a
//! Cellebrite logical report collapses to [`ReportKind::Invalid`], while
//! [`Classification`] keeps the reason for callers and tests that care.

use std::fmt;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::config::SniffConfig;
use crate::core::report::{ReportCandidate, ReportKind};
use crate::sniff::filters::FilterSet;
use crate::sniff::io::{IOLimits, IOUtils};
use crate::sniff::xml::{read_report_type, XmlProbeError};

/// `report_type` value for SIM card reports.
pub const REPORT_TYPE_SIM: &str = "sim";
/// `report_type` value for handset reports.
pub const REPORT_TYPE_CELL: &str = "cell";

/// Outcome of sniffing one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Recognized(ReportKind),
    Unrecognized(Unrecognized),
}

/// Why a candidate was not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unrecognized {
    /// No filter in the set accepts the file name.
    FilteredOut,
    /// The file could not be opened or read.
    Io { kind: io::ErrorKind, message: String },
    /// The file exceeds the configured report size ceiling.
    TooLarge { size: u64, limit: u64 },
    /// Not a well-formed XML document.
    Malformed(String),
    /// Well formed, but no `report_type` text at the expected path.
    MissingReportType,
    /// `report_type` holds something other than "sim" or "cell".
    UnknownReportType(String),
}

impl Classification {
    pub fn kind(&self) -> ReportKind {
        match self {
            Classification::Recognized(kind) => *kind,
            Classification::Unrecognized(_) => ReportKind::Invalid,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, Classification::Recognized(_))
    }

    pub fn reason(&self) -> Option<&Unrecognized> {
        match self {
            Classification::Recognized(_) => None,
            Classification::Unrecognized(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Unrecognized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unrecognized::FilteredOut => write!(f, "file name rejected by filters"),
            Unrecognized::Io { message, .. } => write!(f, "I/O error: {message}"),
            Unrecognized::TooLarge { size, limit } => {
                write!(f, "report too large: {size} bytes (limit: {limit})")
            }
            Unrecognized::Malformed(message) => write!(f, "malformed XML: {message}"),
            Unrecognized::MissingReportType => write!(f, "no report_type field"),
            Unrecognized::UnknownReportType(value) => write!(f, "unknown report_type {value:?}"),
        }
    }
}

/// Map a `report_type` value to a report kind.
pub fn kind_for_report_type(value: &str) -> ReportKind {
    if value.eq_ignore_ascii_case(REPORT_TYPE_SIM) {
        ReportKind::SimLogical
    } else if value.eq_ignore_ascii_case(REPORT_TYPE_CELL) {
        ReportKind::HandsetLogical
    } else {
        ReportKind::Invalid
    }
}

/// Sniffer for Cellebrite logical XML reports.
#[derive(Debug, Clone)]
pub struct ReportSniffer {
    filters: FilterSet,
    max_report_size: u64,
}

impl ReportSniffer {
    pub fn new(filters: FilterSet, max_report_size: u64) -> Self {
        Self {
            filters,
            max_report_size,
        }
    }

    pub fn from_config(config: &SniffConfig) -> Self {
        Self::new(config.filter_set(), config.max_report_size)
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Classify a candidate, collapsing every failure to `Invalid`.
    pub fn classify(&self, candidate: &ReportCandidate) -> ReportKind {
        self.sniff(candidate).kind()
    }

    /// Convenience wrapper over [`ReportSniffer::classify`] for a bare path.
    pub fn classify_path(&self, path: &Path) -> ReportKind {
        self.classify(&ReportCandidate::new(path))
    }

    /// Classify a candidate, keeping the reason when it is not recognized.
    pub fn sniff(&self, candidate: &ReportCandidate) -> Classification {
        let path = candidate.path();
        let classification = self.sniff_inner(candidate);
        match &classification {
            Classification::Recognized(kind) => {
                debug!(path = %path.display(), kind = %kind, "Recognized Cellebrite report");
            }
            Classification::Unrecognized(reason) => {
                debug!(path = %path.display(), reason = %reason, "Not a Cellebrite logical report");
            }
        }
        classification
    }

    fn sniff_inner(&self, candidate: &ReportCandidate) -> Classification {
        let path = candidate.path();
        if !self.filters.accepts(path) {
            return Classification::Unrecognized(Unrecognized::FilteredOut);
        }

        let size = match IOUtils::file_size(path) {
            Ok(size) => size,
            Err(e) => return Classification::Unrecognized(io_reason(&e)),
        };
        if size > self.max_report_size {
            return Classification::Unrecognized(Unrecognized::TooLarge {
                size,
                limit: self.max_report_size,
            });
        }

        let mut stream = match candidate.open(IOLimits::whole_file(self.max_report_size)) {
            Ok(stream) => stream,
            Err(e) => return Classification::Unrecognized(io_reason(&e)),
        };

        let result = read_report_type(&mut stream);
        // The file grew past the limit after it was sized.
        if stream.get_ref().is_truncated() {
            return Classification::Unrecognized(Unrecognized::TooLarge {
                size: IOUtils::file_size(path).unwrap_or(u64::MAX),
                limit: self.max_report_size,
            });
        }

        let value = match result {
            Ok(Some(value)) => value,
            Ok(None) => return Classification::Unrecognized(Unrecognized::MissingReportType),
            Err(XmlProbeError::Io(e)) => return Classification::Unrecognized(io_reason(&e)),
            Err(e @ XmlProbeError::Malformed { .. }) => {
                return Classification::Unrecognized(Unrecognized::Malformed(e.to_string()))
            }
        };

        match kind_for_report_type(&value) {
            ReportKind::Invalid => {
                Classification::Unrecognized(Unrecognized::UnknownReportType(value))
            }
            kind => Classification::Recognized(kind),
        }
    }
}

impl Default for ReportSniffer {
    fn default() -> Self {
        Self::from_config(&SniffConfig::default())
    }
}

fn io_reason(err: &io::Error) -> Unrecognized {
    Unrecognized::Io {
        kind: err.kind(),
        message: err.to_string(),
    }
}
