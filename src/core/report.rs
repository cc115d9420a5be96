//! Report kinds and the candidate file handed to the sniffer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use crate::sniff::io::{BoundedReader, IOLimits, SafeFileReader};

/// Kind of Cellebrite logical report, as decided by the sniffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    /// `report_type` is "cell": a handset extraction.
    HandsetLogical,
    /// `report_type` is "sim": a SIM card extraction.
    SimLogical,
    Invalid,
}

impl ReportKind {
    pub fn is_recognized(self) -> bool {
        !matches!(self, ReportKind::Invalid)
    }

    /// Sub-kind the ingest job expects, if this kind is recognized.
    pub fn input_type(self) -> Option<InputType> {
        match self {
            ReportKind::HandsetLogical => Some(InputType::Handset),
            ReportKind::SimLogical => Some(InputType::Sim),
            ReportKind::Invalid => None,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::HandsetLogical => write!(f, "HandsetLogical"),
            ReportKind::SimLogical => write!(f, "SimLogical"),
            ReportKind::Invalid => write!(f, "Invalid"),
        }
    }
}

/// Input type handed to the background ingest job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputType {
    Handset,
    Sim,
}

impl InputType {
    pub fn from_handset_flag(is_handset: bool) -> Self {
        if is_handset {
            InputType::Handset
        } else {
            InputType::Sim
        }
    }

    pub fn is_handset(self) -> bool {
        matches!(self, InputType::Handset)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputType::Handset => write!(f, "handset"),
            InputType::Sim => write!(f, "SIM"),
        }
    }
}

/// A file offered for classification.
///
/// Read-only to the sniffer; the byte stream is always size-bounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCandidate {
    path: PathBuf,
}

impl ReportCandidate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the candidate for reading, refusing files over `limits.max_file_size`.
    pub fn open(&self, limits: IOLimits) -> io::Result<BufReader<BoundedReader<File>>> {
        Ok(SafeFileReader::open(&self.path, limits)?.into_buffered())
    }
}

impl From<&Path> for ReportCandidate {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for ReportCandidate {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}
