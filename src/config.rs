//! Configuration for the report processor.
//!
//! Every section has sensible defaults and missing JSON fields fall back to
//! them, so a config file only needs to name what it changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::sniff::filters::{ExtensionFilter, FilterSet, CELLEBRITE_DESCRIPTION, CELLEBRITE_EXTENSIONS};
use crate::sniff::io::DEFAULT_MAX_REPORT_SIZE;

/// Score reported by `can_process` for a recognized report (0-100 scale).
pub const HIGH_CONFIDENCE_SCORE: u8 = 100;

/// Master configuration for the processor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Type sniffer settings.
    pub sniff: SniffConfig,
    /// Background job dispatch settings.
    pub dispatch: DispatchConfig,
}

impl ProcessorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading processor config from {:?}", path);
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Type sniffer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SniffConfig {
    /// Accepted file-name suffixes, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Filter description shown to users.
    pub description: String,
    /// Reports larger than this many bytes are not parsed.
    pub max_report_size: u64,
}

impl Default for SniffConfig {
    fn default() -> Self {
        Self {
            extensions: CELLEBRITE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            description: CELLEBRITE_DESCRIPTION.to_string(),
            max_report_size: DEFAULT_MAX_REPORT_SIZE,
        }
    }
}

impl SniffConfig {
    pub fn filter_set(&self) -> FilterSet {
        FilterSet::new().with(ExtensionFilter::new(&self.extensions, self.description.clone()))
    }
}

/// What `process` does with a file the sniffer did not recognize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidReportPolicy {
    /// Ingest it anyway as a SIM report (historical behavior).
    #[default]
    TreatAsSim,
    /// Refuse with `CellexError::UnrecognizedReport`.
    Decline,
}

/// Background job dispatch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Refuse a new job while another one from the same processor is live.
    pub single_flight: bool,
    pub invalid_report_policy: InvalidReportPolicy,
    /// Worker threads are named `<prefix>-<job id>`.
    pub thread_name_prefix: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            single_flight: false,
            invalid_report_policy: InvalidReportPolicy::TreatAsSim,
            thread_name_prefix: "cellebrite-ingest".to_string(),
        }
    }
}
