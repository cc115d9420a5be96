//! Data sources created in the case from an ingested report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::report::InputType;
use crate::core::request::DeviceId;

/// Case-assigned identifier of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSourceId(pub u64);

impl fmt::Display for DataSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A data source added to the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: DataSourceId,
    pub device_id: DeviceId,
    /// Name of the root virtual directory representing the data source.
    pub name: String,
    pub source_path: PathBuf,
    pub input_type: InputType,
    /// Hex SHA-256 of the report file, when the case layer computed one.
    pub sha256: Option<String>,
    pub added_at: DateTime<Utc>,
}
