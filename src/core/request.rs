//! Device identifiers and ingest requests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::core::report::InputType;

/// Printable identifier of the device a data source was acquired from,
/// intended to be unique across cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(value: impl Into<String>) -> Self {
        DeviceId(value.into())
    }

    /// A fresh UUID v4 device id.
    pub fn generate() -> Self {
        DeviceId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the id is non-empty printable ASCII.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_graphic() || b == b' ')
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        DeviceId::new(value)
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        DeviceId(value)
    }
}

/// Everything the background job needs to add one report to the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub device_id: DeviceId,
    /// Empty means "let the case layer pick a default name".
    pub root_virtual_directory_name: String,
    pub source_path: PathBuf,
    pub input_type: InputType,
}

impl IngestRequest {
    pub fn new(
        device_id: DeviceId,
        root_virtual_directory_name: impl Into<String>,
        source_path: impl Into<PathBuf>,
        input_type: InputType,
    ) -> Self {
        Self {
            device_id,
            root_virtual_directory_name: root_virtual_directory_name.into(),
            source_path: source_path.into(),
            input_type,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn uses_default_name(&self) -> bool {
        self.root_virtual_directory_name.is_empty()
    }
}
