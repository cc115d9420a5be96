//! Interactive report selection and its remembered settings.
//!
//! When a user picks a report by hand, the choice is checked against the same
//! filters the automated path uses, and the directory it came from is kept
//! per context so the next selection starts there.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{CellexError, Result};
use crate::sniff::filters::FilterSet;
use crate::sniff::io::IOUtils;

/// A report chosen by the user, plus the handset/SIM choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSelection {
    pub path: PathBuf,
    pub is_handset: bool,
}

impl ReportSelection {
    pub fn new(path: impl Into<PathBuf>, is_handset: bool) -> Self {
        Self {
            path: path.into(),
            is_handset,
        }
    }

    /// Check the selection names an existing regular file the filters accept.
    pub fn validate(&self, filters: &FilterSet) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(CellexError::InvalidSelection("no report selected".into()));
        }
        if !IOUtils::is_regular_file(&self.path) {
            return Err(CellexError::InvalidSelection(format!(
                "{} is not an existing file",
                self.path.display()
            )));
        }
        if !filters.accepts(&self.path) {
            return Err(CellexError::InvalidSelection(format!(
                "{} does not match {}",
                self.path.display(),
                filters.descriptions().join(", ")
            )));
        }
        Ok(())
    }

    /// Directory the selected report lives in.
    pub fn directory(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

/// Persisted selection settings for one context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    pub last_directory: Option<PathBuf>,
}

/// JSON-backed store of [`SelectionSettings`], one file per context.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    file: PathBuf,
}

impl SelectionStore {
    pub fn new(settings_dir: impl AsRef<Path>, context: &str) -> Self {
        Self {
            file: settings_dir.as_ref().join(format!("{context}.json")),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Load settings; a missing file yields defaults.
    pub fn load(&self) -> Result<SelectionSettings> {
        match fs::read_to_string(&self.file) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(SelectionSettings::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, settings: &SelectionSettings) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.file, serde_json::to_string_pretty(settings)?)?;
        debug!("Saved selection settings to {:?}", self.file);
        Ok(())
    }

    /// Directory to start the next selection in, if one was remembered.
    pub fn last_directory(&self) -> Option<PathBuf> {
        match self.load() {
            Ok(settings) => settings.last_directory,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable selection settings");
                None
            }
        }
    }

    /// Remember the directory of `selection`.
    pub fn remember(&self, selection: &ReportSelection) -> Result<()> {
        let Some(dir) = selection.directory() else {
            return Ok(());
        };
        self.save(&SelectionSettings {
            last_directory: Some(dir.to_path_buf()),
        })
    }
}
