//! File filters shared by interactive selection and the automated gate.
//!
//! A filter answers "could this path be one of ours" from the name alone.
//! Both the selection validator and `can_process` go through the same
//! [`FilterSet`] so the two paths never disagree about what is eligible.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Default extension for Cellebrite logical reports.
pub const CELLEBRITE_EXTENSIONS: &[&str] = &[".xml"];

/// Default description shown next to the filter.
pub const CELLEBRITE_DESCRIPTION: &str = "Cellebrite XML Files (*.xml)";

/// Predicate over candidate paths.
pub trait FileFilter: Send + Sync {
    fn accept(&self, path: &Path) -> bool;

    fn description(&self) -> &str;
}

/// Accepts files whose name ends with one of the extensions, ignoring case.
///
/// Directories are accepted so a chooser can navigate into them; they never
/// survive the structural probe that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
    description: String,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I, description: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| {
                let e = e.as_ref().to_lowercase();
                if e.starts_with('.') {
                    e
                } else {
                    format!(".{e}")
                }
            })
            .collect();
        Self {
            extensions,
            description: description.into(),
        }
    }

    /// The `.xml` filter used for Cellebrite reports.
    pub fn cellebrite_xml() -> Self {
        Self::new(CELLEBRITE_EXTENSIONS.iter().copied(), CELLEBRITE_DESCRIPTION)
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn name_matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy().to_lowercase();
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }
}

impl FileFilter for ExtensionFilter {
    fn accept(&self, path: &Path) -> bool {
        path.is_dir() || self.name_matches(path)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Ordered set of filters; a path is eligible if any filter accepts it.
#[derive(Clone, Default)]
pub struct FilterSet {
    filters: Vec<Arc<dyn FileFilter>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cellebrite_xml() -> Self {
        Self::new().with(ExtensionFilter::cellebrite_xml())
    }

    pub fn with(mut self, filter: impl FileFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn push(&mut self, filter: Arc<dyn FileFilter>) {
        self.filters.push(filter);
    }

    pub fn accepts(&self, path: &Path) -> bool {
        self.filters.iter().any(|f| f.accept(path))
    }

    pub fn descriptions(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.description()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSet")
            .field("filters", &self.descriptions())
            .finish()
    }
}
