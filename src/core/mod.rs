//! Core data types for the Cellebrite report processor.

pub mod data_source;
pub mod report;
pub mod request;

pub use data_source::{DataSource, DataSourceId};
pub use report::{InputType, ReportCandidate, ReportKind};
pub use request::{DeviceId, IngestRequest};
