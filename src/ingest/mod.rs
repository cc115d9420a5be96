//! Background ingestion of classified reports into a case.

pub mod cancel;
pub mod case;
pub mod dispatcher;
pub mod job;
pub mod outcome;
pub mod progress;
pub mod selection;

pub use cancel::CancelFlag;
pub use case::{CaseDatabase, CaseError, CaseImport, MemoryCase};
pub use dispatcher::{LogicalReportProcessor, DATA_SOURCE_TYPE};
pub use job::{JobHandle, JobId};
pub use outcome::{DataSourceCallback, IngestOutcome, IngestStatus};
pub use progress::{NullProgress, ProgressMonitor, TracingProgress};
pub use selection::{ReportSelection, SelectionSettings, SelectionStore};
