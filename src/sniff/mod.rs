//! Type sniffing for Cellebrite logical reports.
//!
//! A candidate passes the name filters, then a full structural parse, and is
//! finally classified from its `report_type` field.

pub mod classify;
pub mod filters;
pub mod io;
pub mod xml;

pub use classify::{kind_for_report_type, Classification, ReportSniffer, Unrecognized};
pub use filters::{ExtensionFilter, FileFilter, FilterSet};
