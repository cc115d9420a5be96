//! Integration tests for report sniffing.
//!
//! Classifies the sample reports and generated documents through the
//! public sniffer and processor entry points.

mod classify;
