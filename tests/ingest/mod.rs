//! Integration tests for the ingest dispatcher.
//!
//! Jobs run on real threads against in-memory and scripted case layers.

mod cancellation;
