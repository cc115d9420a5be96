//! Cancellation of running ingest jobs.

use cellex::config::ProcessorConfig;
use cellex::core::DeviceId;
use cellex::ingest::{IngestStatus, JobHandle, LogicalReportProcessor, NullProgress};
use cellex::CellexError;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use crate::common::doubles::*;
use crate::common::sample;
use crate::common::test_data::*;

const ENTER_TIMEOUT: Duration = Duration::from_secs(10);

fn start(
    processor: &LogicalReportProcessor,
    callback: &Arc<RecordingCallback>,
) -> cellex::Result<JobHandle> {
    processor.run(
        DeviceId::new("dev"),
        "",
        sample(SAMPLE_HANDSET),
        true,
        Arc::new(NullProgress),
        callback.clone(),
    )
}

fn wait_entered(entered: &Receiver<()>) {
    entered
        .recv_timeout(ENTER_TIMEOUT)
        .expect("job never reached the case layer");
}

#[test]
fn test_cancel_discards_partial_import() {
    let (case, entered) = BlockingCase::new();
    let case = Arc::new(case);
    let processor = LogicalReportProcessor::new(case.clone());
    let callback = Arc::new(RecordingCallback::default());

    let handle = start(&processor, &callback).unwrap();
    wait_entered(&entered);
    assert_eq!(processor.active_jobs(), vec![handle.id()]);

    assert!(processor.cancel(handle.id()));
    assert!(handle.is_cancel_requested());
    let outcome = handle.wait().unwrap();

    assert_eq!(outcome.status, IngestStatus::Cancelled);
    assert!(outcome.is_cancelled());
    assert!(outcome.new_data_sources.is_empty());
    assert!(outcome.errors.is_empty());
    // The case layer finished its work; the outcome does not report it.
    assert_eq!(case.inner.len(), 1);
    assert_eq!(callback.calls(), 1);
    assert_eq!(callback.outcomes()[0].status, IngestStatus::Cancelled);
    assert!(processor.active_jobs().is_empty());
}

#[test]
fn test_cancel_finished_job_is_ignored() {
    let (case, _entered) = BlockingCase::new();
    let case = Arc::new(case);
    case.release();
    let processor = LogicalReportProcessor::new(case.clone());
    let callback = Arc::new(RecordingCallback::default());

    let handle = start(&processor, &callback).unwrap();
    let id = handle.id();
    let outcome = handle.wait().unwrap();

    assert_eq!(outcome.status, IngestStatus::NoErrors);
    assert!(!processor.cancel(id));
    assert!(!processor.cancel_latest());
    assert_eq!(callback.calls(), 1);
}

#[test]
fn test_cancel_latest_targets_newest_job() {
    let (case, entered) = BlockingCase::new();
    let case = Arc::new(case);
    let processor = LogicalReportProcessor::new(case.clone());
    let first_callback = Arc::new(RecordingCallback::default());
    let second_callback = Arc::new(RecordingCallback::default());

    let first = start(&processor, &first_callback).unwrap();
    wait_entered(&entered);
    let second = start(&processor, &second_callback).unwrap();
    wait_entered(&entered);
    assert!(second.id() > first.id());

    assert!(processor.cancel_latest());
    assert!(second.is_cancel_requested());
    assert!(!first.is_cancel_requested());

    case.release();
    let first = first.wait().unwrap();
    let second = second.wait().unwrap();

    assert_eq!(first.status, IngestStatus::NoErrors);
    assert_eq!(first.new_data_sources.len(), 1);
    assert_eq!(second.status, IngestStatus::Cancelled);
    assert!(second.new_data_sources.is_empty());
    assert_eq!(first_callback.calls(), 1);
    assert_eq!(second_callback.calls(), 1);
}

#[test]
fn test_cancel_all() {
    let (case, entered) = BlockingCase::new();
    let case = Arc::new(case);
    let processor = LogicalReportProcessor::new(case.clone());
    let callback = Arc::new(RecordingCallback::default());

    let a = start(&processor, &callback).unwrap();
    wait_entered(&entered);
    let b = start(&processor, &callback).unwrap();
    wait_entered(&entered);

    assert_eq!(processor.cancel_all(), 2);
    assert_eq!(a.wait().unwrap().status, IngestStatus::Cancelled);
    assert_eq!(b.wait().unwrap().status, IngestStatus::Cancelled);
    assert_eq!(callback.calls(), 2);
    assert_eq!(processor.cancel_all(), 0);
}

#[test]
fn test_handle_cancel_is_idempotent() {
    let (case, _entered) = BlockingCase::new();
    let processor = LogicalReportProcessor::new(Arc::new(case));
    let callback = Arc::new(RecordingCallback::default());

    let handle = start(&processor, &callback).unwrap();
    assert!(handle.cancel());
    assert!(!handle.cancel());

    // Cancelled whether or not the job reached the case layer first.
    let outcome = handle.wait().unwrap();
    assert_eq!(outcome.status, IngestStatus::Cancelled);
    assert_eq!(callback.calls(), 1);
}

#[test]
fn test_single_flight_rejects_second_job() {
    let mut config = ProcessorConfig::default();
    config.dispatch.single_flight = true;
    let (case, entered) = BlockingCase::new();
    let case = Arc::new(case);
    let processor = LogicalReportProcessor::with_config(case.clone(), config);
    let callback = Arc::new(RecordingCallback::default());

    let first = start(&processor, &callback).unwrap();
    wait_entered(&entered);

    match start(&processor, &callback) {
        Err(CellexError::Busy { active }) => assert_eq!(active, first.id()),
        other => panic!("expected Busy, got {:?}", other.map(|h| h.id())),
    }

    case.release();
    assert_eq!(first.wait().unwrap().status, IngestStatus::NoErrors);

    let next = start(&processor, &callback).unwrap();
    assert_eq!(next.wait().unwrap().status, IngestStatus::NoErrors);
    assert_eq!(callback.calls(), 2);
}

#[tokio::test]
async fn test_wait_async_times_out() {
    let (case, _entered) = BlockingCase::new();
    let processor = LogicalReportProcessor::new(Arc::new(case));
    let callback = Arc::new(RecordingCallback::default());

    let handle = start(&processor, &callback).unwrap();
    let result = handle.wait_async(Duration::from_millis(50)).await;
    assert!(matches!(result, Err(CellexError::Timeout { .. })));

    // Let the worker thread wind down.
    assert_eq!(processor.cancel_all(), 1);
}
