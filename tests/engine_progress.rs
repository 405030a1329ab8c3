// tests/engine_progress.rs

use std::sync::Arc;
use std::time::Duration;

use pedigree::engine::{job_stream, CancellationToken, Job, ProgressSnapshot, TaskEngine};
use pedigree_test_utils::tracked_jobs::ConcurrencyTracker;
use pedigree_test_utils::recording_sink::{FailingSink, PanickingSink, RecordingSink};
use pedigree_test_utils::{init_tracing, with_timeout};

fn tracked_jobs(tracker: &Arc<ConcurrencyTracker>, n: usize, hold: Duration) -> Vec<Job> {
    (0..n)
        .map(|i| tracker.job(format!("job-{i}"), hold))
        .collect()
}

#[tokio::test]
async fn reports_progress_and_a_final_sample() {
    init_tracing();

    let sink = Arc::new(RecordingSink::new());
    let tracker = ConcurrencyTracker::new();
    let engine = TaskEngine::new(2)
        .with_progress_interval(Duration::from_millis(10))
        .with_progress_sink(sink.clone());

    let summary = with_timeout(engine.run(
        job_stream(tracked_jobs(&tracker, 40, Duration::from_millis(5))),
        &CancellationToken::new(),
    ))
    .await
    .unwrap();
    assert_eq!(summary.completed, 40);

    let samples = sink.samples();
    assert!(samples.len() >= 2, "only {} samples", samples.len());

    let last = sink.last().unwrap();
    assert_eq!(last.finished(), 40);
    assert_eq!(last.scheduled, 40);
    assert_eq!(last.percent(), 100);

    for pair in samples.windows(2) {
        assert!(pair[0].finished() <= pair[1].finished());
        assert!(pair[0].scheduled <= pair[1].scheduled);
    }
    for sample in &samples {
        assert!(sample.finished() <= sample.scheduled);
    }
}

#[tokio::test]
async fn a_failing_sink_does_not_affect_the_run() {
    init_tracing();

    let tracker = ConcurrencyTracker::new();
    let engine = TaskEngine::new(4)
        .with_progress_interval(Duration::from_millis(1))
        .with_progress_sink(Arc::new(FailingSink));

    let summary = with_timeout(engine.run(
        job_stream(tracked_jobs(&tracker, 30, Duration::from_millis(2))),
        &CancellationToken::new(),
    ))
    .await
    .unwrap();

    assert_eq!(summary.completed, 30);
}

#[tokio::test]
async fn a_panicking_sink_does_not_affect_the_run() {
    init_tracing();

    let tracker = ConcurrencyTracker::new();
    let engine = TaskEngine::new(4)
        .with_progress_interval(Duration::from_millis(1))
        .with_progress_sink(Arc::new(PanickingSink));

    let summary = with_timeout(engine.run(
        job_stream(tracked_jobs(&tracker, 30, Duration::from_millis(2))),
        &CancellationToken::new(),
    ))
    .await
    .unwrap();

    assert_eq!(summary.completed, 30);
}

#[test]
fn percent_is_a_whole_number_of_finished_jobs() {
    let snapshot = ProgressSnapshot {
        scheduled: 200,
        completed: 45,
        skipped: 5,
        ..Default::default()
    };
    assert_eq!(snapshot.finished(), 50);
    assert_eq!(snapshot.percent(), 25);
    assert_eq!(snapshot.to_string(), "50/200 (25%)");

    let thirds = ProgressSnapshot {
        scheduled: 3,
        completed: 1,
        ..Default::default()
    };
    assert_eq!(thirds.percent(), 33);
}

#[test]
fn an_empty_run_is_fully_done() {
    let snapshot = ProgressSnapshot::default();
    assert_eq!(snapshot.percent(), 100);
}

#[tokio::test]
async fn dropping_the_run_stops_the_reporter() {
    init_tracing();

    let sink = Arc::new(RecordingSink::new());
    let tracker = ConcurrencyTracker::new();
    let engine = TaskEngine::new(1)
        .with_progress_interval(Duration::from_millis(10))
        .with_progress_sink(sink.clone());

    let cancel = CancellationToken::new();
    let run = engine.run(
        job_stream(vec![tracker.job("hangs", Duration::from_secs(60))]),
        &cancel,
    );
    let timed_out = tokio::time::timeout(Duration::from_millis(50), run).await;
    assert!(timed_out.is_err());

    // Let the reporter observe the drop and emit its final sample.
    tokio::time::sleep(Duration::from_millis(30)).await;
    let settled = sink.samples().len();
    assert!(settled > 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.samples().len(), settled);
}
