// tests/engine_concurrency.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pedigree::engine::{job_stream, CancellationToken, Job, TaskEngine};
use pedigree::errors::PedigreeError;
use pedigree_test_utils::tracked_jobs::{
    fatal_job, panicking_job, recoverable_job, ConcurrencyTracker,
};
use pedigree_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn never_exceeds_the_concurrency_cap() {
    init_tracing();

    let tracker = ConcurrencyTracker::new();
    let jobs: Vec<Job> = (0..200)
        .map(|i| tracker.job(format!("job-{i}"), Duration::from_millis(2)))
        .collect();

    let engine = TaskEngine::new(8);
    let summary = with_timeout(engine.run(job_stream(jobs), &CancellationToken::new()))
        .await
        .unwrap();

    assert_eq!(summary.scheduled, 200);
    assert_eq!(summary.completed, 200);
    assert_eq!(summary.skipped, 0);
    assert!(tracker.max_observed() <= 8, "observed {}", tracker.max_observed());
    assert!(summary.max_in_flight <= 8);
    assert!(summary.max_in_flight >= 1);
    assert_eq!(tracker.finished(), 200);
}

#[tokio::test]
async fn first_fatal_failure_aborts_the_run_and_drains_in_flight_jobs() {
    init_tracing();

    let tracker = ConcurrencyTracker::new();
    let jobs: Vec<Job> = (0..1000)
        .map(|i| {
            if i == 500 {
                fatal_job("job-500", Duration::from_millis(1))
            } else {
                tracker.job(format!("job-{i}"), Duration::from_millis(5))
            }
        })
        .collect();

    let engine = TaskEngine::new(50);
    let err = with_timeout(engine.run(job_stream(jobs), &CancellationToken::new()))
        .await
        .unwrap_err();

    match &err {
        PedigreeError::JobFailed { job, cause } => {
            assert_eq!(job, "job-500");
            assert!(format!("{cause:#}").contains("job-500 exploded"));
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }

    let snapshot = engine.counters().snapshot();
    assert!(snapshot.completed < 1000);
    assert_eq!(snapshot.failed, 1);
    assert_eq!(snapshot.in_flight, 0);
    assert!(snapshot.max_in_flight <= 50);

    // Every job that started also finished before run() returned.
    assert_eq!(tracker.running(), 0);
    assert_eq!(tracker.started(), tracker.finished());
    // Nothing was pulled past the failure by more than one window.
    assert!(snapshot.scheduled < 1000);
}

#[tokio::test]
async fn recoverable_failures_are_skipped() {
    init_tracing();

    let tracker = ConcurrencyTracker::new();
    let mut jobs = Vec::new();
    for i in 0..10 {
        if i % 3 == 0 {
            jobs.push(recoverable_job(format!("skip-{i}")));
        } else {
            jobs.push(tracker.job(format!("job-{i}"), Duration::from_millis(1)));
        }
    }

    let summary = TaskEngine::new(4)
        .run(job_stream(jobs), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.scheduled, 10);
    assert_eq!(summary.skipped, 4);
    assert_eq!(summary.completed, 6);
}

#[tokio::test]
async fn a_panicking_job_is_a_fatal_failure() {
    init_tracing();

    let jobs = vec![panicking_job("boom")];

    let err = TaskEngine::new(2)
        .run(job_stream(jobs), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        PedigreeError::JobFailed { job, cause } => {
            assert_eq!(job, "boom");
            assert!(cause.to_string().contains("panicked"));
            assert!(cause.to_string().contains("job blew up"));
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn external_cancellation_stops_the_run() {
    init_tracing();

    let tracker = ConcurrencyTracker::new();
    let jobs: Vec<Job> = (0..100)
        .map(|i| tracker.cancellable_job(format!("job-{i}"), Duration::from_secs(30)))
        .collect();

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });
    }

    let engine = TaskEngine::new(4);
    let err = with_timeout(engine.run(job_stream(jobs), &cancel))
        .await
        .unwrap_err();

    assert!(matches!(err, PedigreeError::Cancelled), "got {err:?}");
    let snapshot = engine.counters().snapshot();
    assert_eq!(snapshot.in_flight, 0);
    assert_eq!(snapshot.completed, 0);
    assert!(snapshot.scheduled <= 4);
    assert!(tracker.started() <= 4);
    assert_eq!(tracker.started(), tracker.finished());
}

#[tokio::test]
async fn a_cancelled_token_runs_nothing() {
    let tracker = ConcurrencyTracker::new();
    let jobs: Vec<Job> = (0..10)
        .map(|i| tracker.job(format!("job-{i}"), Duration::from_millis(1)))
        .collect();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = TaskEngine::new(4)
        .run(job_stream(jobs), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PedigreeError::Cancelled));
    assert_eq!(tracker.started(), 0);
}

#[tokio::test]
async fn the_source_is_consumed_lazily() {
    init_tracing();

    // An endless source only terminates because of cancellation; the number
    // of jobs pulled stays bounded by what actually ran.
    let pulled = Arc::new(AtomicUsize::new(0));
    let tracker = ConcurrencyTracker::new();
    let source = {
        let pulled = Arc::clone(&pulled);
        let tracker = Arc::clone(&tracker);
        std::iter::repeat_with(move || {
            let n = pulled.fetch_add(1, Ordering::SeqCst);
            tracker.job(format!("job-{n}"), Duration::from_millis(20))
        })
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });
    }

    let engine = TaskEngine::new(2);
    let err = with_timeout(engine.run(job_stream(source), &cancel))
        .await
        .unwrap_err();

    assert!(matches!(err, PedigreeError::Cancelled));
    let snapshot = engine.counters().snapshot();
    assert_eq!(pulled.load(Ordering::SeqCst), snapshot.scheduled);
    assert!(snapshot.scheduled < 50, "pulled {}", snapshot.scheduled);
}

#[tokio::test]
async fn pulls_stop_shortly_after_a_failure() {
    let pulled = Arc::new(AtomicUsize::new(0));
    let tracker = ConcurrencyTracker::new();
    let source = {
        let pulled = Arc::clone(&pulled);
        let tracker = Arc::clone(&tracker);
        (0..1000).map(move |i| {
            pulled.fetch_add(1, Ordering::SeqCst);
            if i == 0 {
                fatal_job("first", Duration::ZERO)
            } else {
                tracker.job(format!("job-{i}"), Duration::from_millis(200))
            }
        })
    };

    let err = with_timeout(TaskEngine::new(2).run(job_stream(source), &CancellationToken::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, PedigreeError::JobFailed { ref job, .. } if job == "first"));
    assert!(pulled.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn an_empty_source_finishes_immediately() {
    let summary = TaskEngine::new(3)
        .run(job_stream(Vec::<Job>::new()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.scheduled, 0);
    assert_eq!(summary.completed, 0);
    assert_eq!(summary.max_in_flight, 0);
}

#[tokio::test]
async fn a_zero_limit_is_clamped_to_one() {
    let tracker = ConcurrencyTracker::new();
    let jobs: Vec<Job> = (0..5)
        .map(|i| tracker.job(format!("job-{i}"), Duration::from_millis(2)))
        .collect();

    let engine = TaskEngine::new(0);
    assert_eq!(engine.concurrency_limit(), 1);

    let summary = engine
        .run(job_stream(jobs), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.completed, 5);
    assert_eq!(tracker.max_observed(), 1);
}

#[tokio::test]
async fn counters_are_reset_between_runs() {
    let engine = TaskEngine::new(2);
    let tracker = ConcurrencyTracker::new();

    for _ in 0..2 {
        let jobs: Vec<Job> = (0..3)
            .map(|i| tracker.job(format!("job-{i}"), Duration::from_millis(1)))
            .collect();
        let summary = engine
            .run(job_stream(jobs), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary.completed, 3);
    }
}
