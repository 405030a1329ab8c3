// src/engine/runner.rs

//! Bounded concurrent execution of a lazy job stream.

use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, StreamExt};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::counters::{JobCounters, ProgressSnapshot};
use crate::engine::job::{Job, JobError, JobSource};
use crate::engine::progress::{
    LogProgressSink, ProgressReporter, ProgressSink, DEFAULT_PROGRESS_INTERVAL,
};
use crate::errors::{PedigreeError, Result};

/// Default cap on simultaneously running jobs.
pub const DEFAULT_CONCURRENCY: usize = 512;

/// Totals for a run that finished without a fatal job failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub scheduled: usize,
    pub completed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub max_in_flight: usize,
}

impl From<ProgressSnapshot> for RunSummary {
    fn from(s: ProgressSnapshot) -> Self {
        Self {
            scheduled: s.scheduled,
            completed: s.completed,
            skipped: s.skipped,
            cancelled: s.cancelled,
            max_in_flight: s.max_in_flight,
        }
    }
}

/// Terminal state of one job, as seen by the engine.
enum JobOutcome {
    Completed,
    Skipped(anyhow::Error),
    Cancelled,
    Failed(anyhow::Error),
}

struct FinishedJob {
    label: String,
    outcome: JobOutcome,
}

/// Runs jobs from a [`JobSource`] with at most `concurrency_limit` of them
/// in flight at any time.
///
/// - Jobs are pulled one at a time, only after a slot has been acquired, so
///   memory use follows the cap rather than the total job count.
/// - Completions are reaped while the source is still being enumerated.
/// - The first fatal failure stops enumeration, cancels the run token,
///   waits for every started job to finish, and is returned as
///   [`PedigreeError::JobFailed`].
///
/// An engine is meant for one run at a time; its counters are reset when a
/// run starts.
#[derive(Debug, Clone)]
pub struct TaskEngine {
    concurrency_limit: usize,
    counters: Arc<JobCounters>,
    progress_interval: Duration,
    progress_sink: Arc<dyn ProgressSink>,
}

impl Default for TaskEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl TaskEngine {
    pub fn new(concurrency_limit: usize) -> Self {
        if concurrency_limit == 0 {
            warn!("concurrency limit of 0 requested; using 1");
        }

        Self {
            concurrency_limit: concurrency_limit.max(1),
            counters: Arc::new(JobCounters::new()),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            progress_sink: Arc::new(LogProgressSink),
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_sink = sink;
        self
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Live counters of the current (or most recent) run.
    pub fn counters(&self) -> Arc<JobCounters> {
        Arc::clone(&self.counters)
    }

    /// Run every job the source yields.
    ///
    /// `cancel` is the caller's scope: cancelling it stops the run the same
    /// way a fatal job failure does, and the run then ends with
    /// [`PedigreeError::Cancelled`].
    ///
    /// Returns only once every job that was handed to the pool has finished,
    /// been skipped, or been cancelled.
    pub async fn run<S>(&self, mut source: S, cancel: &CancellationToken) -> Result<RunSummary>
    where
        S: JobSource,
    {
        self.counters.reset();

        let token = cancel.child_token();
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut pool: JoinSet<FinishedJob> = JoinSet::new();

        let progress_token = token.child_token();
        let reporter = ProgressReporter::new(
            self.counters(),
            Arc::clone(&self.progress_sink),
            self.progress_interval,
        )
        .spawn(progress_token.clone());
        // Stops the reporter even if this future is dropped mid-run.
        let _reporter_guard = progress_token.clone().drop_guard();

        info!(concurrency = self.concurrency_limit, "starting job run");

        let mut permit: Option<OwnedSemaphorePermit> = None;
        let mut source_done = false;
        let mut failure: Option<(String, anyhow::Error)> = None;

        loop {
            if source_done && pool.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    debug!("run token cancelled; no longer pulling jobs");
                    break;
                }

                Some(joined) = pool.join_next(), if !pool.is_empty() => {
                    if let Some(failed) = self.settle(joined) {
                        failure = Some(failed);
                        token.cancel();
                        break;
                    }
                }

                acquired = Arc::clone(&semaphore).acquire_owned(), if permit.is_none() && !source_done => {
                    match acquired {
                        Ok(p) => permit = Some(p),
                        Err(_) => {
                            // The semaphore is never closed while the run is alive.
                            error!("concurrency limiter closed unexpectedly");
                            token.cancel();
                            break;
                        }
                    }
                }

                next = source.next(), if permit.is_some() && !source_done => {
                    match next {
                        Some(job) => {
                            if let Some(slot) = permit.take() {
                                self.submit(&mut pool, job, slot, &token);
                            }
                        }
                        None => {
                            debug!("job source exhausted");
                            source_done = true;
                            permit = None;
                        }
                    }
                }
            }
        }

        drop(permit);
        drop(source);

        if !pool.is_empty() {
            debug!(in_flight = pool.len(), "draining in-flight jobs");
        }
        while let Some(joined) = pool.join_next().await {
            if let Some((label, err)) = self.settle(joined) {
                if failure.is_none() {
                    failure = Some((label, err));
                } else {
                    debug!(job = %label, error = %format!("{err:#}"), "further job failure while draining");
                }
            }
        }

        progress_token.cancel();
        if let Err(err) = reporter.await {
            debug!(error = %err, "progress reporter ended abnormally");
        }

        let snapshot = self.counters.snapshot();

        if let Some((job, cause)) = failure {
            error!(
                job = %job,
                completed = snapshot.completed,
                scheduled = snapshot.scheduled,
                "job run aborted"
            );
            return Err(PedigreeError::JobFailed { job, cause });
        }

        if cancel.is_cancelled() && (!source_done || snapshot.cancelled > 0) {
            warn!(
                completed = snapshot.completed,
                scheduled = snapshot.scheduled,
                "job run cancelled"
            );
            return Err(PedigreeError::Cancelled);
        }

        info!(
            completed = snapshot.completed,
            skipped = snapshot.skipped,
            scheduled = snapshot.scheduled,
            "job run finished"
        );
        Ok(snapshot.into())
    }

    /// Hand a job to the pool. The permit travels with the job and is
    /// released when it finishes.
    fn submit(
        &self,
        pool: &mut JoinSet<FinishedJob>,
        job: Job,
        permit: OwnedSemaphorePermit,
        token: &CancellationToken,
    ) {
        self.counters.record_scheduled();

        let counters = self.counters();
        let token = token.clone();

        pool.spawn(async move {
            let _permit = permit;

            if token.is_cancelled() {
                counters.record_cancelled();
                return FinishedJob {
                    label: job.label().to_string(),
                    outcome: JobOutcome::Cancelled,
                };
            }

            let (label, fut) = job.start(token);

            let result = {
                let _running = counters.enter();
                std::panic::AssertUnwindSafe(fut).catch_unwind().await
            };

            let outcome = match result {
                Ok(Ok(())) => {
                    counters.record_completed();
                    JobOutcome::Completed
                }
                Ok(Err(JobError::Recoverable(err))) => {
                    counters.record_skipped();
                    JobOutcome::Skipped(err)
                }
                Ok(Err(JobError::Cancelled)) => {
                    counters.record_cancelled();
                    JobOutcome::Cancelled
                }
                Ok(Err(JobError::Fatal(err))) => {
                    counters.record_failed();
                    JobOutcome::Failed(err)
                }
                Err(panic) => {
                    counters.record_failed();
                    JobOutcome::Failed(anyhow::anyhow!("job panicked: {}", panic_message(&*panic)))
                }
            };

            FinishedJob { label, outcome }
        });
    }

    /// Log a finished job; returns the failure if it must abort the run.
    fn settle(
        &self,
        joined: std::result::Result<FinishedJob, JoinError>,
    ) -> Option<(String, anyhow::Error)> {
        let finished = match joined {
            Ok(finished) => finished,
            Err(err) => {
                self.counters.record_failed();
                return Some((
                    "<unknown>".to_string(),
                    anyhow::anyhow!("job task ended abnormally: {err}"),
                ));
            }
        };

        match finished.outcome {
            JobOutcome::Completed => {
                debug!(job = %finished.label, "job completed");
                None
            }
            JobOutcome::Skipped(err) => {
                warn!(job = %finished.label, error = %format!("{err:#}"), "job failed recoverably; skipping");
                None
            }
            JobOutcome::Cancelled => {
                debug!(job = %finished.label, "job cancelled");
                None
            }
            JobOutcome::Failed(err) => {
                error!(job = %finished.label, error = %format!("{err:#}"), "job failed");
                Some((finished.label, err))
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
