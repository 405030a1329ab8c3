// src/engine/progress.rs

//! Periodic, best-effort progress reporting.
//!
//! The reporter only reads [`JobCounters`]. It runs in its own Tokio task
//! under the run's cancellation scope, and anything that goes wrong while
//! reporting is logged at debug level and dropped.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::counters::{JobCounters, ProgressSnapshot};

/// How often progress is reported during a run.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Where progress lines go.
pub trait ProgressSink: Send + Sync + fmt::Debug {
    fn report(&self, snapshot: &ProgressSnapshot) -> anyhow::Result<()>;
}

/// Default sink: one `info` line per sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn report(&self, snapshot: &ProgressSnapshot) -> anyhow::Result<()> {
        info!(
            completed = snapshot.finished(),
            total = snapshot.scheduled,
            "Generated {} out of {} items ({}%).",
            snapshot.finished(),
            snapshot.scheduled,
            snapshot.percent()
        );
        Ok(())
    }
}

#[derive(Debug)]
pub struct ProgressReporter {
    counters: Arc<JobCounters>,
    sink: Arc<dyn ProgressSink>,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(counters: Arc<JobCounters>, sink: Arc<dyn ProgressSink>, interval: Duration) -> Self {
        Self {
            counters,
            sink,
            interval,
        }
    }

    /// Start reporting in the background until `token` is cancelled.
    ///
    /// One last sample is emitted after cancellation so the final counts
    /// always make it to the sink.
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(token).await;
        })
    }

    async fn run(self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => self.emit(),
            }
        }

        self.emit();
        debug!("progress reporter stopped");
    }

    fn emit(&self) {
        let snapshot = self.counters.snapshot();
        match catch_unwind(AssertUnwindSafe(|| self.sink.report(&snapshot))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                debug!(error = %err, "progress sink failed; dropping sample");
            }
            Err(_) => {
                debug!("progress sink panicked; dropping sample");
            }
        }
    }
}
