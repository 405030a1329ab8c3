// src/engine/counters.rs

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared run counters.
///
/// These are the only state jobs touch concurrently. All updates are single
/// atomic increments/decrements, so readers (the progress reporter, tests)
/// may see a slightly stale but never torn view.
#[derive(Debug, Default)]
pub struct JobCounters {
    scheduled: AtomicUsize,
    completed: AtomicUsize,
    skipped: AtomicUsize,
    cancelled: AtomicUsize,
    failed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl JobCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.scheduled,
            &self.completed,
            &self.skipped,
            &self.cancelled,
            &self.failed,
            &self.in_flight,
            &self.max_in_flight,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }

    pub(crate) fn record_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark a job as running until the returned guard is dropped.
    pub(crate) fn enter(&self) -> InFlightGuard<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlightGuard { counters: self }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            scheduled: self.scheduled.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            cancelled: self.cancelled.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            max_in_flight: self.max_in_flight.load(Ordering::SeqCst),
        }
    }
}

pub(crate) struct InFlightGuard<'a> {
    counters: &'a JobCounters,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Point-in-time copy of [`JobCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Jobs pulled from the source and handed to the pool so far.
    pub scheduled: usize,
    pub completed: usize,
    /// Jobs that failed recoverably and were skipped.
    pub skipped: usize,
    /// Jobs that never ran, or stopped early, because the run was cancelled.
    pub cancelled: usize,
    pub failed: usize,
    pub in_flight: usize,
    /// Highest `in_flight` value observed during the run.
    pub max_in_flight: usize,
}

impl ProgressSnapshot {
    /// Jobs that are done, successfully or skipped.
    pub fn finished(&self) -> usize {
        self.completed + self.skipped
    }

    /// Whole-number percentage of scheduled jobs that are finished.
    ///
    /// An empty run counts as 100% done.
    pub fn percent(&self) -> usize {
        if self.scheduled == 0 {
            return 100;
        }
        self.finished() * 100 / self.scheduled
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}%)",
            self.finished(),
            self.scheduled,
            self.percent()
        )
    }
}
