#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pedigree::engine::{Job, JobError};

/// Observes how many tracker jobs run at the same time.
#[derive(Debug, Default)]
pub struct ConcurrencyTracker {
    current: AtomicUsize,
    max: AtomicUsize,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl ConcurrencyTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn max_observed(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn running(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// A job that holds a slot for `hold`, then succeeds.
    pub fn job(self: &Arc<Self>, label: impl Into<String>, hold: Duration) -> Job {
        let tracker = Arc::clone(self);
        Job::new(label, move |_token| async move {
            tracker.enter();
            tokio::time::sleep(hold).await;
            tracker.leave();
            Ok(())
        })
    }

    /// Like [`ConcurrencyTracker::job`], but stops early with
    /// `JobError::Cancelled` once the run is cancelled.
    pub fn cancellable_job(self: &Arc<Self>, label: impl Into<String>, hold: Duration) -> Job {
        let tracker = Arc::clone(self);
        Job::new(label, move |token| async move {
            tracker.enter();
            let result = tokio::select! {
                _ = token.cancelled() => Err(JobError::Cancelled),
                _ = tokio::time::sleep(hold) => Ok(()),
            };
            tracker.leave();
            result
        })
    }

    fn enter(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

/// A job that fails fatally after `delay`.
pub fn fatal_job(label: impl Into<String>, delay: Duration) -> Job {
    let label = label.into();
    let message = format!("{label} exploded");
    Job::new(label, move |_token| async move {
        tokio::time::sleep(delay).await;
        Err(JobError::fatal(anyhow::anyhow!(message)))
    })
}

/// A job that fails recoverably right away.
pub fn recoverable_job(label: impl Into<String>) -> Job {
    Job::new(label, |_token| async move {
        Err(JobError::recoverable(anyhow::anyhow!("nothing to do here")))
    })
}

/// A job that panics right away.
pub fn panicking_job(label: impl Into<String>) -> Job {
    Job::new(label, |_token| async move {
        if true {
            panic!("job blew up");
        }
        Ok(())
    })
}
