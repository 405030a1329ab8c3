// src/engine/job.rs

//! Units of generation work and how they report failure.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use futures::Stream;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Boxed future returned by a started job.
pub type JobFuture = Pin<Box<dyn Future<Output = JobResult> + Send + 'static>>;

pub type JobResult = std::result::Result<(), JobError>;

type JobFn = Box<dyn FnOnce(CancellationToken) -> JobFuture + Send + 'static>;

/// How a job ended, when it did not succeed.
///
/// Anything converted from an ordinary error is [`JobError::Fatal`]: a job
/// has to opt in to being skipped with [`JobError::recoverable`].
#[derive(Debug, Error)]
pub enum JobError {
    /// Log, skip this job, keep the run going.
    #[error("{0:#}")]
    Recoverable(anyhow::Error),

    /// Abort the whole run.
    #[error("{0:#}")]
    Fatal(anyhow::Error),

    /// The job saw the run's cancellation token and stopped early.
    #[error("job cancelled")]
    Cancelled,
}

impl JobError {
    pub fn recoverable(err: impl Into<anyhow::Error>) -> Self {
        JobError::Recoverable(err.into())
    }

    pub fn fatal(err: impl Into<anyhow::Error>) -> Self {
        JobError::Fatal(err.into())
    }
}

impl From<anyhow::Error> for JobError {
    fn from(err: anyhow::Error) -> Self {
        JobError::Fatal(err)
    }
}

impl From<std::io::Error> for JobError {
    fn from(err: std::io::Error) -> Self {
        JobError::Fatal(err.into())
    }
}

/// One independent, idempotent piece of generation work.
///
/// The closure receives the run's cancellation token and is expected to
/// watch it at its own suspension points; the engine never kills a job that
/// has started.
pub struct Job {
    label: String,
    run: JobFn,
}

impl Job {
    pub fn new<F, Fut>(label: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = JobResult> + Send + 'static,
    {
        Self {
            label: label.into(),
            run: Box::new(move |token: CancellationToken| -> JobFuture { Box::pin(f(token)) }),
        }
    }

    /// Human-readable name used in logs and in [`crate::errors::PedigreeError::JobFailed`].
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn start(self, token: CancellationToken) -> (String, JobFuture) {
        (self.label, (self.run)(token))
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Anything the engine can pull jobs from.
///
/// Sources are consumed lazily: the engine only asks for the next job once
/// it holds a free concurrency slot.
pub trait JobSource: Stream<Item = Job> + Send + Unpin {}

impl<S> JobSource for S where S: Stream<Item = Job> + Send + Unpin {}

/// Turn a (lazy) iterator of jobs into a [`JobSource`].
pub fn job_stream<I>(jobs: I) -> futures::stream::Iter<I::IntoIter>
where
    I: IntoIterator<Item = Job>,
{
    futures::stream::iter(jobs)
}
