// src/engine/mod.rs

//! Concurrent generation engine.
//!
//! This module ties together:
//! - [`job`]: the unit of work, its error categories and the lazy job
//!   source abstraction
//! - [`counters`]: the atomic run counters shared by jobs and observers
//! - [`runner`]: the [`TaskEngine`], which runs a job source under a single
//!   shared concurrency limit and handles first-failure cancellation
//! - [`progress`]: the periodic progress reporter that samples the counters
//!   while a run is active

pub mod counters;
pub mod job;
pub mod progress;
pub mod runner;

pub use counters::{JobCounters, ProgressSnapshot};
pub use job::{job_stream, Job, JobError, JobFuture, JobResult, JobSource};
pub use progress::{LogProgressSink, ProgressReporter, ProgressSink, DEFAULT_PROGRESS_INTERVAL};
pub use runner::{RunSummary, TaskEngine, DEFAULT_CONCURRENCY};

pub use tokio_util::sync::CancellationToken;
