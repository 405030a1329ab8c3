#![allow(dead_code)]

use std::sync::Mutex;

use pedigree::engine::{ProgressSink, ProgressSnapshot};

/// Progress sink that keeps every snapshot it is given.
#[derive(Debug, Default)]
pub struct RecordingSink {
    samples: Mutex<Vec<ProgressSnapshot>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<ProgressSnapshot> {
        self.samples.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<ProgressSnapshot> {
        self.samples.lock().unwrap().last().copied()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, snapshot: &ProgressSnapshot) -> anyhow::Result<()> {
        self.samples.lock().unwrap().push(*snapshot);
        Ok(())
    }
}

/// Progress sink that always fails.
#[derive(Debug, Default)]
pub struct FailingSink;

impl ProgressSink for FailingSink {
    fn report(&self, _snapshot: &ProgressSnapshot) -> anyhow::Result<()> {
        anyhow::bail!("sink unavailable")
    }
}

/// Progress sink that always panics.
#[derive(Debug, Default)]
pub struct PanickingSink;

impl ProgressSink for PanickingSink {
    fn report(&self, _snapshot: &ProgressSnapshot) -> anyhow::Result<()> {
        panic!("sink exploded")
    }
}
