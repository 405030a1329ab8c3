// src/extension/dispatch.rs

use anyhow::Context;
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::extension::{Extensions, SiteEvent};

/// Sends events to a run's extensions.
///
/// Batches are handled strictly one after another; the handlers inside a
/// batch run concurrently. The first failing handler aborts the dispatch.
#[derive(Debug, Clone, Copy)]
pub struct EventDispatcher<'a> {
    extensions: &'a Extensions,
}

impl<'a> EventDispatcher<'a> {
    pub fn new(extensions: &'a Extensions) -> Self {
        Self { extensions }
    }

    pub async fn dispatch(&self, event: &SiteEvent) -> anyhow::Result<()> {
        for (index, batch) in self.extensions.batches().enumerate() {
            debug!(batch = index, size = batch.len(), "dispatching event to batch");
            try_join_all(batch.iter().map(|extension| async move {
                extension
                    .handle(event)
                    .await
                    .with_context(|| format!("extension '{}' failed", extension.plugin_id()))
            }))
            .await?;
        }
        info!(extensions = self.extensions.len(), "dispatched site event");
        Ok(())
    }
}

impl Extensions {
    pub fn dispatcher(&self) -> EventDispatcher<'_> {
        EventDispatcher::new(self)
    }
}
