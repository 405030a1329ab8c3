// src/extension/mod.rs

//! Instantiated plugins.
//!
//! A [`crate::plugin::PluginDescriptor`] only describes ordering; an
//! [`Extension`] is what a selected plugin turns into for a single run. The
//! resolved [`crate::dag::Batches`] become [`Extensions`], which dispatch
//! site events batch by batch (`dispatch.rs`).

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::config::ProjectConfig;
use crate::dag::Batches;
use crate::engine::CancellationToken;
use crate::errors::{PedigreeError, Result};
use crate::fs::ArtifactWriter;
use crate::plugin::{PluginId, PluginRegistry};

pub mod dispatch;
pub mod nginx;

pub use dispatch::EventDispatcher;
pub use nginx::NginxExtension;

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Builds an extension for one run.
pub type ExtensionFactory = Arc<dyn Fn(&ExtensionContext) -> Box<dyn Extension> + Send + Sync>;

/// Events extensions may react to.
#[derive(Debug, Clone)]
pub enum SiteEvent {
    /// The site is being generated. Extensions write their own artifacts
    /// through `writer` and should stop early once `cancel` fires.
    GenerateSite {
        writer: Arc<dyn ArtifactWriter>,
        cancel: CancellationToken,
    },
}

/// What a factory gets to build an extension from.
#[derive(Debug, Clone)]
pub struct ExtensionContext {
    pub project: Arc<ProjectConfig>,

    /// The plugin's `[plugin.<id>]` table, minus `enabled`.
    pub options: toml::Table,
}

pub trait Extension: Send + Sync + Debug {
    fn plugin_id(&self) -> &PluginId;

    /// React to an event. The default ignores it.
    fn handle<'a>(&'a self, event: &'a SiteEvent) -> HandlerFuture<'a> {
        let _ = event;
        Box::pin(async { Ok(()) })
    }
}

/// Extension for plugins that only take part in ordering.
#[derive(Debug, Clone)]
pub struct PassiveExtension {
    plugin_id: PluginId,
}

impl PassiveExtension {
    pub fn new(plugin_id: PluginId) -> Self {
        Self { plugin_id }
    }
}

impl Extension for PassiveExtension {
    fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    fn handle<'a>(&'a self, event: &'a SiteEvent) -> HandlerFuture<'a> {
        Box::pin(async move {
            match event {
                SiteEvent::GenerateSite { .. } => {
                    debug!(plugin = %self.plugin_id, "extension has nothing to generate");
                }
            }
            Ok(())
        })
    }
}

/// The extensions of one run, grouped in resolved batches.
#[derive(Debug, Default)]
pub struct Extensions {
    batches: Vec<Vec<Box<dyn Extension>>>,
}

impl Extensions {
    /// Instantiate every plugin in `batches`, keeping the batch layout.
    pub fn instantiate(
        batches: &Batches,
        registry: &PluginRegistry,
        project: Arc<ProjectConfig>,
    ) -> Result<Self> {
        let mut out = Vec::with_capacity(batches.len());
        for batch in batches.iter() {
            let mut instances = Vec::with_capacity(batch.len());
            for id in batch {
                let factory = registry.factory(id.as_str()).ok_or_else(|| {
                    PedigreeError::UnknownPlugin {
                        plugin_id: id.to_string(),
                    }
                })?;
                let ctx = ExtensionContext {
                    project: Arc::clone(&project),
                    options: project.plugin_options(id.as_str()).cloned().unwrap_or_default(),
                };
                instances.push(factory(&ctx));
            }
            out.push(instances);
        }
        Ok(Self { batches: out })
    }

    pub fn batches(&self) -> impl Iterator<Item = &[Box<dyn Extension>]> {
        self.batches.iter().map(|b| b.as_slice())
    }

    /// All extensions in batch order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Extension> {
        self.batches.iter().flatten().map(|e| e.as_ref())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Extension> {
        self.iter().find(|e| e.plugin_id().as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
