// src/plugin/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{PedigreeError, Result};
use crate::extension::{Extension, ExtensionContext, ExtensionFactory, PassiveExtension};
use crate::plugin::{Plugin, PluginDescriptor, PluginId};

/// Read-only lookup of plugins by id.
///
/// The dependency graph builder only needs this, which keeps it independent
/// of how plugins are stored or instantiated.
pub trait PluginLookup {
    fn lookup(&self, id: &str) -> Option<&dyn Plugin>;
}

struct RegisteredPlugin {
    descriptor: PluginDescriptor,
    factory: ExtensionFactory,
}

/// Every plugin known to a project, in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<RegisteredPlugin>,
    index: HashMap<PluginId, usize>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin that only takes part in ordering.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> Result<()> {
        let id = descriptor.id().clone();
        let factory: ExtensionFactory =
            Arc::new(move |_ctx: &ExtensionContext| -> Box<dyn Extension> {
                Box::new(PassiveExtension::new(id.clone()))
            });
        self.register_extension(descriptor, factory)
    }

    /// Register a plugin together with the factory that instantiates its
    /// extension.
    pub fn register_extension(
        &mut self,
        descriptor: PluginDescriptor,
        factory: ExtensionFactory,
    ) -> Result<()> {
        if self.index.contains_key(descriptor.id()) {
            return Err(PedigreeError::DuplicatePlugin(descriptor.id().clone()));
        }

        debug!(plugin = %descriptor.id(), "registering plugin");
        self.index
            .insert(descriptor.id().clone(), self.plugins.len());
        self.plugins.push(RegisteredPlugin {
            descriptor,
            factory,
        });
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PluginDescriptor> {
        self.index.get(id).map(|&i| &self.plugins[i].descriptor)
    }

    pub fn factory(&self, id: &str) -> Option<&ExtensionFactory> {
        self.index.get(id).map(|&i| &self.plugins[i].factory)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &PluginId> {
        self.plugins.iter().map(|p| p.descriptor.id())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl PluginLookup for PluginRegistry {
    fn lookup(&self, id: &str) -> Option<&dyn Plugin> {
        self.get(id).map(|d| d as &dyn Plugin)
    }
}
