#![allow(dead_code)]

use std::path::PathBuf;

use pedigree::config::{EntityTypeConfig, ProjectConfig, RawProjectConfig};
use pedigree::generate::{Entity, InMemoryAncestry};
use pedigree::plugin::{PluginDescriptor, PluginRegistry};

/// Builder for `ProjectConfig` to simplify test setup.
pub struct ProjectConfigBuilder {
    config: RawProjectConfig,
}

impl ProjectConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawProjectConfig::default(),
        }
    }

    pub fn output_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.project.output_directory = path.into();
        self
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.config.project.base_url = url.to_string();
        self
    }

    pub fn root_path(mut self, path: &str) -> Self {
        self.config.project.root_path = path.to_string();
        self
    }

    pub fn locales(mut self, locales: &[&str]) -> Self {
        self.config.project.locales = locales.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.project.concurrency = n;
        self
    }

    pub fn logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.project.logo = Some(path.into());
        self
    }

    pub fn assets_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.project.assets_directory = Some(path.into());
        self
    }

    pub fn html_list(mut self, entity_type: &str) -> Self {
        self.config.entity_type.insert(
            entity_type.to_string(),
            EntityTypeConfig {
                generate_html_list: true,
            },
        );
        self
    }

    pub fn with_plugin(mut self, id: &str) -> Self {
        self.config.plugin_entry(id);
        self
    }

    pub fn with_plugin_option(mut self, id: &str, key: &str, value: toml::Value) -> Self {
        self.config
            .plugin_entry(id)
            .options
            .insert(key.to_string(), value);
        self
    }

    pub fn raw(self) -> RawProjectConfig {
        self.config
    }

    pub fn build(self) -> ProjectConfig {
        ProjectConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ProjectConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `PluginRegistry` of ordering-only plugins.
pub struct RegistryBuilder {
    registry: PluginRegistry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: PluginRegistry::new(),
        }
    }

    pub fn plugin(self, id: &str) -> Self {
        self.plugin_with(id, &[], &[], &[])
    }

    pub fn depends_on(self, id: &str, deps: &[&str]) -> Self {
        self.plugin_with(id, deps, &[], &[])
    }

    pub fn plugin_with(
        mut self,
        id: &str,
        depends_on: &[&str],
        comes_before: &[&str],
        comes_after: &[&str],
    ) -> Self {
        let descriptor = PluginDescriptor::new(id)
            .and_then(|d| d.with_depends_on(depends_on.iter().copied()))
            .and_then(|d| d.with_comes_before(comes_before.iter().copied()))
            .and_then(|d| d.with_comes_after(comes_after.iter().copied()))
            .expect("invalid plugin id in test registry");
        self.registry
            .register(descriptor)
            .expect("duplicate plugin in test registry");
        self
    }

    pub fn build(self) -> PluginRegistry {
        self.registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A small ancestry: two public people, one private person, one person
/// with a non-persistent id, and one place.
pub fn sample_ancestry() -> InMemoryAncestry {
    let mut ancestry = InMemoryAncestry::new();
    ancestry
        .add("person", Entity::new("I0001").with_label("Jane Doe"))
        .add("person", Entity::new("I0002").with_label("John Doe"))
        .add("person", Entity::new("I0003").with_private(true))
        .add("person", Entity::new("generated-1").with_persistent(false))
        .add("place", Entity::new("P0001").with_label("Amsterdam"));
    ancestry
}
