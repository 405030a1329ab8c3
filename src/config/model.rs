// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::engine::DEFAULT_CONCURRENCY;
use crate::plugin::PluginId;

/// Project configuration exactly as read from TOML.
///
/// ```toml
/// [project]
/// output_directory = "output"
/// base_url = "https://example.com"
/// locales = ["en-US", "nl-NL"]
/// concurrency = 512
/// logo = "logo.png"
/// assets_directory = "assets"
///
/// [entity_type.person]
/// generate_html_list = true
///
/// [plugin.maps]
///
/// [plugin.nginx]
/// enabled = false
/// ```
///
/// All sections are optional. Use [`ProjectConfig::try_from`] to validate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProjectConfig {
    #[serde(default)]
    pub project: ProjectSection,

    /// Per entity type settings, keyed by entity type id.
    #[serde(default)]
    pub entity_type: BTreeMap<String, EntityTypeConfig>,

    /// Plugin selection, in the order the `[plugin.<id>]` tables appear.
    ///
    /// A `[plugin.<id>]` table selects the plugin unless it sets
    /// `enabled = false`. Any other keys are handed to the plugin.
    #[serde(default, deserialize_with = "deserialize_plugins")]
    pub plugin: Vec<(String, PluginConfig)>,
}

impl RawProjectConfig {
    /// Settings of plugin `id`, added (enabled, no options) if absent.
    pub fn plugin_entry(&mut self, id: &str) -> &mut PluginConfig {
        let index = match self.plugin.iter().position(|(existing, _)| existing == id) {
            Some(index) => index,
            None => {
                self.plugin.push((id.to_string(), PluginConfig::default()));
                self.plugin.len() - 1
            }
        };
        &mut self.plugin[index].1
    }
}

fn deserialize_plugins<'de, D>(deserializer: D) -> Result<Vec<(String, PluginConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    let table = toml::Table::deserialize(deserializer)?;
    let mut plugins = Vec::with_capacity(table.len());
    for (id, value) in table {
        let cfg: PluginConfig = value
            .try_into()
            .map_err(|e| <D::Error as de::Error>::custom(format!("[plugin.{}]: {}", id, e)))?;
        plugins.push((id, cfg));
    }
    Ok(plugins)
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Where the site is generated. Relative paths are resolved against the
    /// directory containing the config file.
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path prefix under `base_url`, e.g. `"family"` for
    /// `https://example.com/family/`.
    #[serde(default)]
    pub root_path: String,

    /// Locales to generate. The first one is the default locale.
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,

    /// Maximum number of generation jobs running at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Image used as the site's favicon.
    #[serde(default)]
    pub logo: Option<PathBuf>,

    /// Public files copied into the site: `public/static/` once, and
    /// `public/localized/` once per locale.
    #[serde(default)]
    pub assets_directory: Option<PathBuf>,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_base_url() -> String {
    "https://example.com".to_string()
}

fn default_locales() -> Vec<String> {
    vec!["en-US".to_string()]
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            base_url: default_base_url(),
            root_path: String::new(),
            locales: default_locales(),
            concurrency: default_concurrency(),
            logo: None,
            assets_directory: None,
        }
    }
}

/// `[entity_type.<id>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityTypeConfig {
    /// Generate a per-locale HTML listing page for this entity type.
    #[serde(default)]
    pub generate_html_list: bool,
}

/// `[plugin.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(flatten)]
    pub options: toml::Table,
}

fn default_enabled() -> bool {
    true
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            options: toml::Table::new(),
        }
    }
}

/// Validated project configuration.
///
/// Only constructible through [`ProjectConfig::try_from`] (or the loader),
/// so holders can rely on:
/// - at least one locale, no duplicates
/// - `concurrency >= 1`
/// - a non-empty `http(s)` base URL
/// - valid plugin and entity type ids
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    project: ProjectSection,
    entity_types: BTreeMap<String, EntityTypeConfig>,
    plugins: Vec<(PluginId, PluginConfig)>,
}

impl ProjectConfig {
    pub(crate) fn new_unchecked(
        project: ProjectSection,
        entity_types: BTreeMap<String, EntityTypeConfig>,
        plugins: Vec<(PluginId, PluginConfig)>,
    ) -> Self {
        Self {
            project,
            entity_types,
            plugins,
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.project.output_directory
    }

    /// Root of the public web files.
    pub fn www_directory(&self) -> PathBuf {
        self.project.output_directory.join("www")
    }

    pub fn base_url(&self) -> &str {
        self.project.base_url.trim_end_matches('/')
    }

    pub fn root_path(&self) -> &str {
        self.project.root_path.trim_matches('/')
    }

    pub fn locales(&self) -> &[String] {
        &self.project.locales
    }

    pub fn default_locale(&self) -> &str {
        &self.project.locales[0]
    }

    pub fn is_multilingual(&self) -> bool {
        self.project.locales.len() > 1
    }

    /// Path prefix (relative to the www directory) for localized artifacts.
    ///
    /// Single-locale sites are not prefixed.
    pub fn locale_prefix(&self, locale: &str) -> PathBuf {
        if self.is_multilingual() {
            PathBuf::from(locale)
        } else {
            PathBuf::new()
        }
    }

    pub fn concurrency(&self) -> usize {
        self.project.concurrency
    }

    pub fn logo(&self) -> Option<&Path> {
        self.project.logo.as_deref()
    }

    pub fn assets_directory(&self) -> Option<&Path> {
        self.project.assets_directory.as_deref()
    }

    pub fn entity_type(&self, id: &str) -> Option<&EntityTypeConfig> {
        self.entity_types.get(id)
    }

    pub fn generates_html_list(&self, entity_type: &str) -> bool {
        self.entity_types
            .get(entity_type)
            .is_some_and(|c| c.generate_html_list)
    }

    /// Enabled plugins, in configuration order.
    pub fn selected_plugins(&self) -> Vec<PluginId> {
        self.plugins
            .iter()
            .filter(|(_, cfg)| cfg.enabled)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn plugin_options(&self, id: &str) -> Option<&toml::Table> {
        self.plugins
            .iter()
            .find(|(plugin_id, _)| plugin_id.as_str() == id)
            .map(|(_, cfg)| &cfg.options)
    }

    /// Override the concurrency limit (e.g. from the command line).
    pub fn set_concurrency(&mut self, concurrency: usize) {
        self.project.concurrency = concurrency.max(1);
    }

    /// Resolve relative paths against `root`.
    pub(crate) fn resolve_paths(&mut self, root: &Path) {
        if self.project.output_directory.is_relative() {
            self.project.output_directory = root.join(&self.project.output_directory);
        }
        for path in [&mut self.project.logo, &mut self.project.assets_directory]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }
}
