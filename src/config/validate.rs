// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ProjectConfig, RawProjectConfig};
use crate::errors::{PedigreeError, Result};
use crate::fs::is_safe_segment;
use crate::plugin::{is_valid_plugin_id, PluginId};

impl TryFrom<RawProjectConfig> for ProjectConfig {
    type Error = PedigreeError;

    fn try_from(raw: RawProjectConfig) -> Result<Self> {
        validate_raw_config(&raw)?;

        let mut plugins = Vec::with_capacity(raw.plugin.len());
        for (id, cfg) in raw.plugin {
            plugins.push((PluginId::new(id)?, cfg));
        }

        Ok(ProjectConfig::new_unchecked(
            raw.project,
            raw.entity_type,
            plugins,
        ))
    }
}

fn validate_raw_config(cfg: &RawProjectConfig) -> Result<()> {
    validate_locales(cfg)?;
    validate_project_section(cfg)?;
    validate_entity_types(cfg)?;
    validate_plugin_ids(cfg)?;
    Ok(())
}

fn validate_locales(cfg: &RawProjectConfig) -> Result<()> {
    let locales = &cfg.project.locales;
    if locales.is_empty() {
        return Err(PedigreeError::ConfigError(
            "[project].locales must contain at least one locale".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for locale in locales {
        if !is_safe_segment(locale) {
            return Err(PedigreeError::ConfigError(format!(
                "[project].locales contains an invalid locale {:?}",
                locale
            )));
        }
        if !seen.insert(locale.as_str()) {
            return Err(PedigreeError::ConfigError(format!(
                "[project].locales lists '{}' more than once",
                locale
            )));
        }
    }
    Ok(())
}

fn validate_project_section(cfg: &RawProjectConfig) -> Result<()> {
    if cfg.project.concurrency == 0 {
        return Err(PedigreeError::ConfigError(
            "[project].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    let base_url = cfg.project.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(PedigreeError::ConfigError(format!(
            "[project].base_url must be an absolute http(s) URL (got '{}')",
            cfg.project.base_url
        )));
    }

    Ok(())
}

fn validate_entity_types(cfg: &RawProjectConfig) -> Result<()> {
    for id in cfg.entity_type.keys() {
        if !is_valid_plugin_id(id) {
            return Err(PedigreeError::ConfigError(format!(
                "invalid entity type id '{}' in [entity_type]",
                id
            )));
        }
    }
    Ok(())
}

fn validate_plugin_ids(cfg: &RawProjectConfig) -> Result<()> {
    let mut seen = HashSet::new();
    for (id, _) in &cfg.plugin {
        if !is_valid_plugin_id(id) {
            return Err(PedigreeError::ConfigError(format!(
                "invalid plugin id '{}' in [plugin]",
                id
            )));
        }
        if !seen.insert(id.as_str()) {
            return Err(PedigreeError::ConfigError(format!(
                "[plugin.{}] is configured more than once",
                id
            )));
        }
    }
    Ok(())
}
