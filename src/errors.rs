// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::plugin::PluginId;

#[derive(Error, Debug)]
pub enum PedigreeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid plugin id {0:?}: expected 1-250 lowercase letters, digits or hyphens")]
    InvalidPluginId(String),

    #[error("Plugin '{0}' is registered more than once")]
    DuplicatePlugin(PluginId),

    #[error("Could not find a plugin '{plugin_id}'")]
    UnknownPlugin { plugin_id: String },

    #[error("Cyclic plugin dependency between: {}", join_ids(plugin_ids))]
    CyclicDependency { plugin_ids: Vec<PluginId> },

    #[error("Job '{job}' failed: {cause:#}")]
    JobFailed { job: String, cause: anyhow::Error },

    #[error("Generation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PedigreeError {
    /// The plugins that form (or are blocked by) a dependency cycle, if this
    /// is a [`PedigreeError::CyclicDependency`].
    pub fn cycle_members(&self) -> Option<&[PluginId]> {
        match self {
            PedigreeError::CyclicDependency { plugin_ids } => Some(plugin_ids),
            _ => None,
        }
    }
}

fn join_ids(ids: &[PluginId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PedigreeError>;
