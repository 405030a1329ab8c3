// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ProjectConfig, RawProjectConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawProjectConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawProjectConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawProjectConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path, validate it, and resolve relative
/// paths against the directory containing the file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ProjectConfig> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let mut config = ProjectConfig::try_from(raw_config)?;
    config.resolve_paths(&config_root_dir(path));
    debug!(
        output = ?config.output_directory(),
        locales = ?config.locales(),
        "loaded project configuration"
    );
    Ok(config)
}

/// Directory that relative config paths are resolved against.
///
/// A bare file name (empty parent) means the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
