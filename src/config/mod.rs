// src/config/mod.rs

//! Project configuration.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it into a [`ProjectConfig`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    EntityTypeConfig, PluginConfig, ProjectConfig, ProjectSection, RawProjectConfig,
};
