// src/plugin/mod.rs

//! Plugin identity, ordering constraints and the registry.
//!
//! - [`id`] holds the validated [`PluginId`] type.
//! - [`descriptor`] defines the [`Plugin`] query trait and the pure-data
//!   [`PluginDescriptor`].
//! - [`registry`] stores descriptors (plus extension factories) in
//!   registration order.
//! - [`builtin`] registers the plugins shipped with pedigree.

pub mod builtin;
pub mod descriptor;
pub mod id;
pub mod registry;

pub use descriptor::{Plugin, PluginDescriptor};
pub use id::{is_valid_plugin_id, PluginId};
pub use registry::{PluginLookup, PluginRegistry};
