// src/dag/mod.rs

//! Plugin dependency resolution.
//!
//! - [`graph`] expands a plugin selection along `depends_on` and turns the
//!   three constraint kinds into a single "must run before" relation.
//! - [`batch`] orders that graph into layers of mutually independent
//!   plugins and reports cycles.

pub mod batch;
pub mod graph;

pub use batch::{resolve_plugins, BatchScheduler, Batches};
pub use graph::{DependencyGraph, SelectionClosure};
