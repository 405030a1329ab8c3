// src/generate/ancestry.rs

use std::collections::{BTreeMap, HashSet};
use std::fmt::Debug;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{PedigreeError, Result};
use crate::fs::is_safe_segment;
use crate::plugin::is_valid_plugin_id;

/// One genealogical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Private entities get no HTML pages.
    #[serde(default)]
    pub private: bool,

    /// Entities with generated (non-persistent) ids get no pages at all.
    #[serde(default = "default_persistent")]
    pub persistent: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

fn default_persistent() -> bool {
    true
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            private: false,
            persistent: true,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn is_public(&self) -> bool {
        !self.private
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Read access to the entities a site is generated from.
///
/// Implementations must be safe to query from many jobs at once.
pub trait Ancestry: Send + Sync + Debug {
    /// Entity type ids, in generation order.
    fn entity_types(&self) -> Vec<String>;

    /// Entities of one type. Unknown types yield nothing.
    fn entities(&self, entity_type: &str) -> Vec<Entity>;

    fn entity(&self, entity_type: &str, id: &str) -> Option<Entity>;
}

/// An ancestry held entirely in memory.
///
/// Deserializes from a TOML document with one array of tables per entity
/// type:
///
/// ```toml
/// [[person]]
/// id = "I0001"
/// label = "Jane Doe"
///
/// [[person]]
/// id = "I0002"
/// private = true
///
/// [[place]]
/// id = "P0001"
/// label = "Amsterdam"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct InMemoryAncestry {
    entities: BTreeMap<String, Vec<Entity>>,
}

impl InMemoryAncestry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, creating its type if needed.
    pub fn add(&mut self, entity_type: impl Into<String>, entity: Entity) -> &mut Self {
        self.entities
            .entry(entity_type.into())
            .or_default()
            .push(entity);
        self
    }

    /// Total number of entities across all types.
    pub fn len(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check entity type ids, entity ids and per-type id uniqueness.
    ///
    /// Entity ids become path segments, so they may not be empty or contain
    /// separators, `..` or control characters.
    pub fn validate(&self) -> Result<()> {
        for (entity_type, entities) in &self.entities {
            if !is_valid_plugin_id(entity_type) {
                return Err(PedigreeError::ConfigError(format!(
                    "invalid entity type id '{}' in ancestry",
                    entity_type
                )));
            }
            let mut seen = HashSet::new();
            for entity in entities {
                if !is_safe_segment(&entity.id) {
                    return Err(PedigreeError::ConfigError(format!(
                        "{} entity has an invalid id {:?}",
                        entity_type, entity.id
                    )));
                }
                if !seen.insert(entity.id.as_str()) {
                    return Err(PedigreeError::ConfigError(format!(
                        "{} '{}' appears more than once",
                        entity_type, entity.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let ancestry: InMemoryAncestry = toml::from_str(contents)?;
        ancestry.validate()?;
        Ok(ancestry)
    }
}

impl Ancestry for InMemoryAncestry {
    fn entity_types(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }

    fn entities(&self, entity_type: &str) -> Vec<Entity> {
        self.entities.get(entity_type).cloned().unwrap_or_default()
    }

    fn entity(&self, entity_type: &str, id: &str) -> Option<Entity> {
        self.entities
            .get(entity_type)?
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }
}

/// Load and validate an ancestry TOML file.
pub fn load_ancestry(path: impl AsRef<Path>) -> Result<InMemoryAncestry> {
    let contents = fs::read_to_string(path.as_ref())?;
    InMemoryAncestry::from_toml_str(&contents)
}
