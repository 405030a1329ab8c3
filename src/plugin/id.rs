// src/plugin/id.rs

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::errors::{PedigreeError, Result};

static PLUGIN_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9\-]{1,250}$").expect("plugin id pattern is valid"));

/// Opaque, validated plugin identifier.
///
/// At most 250 characters of lowercase ASCII letters, digits and hyphens.
/// Validation happens once, when the id is constructed; the resolver never
/// re-checks ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct PluginId(String);

impl PluginId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if is_valid_plugin_id(&id) {
            Ok(Self(id))
        } else {
            Err(PedigreeError::InvalidPluginId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether `id` matches the plugin id charset and length limits.
pub fn is_valid_plugin_id(id: &str) -> bool {
    PLUGIN_ID_PATTERN.is_match(id)
}

impl TryFrom<String> for PluginId {
    type Error = PedigreeError;

    fn try_from(value: String) -> Result<Self> {
        PluginId::new(value)
    }
}

impl FromStr for PluginId {
    type Err = PedigreeError;

    fn from_str(s: &str) -> Result<Self> {
        PluginId::new(s)
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for PluginId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
