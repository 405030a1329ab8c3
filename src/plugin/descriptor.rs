// src/plugin/descriptor.rs

//! Plugin ordering constraints as plain data.

use std::collections::BTreeSet;

use crate::errors::Result;
use crate::plugin::PluginId;

/// The four queries the resolver needs from a plugin.
///
/// Resolution never looks at anything else, so a plugin type only has to
/// answer these to take part in ordering.
pub trait Plugin {
    fn plugin_id(&self) -> &PluginId;

    /// Hard prerequisites. These are pulled into the selection automatically
    /// and always ordered before this plugin.
    fn depends_on(&self) -> &BTreeSet<PluginId>;

    /// Plugins this one must precede, if they are part of the selection.
    fn comes_before(&self) -> &BTreeSet<PluginId>;

    /// Plugins this one must follow, if they are part of the selection.
    fn comes_after(&self) -> &BTreeSet<PluginId>;
}

/// Pure-data plugin description.
///
/// ```
/// use pedigree::plugin::PluginDescriptor;
///
/// let maps = PluginDescriptor::new("maps")?.with_depends_on(["js"])?;
/// assert_eq!(maps.id().as_str(), "maps");
/// # Ok::<(), pedigree::errors::PedigreeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    id: PluginId,
    depends_on: BTreeSet<PluginId>,
    comes_before: BTreeSet<PluginId>,
    comes_after: BTreeSet<PluginId>,
}

impl PluginDescriptor {
    pub fn new(id: &str) -> Result<Self> {
        Ok(Self::from_id(PluginId::new(id)?))
    }

    pub fn from_id(id: PluginId) -> Self {
        Self {
            id,
            depends_on: BTreeSet::new(),
            comes_before: BTreeSet::new(),
            comes_after: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    pub fn with_depends_on<'a>(mut self, ids: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        extend_ids(&mut self.depends_on, ids)?;
        Ok(self)
    }

    pub fn with_comes_before<'a>(mut self, ids: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        extend_ids(&mut self.comes_before, ids)?;
        Ok(self)
    }

    pub fn with_comes_after<'a>(mut self, ids: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        extend_ids(&mut self.comes_after, ids)?;
        Ok(self)
    }
}

fn extend_ids<'a>(
    set: &mut BTreeSet<PluginId>,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    for id in ids {
        set.insert(PluginId::new(id)?);
    }
    Ok(())
}

impl Plugin for PluginDescriptor {
    fn plugin_id(&self) -> &PluginId {
        &self.id
    }

    fn depends_on(&self) -> &BTreeSet<PluginId> {
        &self.depends_on
    }

    fn comes_before(&self) -> &BTreeSet<PluginId> {
        &self.comes_before
    }

    fn comes_after(&self) -> &BTreeSet<PluginId> {
        &self.comes_after
    }
}
