// src/plugin/builtin.rs

use std::sync::Arc;

use crate::errors::Result;
use crate::extension::{Extension, ExtensionContext, ExtensionFactory, NginxExtension};
use crate::plugin::{PluginDescriptor, PluginRegistry};

impl PluginRegistry {
    /// A registry with every plugin shipped with pedigree.
    ///
    /// | plugin       | constraint                 |
    /// |--------------|----------------------------|
    /// | `js`         |                            |
    /// | `maps`       | depends on `js`            |
    /// | `trees`      | depends on `js`            |
    /// | `search`     | depends on `js`            |
    /// | `anonymizer` |                            |
    /// | `cleaner`    | comes after `anonymizer`   |
    /// | `privatizer` |                            |
    /// | `deriver`    | comes before `privatizer`  |
    /// | `nginx`      |                            |
    pub fn builtin() -> Result<Self> {
        let mut registry = PluginRegistry::new();

        registry.register(PluginDescriptor::new("js")?)?;
        registry.register(PluginDescriptor::new("maps")?.with_depends_on(["js"])?)?;
        registry.register(PluginDescriptor::new("trees")?.with_depends_on(["js"])?)?;
        registry.register(PluginDescriptor::new("search")?.with_depends_on(["js"])?)?;

        registry.register(PluginDescriptor::new("anonymizer")?)?;
        registry.register(PluginDescriptor::new("cleaner")?.with_comes_after(["anonymizer"])?)?;
        registry.register(PluginDescriptor::new("privatizer")?)?;
        registry.register(PluginDescriptor::new("deriver")?.with_comes_before(["privatizer"])?)?;

        let nginx = PluginDescriptor::new("nginx")?;
        let nginx_id = nginx.id().clone();
        let factory: ExtensionFactory = Arc::new(move |ctx: &ExtensionContext| -> Box<dyn Extension> {
            Box::new(NginxExtension::from_context(nginx_id.clone(), ctx))
        });
        registry.register_extension(nginx, factory)?;

        Ok(registry)
    }
}
