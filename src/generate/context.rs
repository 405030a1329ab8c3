// src/generate/context.rs

use std::sync::Arc;

use crate::config::ProjectConfig;
use crate::extension::Extensions;
use crate::fs::ArtifactWriter;
use crate::generate::ancestry::Ancestry;
use crate::generate::render::Renderer;
use crate::generate::url::UrlGenerator;

/// Shared, read-only state of one generation run.
#[derive(Debug)]
pub struct GenerationContext {
    pub project: Arc<ProjectConfig>,
    pub ancestry: Arc<dyn Ancestry>,
    pub renderer: Arc<dyn Renderer>,
    pub writer: Arc<dyn ArtifactWriter>,
    pub extensions: Arc<Extensions>,
    pub urls: UrlGenerator,
}

impl GenerationContext {
    pub fn new(
        project: Arc<ProjectConfig>,
        ancestry: Arc<dyn Ancestry>,
        renderer: Arc<dyn Renderer>,
        writer: Arc<dyn ArtifactWriter>,
        extensions: Arc<Extensions>,
    ) -> Self {
        let urls = UrlGenerator::new(Arc::clone(&project));
        Self {
            project,
            ancestry,
            renderer,
            writer,
            extensions,
            urls,
        }
    }
}
