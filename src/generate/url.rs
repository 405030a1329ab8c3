// src/generate/url.rs

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ProjectConfig;

/// Directory (relative to the output directory) holding the public site.
pub const WWW_DIR: &str = "www";

/// Maps site resources to artifact paths and public URLs.
///
/// Artifact paths are relative to the output directory, ready for an
/// [`crate::fs::ArtifactWriter`]. Resource paths are `/`-separated and
/// relative to the site root, e.g. `person/I0001/index.html`.
#[derive(Debug, Clone)]
pub struct UrlGenerator {
    project: Arc<ProjectConfig>,
}

impl UrlGenerator {
    pub fn new(project: Arc<ProjectConfig>) -> Self {
        Self { project }
    }

    /// Artifact path of an unlocalized resource.
    pub fn artifact_path(&self, resource: &str) -> PathBuf {
        let mut path = PathBuf::from(WWW_DIR);
        path.extend(resource.split('/').filter(|s| !s.is_empty()));
        path
    }

    /// Artifact path of a resource for `locale`.
    pub fn localized_artifact_path(&self, locale: &str, resource: &str) -> PathBuf {
        let mut path = PathBuf::from(WWW_DIR);
        let prefix = self.project.locale_prefix(locale);
        if !prefix.as_os_str().is_empty() {
            path.push(prefix);
        }
        path.extend(resource.split('/').filter(|s| !s.is_empty()));
        path
    }

    /// Absolute URL of an unlocalized resource.
    pub fn url(&self, resource: &str) -> String {
        let mut url = self.project.base_url().to_string();
        for segment in self
            .project
            .root_path()
            .split('/')
            .chain(resource.split('/'))
            .filter(|s| !s.is_empty())
        {
            url.push('/');
            url.push_str(segment);
        }
        url
    }

    /// Absolute URL of a resource for `locale`.
    pub fn localized_url(&self, locale: &str, resource: &str) -> String {
        if self.project.is_multilingual() {
            self.url(&format!("{}/{}", locale, resource))
        } else {
            self.url(resource)
        }
    }

    pub fn entity_resource(entity_type: &str, id: &str, extension: &str) -> String {
        format!("{}/{}/index.{}", entity_type, id, extension)
    }

    pub fn entity_type_resource(entity_type: &str, extension: &str) -> String {
        format!("{}/index.{}", entity_type, extension)
    }
}
