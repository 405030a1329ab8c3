// src/extension/nginx.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::info;

use crate::config::ProjectConfig;
use crate::extension::{Extension, ExtensionContext, HandlerFuture, SiteEvent};
use crate::plugin::PluginId;

/// Where the server configuration lands, relative to the output directory.
pub const NGINX_CONF_PATH: &str = "nginx/nginx.conf";

/// Writes an nginx server configuration that serves the generated site.
///
/// Options (`[plugin.nginx]`):
/// - `https`: listen on 443 instead of 80. Defaults to the base URL's scheme.
/// - `www_directory_path`: document root as seen by the server. Defaults to
///   the project's www directory.
#[derive(Debug, Clone)]
pub struct NginxExtension {
    plugin_id: PluginId,
    project: Arc<ProjectConfig>,
    https: Option<bool>,
    www_directory_path: Option<PathBuf>,
}

impl NginxExtension {
    pub fn from_context(plugin_id: PluginId, ctx: &ExtensionContext) -> Self {
        Self {
            plugin_id,
            project: Arc::clone(&ctx.project),
            https: ctx.options.get("https").and_then(|v| v.as_bool()),
            www_directory_path: ctx
                .options
                .get("www_directory_path")
                .and_then(|v| v.as_str())
                .map(PathBuf::from),
        }
    }

    pub fn https(&self) -> bool {
        self.https
            .unwrap_or_else(|| self.project.base_url().starts_with("https://"))
    }

    pub fn www_directory_path(&self) -> PathBuf {
        self.www_directory_path
            .clone()
            .unwrap_or_else(|| self.project.www_directory())
    }

    /// Render the server block.
    pub fn render_config(&self) -> anyhow::Result<String> {
        let base_url = self.project.base_url();
        let server_name = base_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .and_then(|rest| rest.split('/').next())
            .filter(|host| !host.is_empty())
            .ok_or_else(|| anyhow!("cannot derive a server name from '{}'", base_url))?;

        let root_path = match self.project.root_path() {
            "" => "/".to_string(),
            path => format!("/{}/", path),
        };

        let mut conf = String::new();
        if self.https() {
            conf.push_str("server {\n");
            conf.push_str("    listen 80;\n");
            conf.push_str(&format!("    server_name {};\n", server_name));
            conf.push_str("    return 301 https://$host$request_uri;\n");
            conf.push_str("}\n");
        }
        conf.push_str("server {\n");
        if self.https() {
            conf.push_str("    listen 443 ssl http2;\n");
        } else {
            conf.push_str("    listen 80;\n");
        }
        conf.push_str(&format!("    server_name {};\n", server_name));
        conf.push_str(&format!(
            "    root {};\n",
            display_path(&self.www_directory_path())
        ));
        conf.push_str("    charset utf-8;\n");
        conf.push_str("    gzip on;\n");
        conf.push_str("    gzip_types text/css application/javascript application/json;\n");
        conf.push_str("    error_page 401 /.error/401.json;\n");
        conf.push_str("    error_page 403 /.error/403.json;\n");
        conf.push_str("    error_page 404 /.error/404.json;\n");
        conf.push_str(&format!("    location {} {{\n", root_path));
        conf.push_str("        index index.html index.json;\n");
        conf.push_str("        try_files $uri $uri/ =404;\n");
        conf.push_str("    }\n");
        conf.push_str("}\n");
        Ok(conf)
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl Extension for NginxExtension {
    fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    fn handle<'a>(&'a self, event: &'a SiteEvent) -> HandlerFuture<'a> {
        Box::pin(async move {
            match event {
                SiteEvent::GenerateSite { writer, cancel } => {
                    if cancel.is_cancelled() {
                        return Ok(());
                    }
                    let conf = self.render_config()?;
                    writer
                        .write(Path::new(NGINX_CONF_PATH), conf.into_bytes())
                        .await?;
                    info!(plugin = %self.plugin_id, path = NGINX_CONF_PATH, "wrote nginx configuration");
                }
            }
            Ok(())
        })
    }
}
