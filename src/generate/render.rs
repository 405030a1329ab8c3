// src/generate/render.rs

use std::fmt::Debug;
use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;

use anyhow::Context;
use serde::Serialize;

use crate::generate::ancestry::Entity;

pub type RenderFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

/// Everything a template gets to see.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderContext {
    /// `None` for unlocalized (JSON) resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Absolute URL of the page being rendered.
    pub page_url: String,

    pub entity_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<Entity>,

    /// Absolute URLs of the listed entities, for list pages.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collection: Vec<String>,
}

/// Turns a template id and a context into a document.
///
/// Template ids follow `entity/page--<type>.html`,
/// `entity/page-list--<type>.html`, `entity/<type>.json` and
/// `entity/list--<type>.json`.
pub trait Renderer: Send + Sync + Debug {
    fn render<'a>(&'a self, template: &'a str, ctx: &'a RenderContext) -> RenderFuture<'a>;
}

/// Renders JSON templates as the serialized context and HTML templates as
/// a bare page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render<'a>(&'a self, template: &'a str, ctx: &'a RenderContext) -> RenderFuture<'a> {
        Box::pin(async move {
            if template.ends_with(".json") {
                return serde_json::to_string(ctx)
                    .with_context(|| format!("rendering template '{}'", template));
            }
            if template.ends_with(".html") {
                return Ok(render_html(ctx));
            }
            anyhow::bail!("unknown template '{}'", template)
        })
    }
}

fn render_html(ctx: &RenderContext) -> String {
    let title = match &ctx.entity {
        Some(entity) => entity.display_label().to_string(),
        None => ctx.entity_type.clone(),
    };

    let mut html = String::new();
    let lang = ctx.locale.as_deref().unwrap_or("und");
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"{}\">", escape_html(lang));
    let _ = writeln!(html, "<head>");
    let _ = writeln!(html, "<meta charset=\"utf-8\">");
    let _ = writeln!(html, "<title>{}</title>", escape_html(&title));
    let _ = writeln!(
        html,
        "<link rel=\"canonical\" href=\"{}\">",
        escape_html(&ctx.page_url)
    );
    let _ = writeln!(html, "</head>");
    let _ = writeln!(html, "<body>");
    let _ = writeln!(html, "<h1>{}</h1>", escape_html(&title));
    if let Some(entity) = &ctx.entity {
        if !entity.attributes.is_empty() {
            let _ = writeln!(html, "<dl>");
            for (key, value) in &entity.attributes {
                let _ = writeln!(
                    html,
                    "<dt>{}</dt><dd>{}</dd>",
                    escape_html(key),
                    escape_html(value)
                );
            }
            let _ = writeln!(html, "</dl>");
        }
    }
    if !ctx.collection.is_empty() {
        let _ = writeln!(html, "<ul>");
        for url in &ctx.collection {
            let url = escape_html(url);
            let _ = writeln!(html, "<li><a href=\"{}\">{}</a></li>", url, url);
        }
        let _ = writeln!(html, "</ul>");
    }
    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
