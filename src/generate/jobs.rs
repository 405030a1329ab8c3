// src/generate/jobs.rs

//! The generation jobs of a site, enumerated lazily.
//!
//! Order of the stream: favicon, JSON error responses, extension dispatch,
//! robots.txt, sitemap, JSON schema, OpenAPI document, localized assets per
//! locale, then per entity type its list pages followed by the pages of each
//! of its entities. Entities of a type are only fetched from
//! the ancestry once the stream reaches that type.

use std::iter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tracing::{debug, info};

use crate::engine::{CancellationToken, Job, JobError, JobResult};
use crate::extension::SiteEvent;
use crate::generate::ancestry::Entity;
use crate::generate::assets;
use crate::generate::context::GenerationContext;
use crate::generate::render::RenderContext;
use crate::generate::schema;
use crate::generate::url::UrlGenerator;

/// Maximum number of URLs in a single sitemap file.
pub const SITEMAP_CHUNK_SIZE: usize = 50_000;

const ERROR_RESPONSES: [(u16, &str); 3] = [
    (401, "I'm sorry, dear, but it seems you're not logged in."),
    (403, "I'm sorry, dear, but it seems you're not allowed to view this page."),
    (404, "I'm sorry, dear, but it seems this page does not exist."),
];

/// Every job needed to generate the site described by `ctx`.
pub fn site_jobs(ctx: Arc<GenerationContext>) -> impl Iterator<Item = Job> + Send + 'static {
    let fixed = vec![
        favicon_job(Arc::clone(&ctx)),
        error_responses_job(Arc::clone(&ctx)),
        dispatch_job(Arc::clone(&ctx)),
        robots_txt_job(Arc::clone(&ctx)),
        sitemap_job(Arc::clone(&ctx)),
        json_schema_job(Arc::clone(&ctx)),
        openapi_job(Arc::clone(&ctx)),
    ];
    let localized_assets: Vec<Job> = ctx
        .project
        .locales()
        .iter()
        .map(|locale| localized_assets_job(Arc::clone(&ctx), locale.clone()))
        .collect();

    let entity_types = ctx.ancestry.entity_types();
    let per_type = entity_types
        .into_iter()
        .flat_map(move |entity_type| entity_type_jobs(Arc::clone(&ctx), entity_type));

    fixed.into_iter().chain(localized_assets).chain(per_type)
}

fn entity_type_jobs(
    ctx: Arc<GenerationContext>,
    entity_type: String,
) -> impl Iterator<Item = Job> + Send + 'static {
    let list_html: Vec<Job> = if ctx.project.generates_html_list(&entity_type) {
        ctx.project
            .locales()
            .iter()
            .map(|locale| list_html_job(Arc::clone(&ctx), entity_type.clone(), locale.clone()))
            .collect()
    } else {
        Vec::new()
    };
    let list_json = iter::once(list_json_job(Arc::clone(&ctx), entity_type.clone()));

    let entities = ctx.ancestry.entities(&entity_type);
    debug!(entity_type = %entity_type, entities = entities.len(), "enumerating entity jobs");
    let per_entity = entities
        .into_iter()
        .filter(|entity| entity.persistent)
        .flat_map(move |entity| entity_jobs(Arc::clone(&ctx), entity_type.clone(), entity));

    list_html.into_iter().chain(list_json).chain(per_entity)
}

fn entity_jobs(ctx: Arc<GenerationContext>, entity_type: String, entity: Entity) -> Vec<Job> {
    let mut jobs = vec![entity_json_job(
        Arc::clone(&ctx),
        entity_type.clone(),
        entity.clone(),
    )];
    if entity.is_public() {
        for locale in ctx.project.locales() {
            jobs.push(entity_html_job(
                Arc::clone(&ctx),
                entity_type.clone(),
                entity.clone(),
                locale.clone(),
            ));
        }
    }
    jobs
}

async fn write_artifact(
    ctx: &GenerationContext,
    token: &CancellationToken,
    path: PathBuf,
    contents: impl Into<Vec<u8>>,
) -> JobResult {
    if token.is_cancelled() {
        return Err(JobError::Cancelled);
    }
    ctx.writer.write(&path, contents.into()).await?;
    Ok(())
}

/// Copy the project logo to `favicon.ico`.
///
/// A missing or unreadable logo only skips this job.
fn favicon_job(ctx: Arc<GenerationContext>) -> Job {
    Job::new("favicon", move |token| async move {
        let Some(logo) = ctx.project.logo() else {
            debug!("no logo configured; not generating a favicon");
            return Ok(());
        };
        let bytes = tokio::fs::read(logo)
            .await
            .with_context(|| format!("reading logo {:?}", logo))
            .map_err(JobError::recoverable)?;
        write_artifact(&ctx, &token, ctx.urls.artifact_path("favicon.ico"), bytes).await
    })
}

fn error_responses_job(ctx: Arc<GenerationContext>) -> Job {
    Job::new("json-error-responses", move |token| async move {
        for (code, message) in ERROR_RESPONSES {
            for locale in ctx.project.locales() {
                let body = json!({
                    "$schema": schema::def_url(&ctx.urls, "errorResponse"),
                    "message": message,
                })
                .to_string();
                let path = ctx
                    .urls
                    .localized_artifact_path(locale, &format!(".error/{}.json", code));
                write_artifact(&ctx, &token, path, body).await?;
            }
        }
        Ok(())
    })
}

fn dispatch_job(ctx: Arc<GenerationContext>) -> Job {
    Job::new("dispatch", move |token| async move {
        let event = SiteEvent::GenerateSite {
            writer: Arc::clone(&ctx.writer),
            cancel: token.clone(),
        };
        ctx.extensions.dispatcher().dispatch(&event).await?;
        if token.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        Ok(())
    })
}

fn robots_txt_job(ctx: Arc<GenerationContext>) -> Job {
    Job::new("robots.txt", move |token| async move {
        let body = format!("Sitemap: {}", ctx.urls.url("sitemap.xml"));
        write_artifact(&ctx, &token, ctx.urls.artifact_path("robots.txt"), body).await
    })
}

fn sitemap_job(ctx: Arc<GenerationContext>) -> Job {
    Job::new("sitemap", move |token| async move {
        let mut urls = Vec::new();
        for locale in ctx.project.locales() {
            for entity_type in ctx.ancestry.entity_types() {
                for entity in ctx.ancestry.entities(&entity_type) {
                    if !entity.persistent || !entity.is_public() {
                        continue;
                    }
                    urls.push(ctx.urls.localized_url(
                        locale,
                        &UrlGenerator::entity_resource(&entity_type, &entity.id, "html"),
                    ));
                }
            }
            if token.is_cancelled() {
                return Err(JobError::Cancelled);
            }
        }

        let sitemaps = Sitemaps::build(&urls, SITEMAP_CHUNK_SIZE, &ctx.urls);
        for (index, chunk) in sitemaps.chunks.into_iter().enumerate() {
            let path = ctx.urls.artifact_path(&format!("sitemap-{}.xml", index));
            write_artifact(&ctx, &token, path, chunk).await?;
        }
        write_artifact(&ctx, &token, ctx.urls.artifact_path("sitemap.xml"), sitemaps.index).await?;
        info!(urls = urls.len(), "generated sitemap");
        Ok(())
    })
}

fn json_schema_job(ctx: Arc<GenerationContext>) -> Job {
    Job::new("json-schema", move |token| async move {
        let schema = schema::json_schema(&ctx.urls, &ctx.ancestry.entity_types());
        let body = serde_json::to_string(&schema).context("serializing JSON schema")?;
        let path = ctx.urls.artifact_path(schema::SCHEMA_RESOURCE);
        write_artifact(&ctx, &token, path, body).await
    })
}

fn openapi_job(ctx: Arc<GenerationContext>) -> Job {
    Job::new("openapi", move |token| async move {
        let document = schema::openapi(&ctx.urls, &ctx.ancestry.entity_types());
        let body = serde_json::to_string(&document).context("serializing OpenAPI document")?;
        let path = ctx.urls.artifact_path(schema::OPENAPI_RESOURCE);
        write_artifact(&ctx, &token, path, body).await
    })
}

fn localized_assets_job(ctx: Arc<GenerationContext>, locale: String) -> Job {
    let label = format!("public-assets [{}]", locale);
    Job::new(label, move |token| async move {
        assets::copy_localized_assets(&ctx, &locale, &token).await?;
        if token.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        Ok(())
    })
}

/// A rendered sitemap index and the sitemap files it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sitemaps {
    pub index: String,
    pub chunks: Vec<String>,
}

impl Sitemaps {
    /// Split `urls` into sitemaps of at most `chunk_size` URLs.
    ///
    /// There is always at least one (possibly empty) sitemap file.
    pub fn build(urls: &[String], chunk_size: usize, url_generator: &UrlGenerator) -> Self {
        let chunk_size = chunk_size.max(1);
        let mut chunks: Vec<String> = urls.chunks(chunk_size).map(render_urlset).collect();
        if chunks.is_empty() {
            chunks.push(render_urlset(&[]));
        }

        let mut index = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for i in 0..chunks.len() {
            let loc = url_generator.url(&format!("sitemap-{}.xml", i));
            index.push_str(&format!("<sitemap><loc>{}</loc></sitemap>\n", escape_xml(&loc)));
        }
        index.push_str("</sitemapindex>\n");

        Self { index, chunks }
    }
}

fn render_urlset(urls: &[String]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        out.push_str(&format!("<url><loc>{}</loc></url>\n", escape_xml(url)));
    }
    out.push_str("</urlset>\n");
    out
}

fn escape_xml(s: &str) -> String {
    crate::generate::render::escape_html(s)
}

fn list_html_job(ctx: Arc<GenerationContext>, entity_type: String, locale: String) -> Job {
    let label = format!("{}-list-html [{}]", entity_type, locale);
    Job::new(label, move |token| async move {
        let collection = ctx
            .ancestry
            .entities(&entity_type)
            .into_iter()
            .filter(|e| e.persistent && e.is_public())
            .map(|e| {
                ctx.urls.localized_url(
                    &locale,
                    &UrlGenerator::entity_resource(&entity_type, &e.id, "html"),
                )
            })
            .collect();
        let resource = UrlGenerator::entity_type_resource(&entity_type, "html");
        let render_ctx = RenderContext {
            locale: Some(locale.clone()),
            page_url: ctx.urls.localized_url(&locale, &resource),
            entity_type: entity_type.clone(),
            entity: None,
            collection,
        };
        let template = format!("entity/page-list--{}.html", entity_type);
        let html = ctx.renderer.render(&template, &render_ctx).await?;
        let path = ctx.urls.localized_artifact_path(&locale, &resource);
        write_artifact(&ctx, &token, path, html).await
    })
}

fn list_json_job(ctx: Arc<GenerationContext>, entity_type: String) -> Job {
    let label = format!("{}-list-json", entity_type);
    Job::new(label, move |token| async move {
        let collection = ctx
            .ancestry
            .entities(&entity_type)
            .into_iter()
            .filter(|e| e.persistent)
            .map(|e| ctx.urls.url(&UrlGenerator::entity_resource(&entity_type, &e.id, "json")))
            .collect();
        let resource = UrlGenerator::entity_type_resource(&entity_type, "json");
        let render_ctx = RenderContext {
            locale: None,
            page_url: ctx.urls.url(&resource),
            entity_type: entity_type.clone(),
            entity: None,
            collection,
        };
        let template = format!("entity/list--{}.json", entity_type);
        let json = ctx.renderer.render(&template, &render_ctx).await?;
        write_artifact(&ctx, &token, ctx.urls.artifact_path(&resource), json).await
    })
}

fn entity_json_job(ctx: Arc<GenerationContext>, entity_type: String, entity: Entity) -> Job {
    let label = format!("{}/{}.json", entity_type, entity.id);
    Job::new(label, move |token| async move {
        let resource = UrlGenerator::entity_resource(&entity_type, &entity.id, "json");
        let render_ctx = RenderContext {
            locale: None,
            page_url: ctx.urls.url(&resource),
            entity_type: entity_type.clone(),
            entity: Some(entity),
            collection: Vec::new(),
        };
        let template = format!("entity/{}.json", entity_type);
        let json = ctx.renderer.render(&template, &render_ctx).await?;
        write_artifact(&ctx, &token, ctx.urls.artifact_path(&resource), json).await
    })
}

fn entity_html_job(
    ctx: Arc<GenerationContext>,
    entity_type: String,
    entity: Entity,
    locale: String,
) -> Job {
    let label = format!("{}/{}.html [{}]", entity_type, entity.id, locale);
    Job::new(label, move |token| async move {
        let resource = UrlGenerator::entity_resource(&entity_type, &entity.id, "html");
        let path = ctx.urls.localized_artifact_path(&locale, &resource);
        let render_ctx = RenderContext {
            locale: Some(locale.clone()),
            page_url: ctx.urls.localized_url(&locale, &resource),
            entity_type: entity_type.clone(),
            entity: Some(entity),
            collection: Vec::new(),
        };
        let template = format!("entity/page--{}.html", entity_type);
        let html = ctx.renderer.render(&template, &render_ctx).await?;
        write_artifact(&ctx, &token, path, html).await
    })
}
