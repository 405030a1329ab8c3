// src/generate/mod.rs

//! Site generation.
//!
//! Responsibilities:
//! - External collaborators: [`Ancestry`] (what to generate), [`Renderer`]
//!   (how pages look) and [`crate::fs::ArtifactWriter`] (where bytes go).
//! - Copy public assets (`assets.rs`).
//! - Enumerate the site's jobs lazily (`jobs.rs`).
//! - Run them through the [`TaskEngine`].

use std::sync::Arc;

use tracing::info;

use crate::engine::{job_stream, CancellationToken, RunSummary, TaskEngine};
use crate::errors::Result;

pub mod ancestry;
pub mod assets;
pub mod context;
pub mod jobs;
pub mod render;
pub mod schema;
pub mod url;

pub use ancestry::{load_ancestry, Ancestry, Entity, InMemoryAncestry};
pub use context::GenerationContext;
pub use jobs::{site_jobs, Sitemaps, SITEMAP_CHUNK_SIZE};
pub use render::{PlainRenderer, RenderContext, RenderFuture, Renderer};
pub use url::{UrlGenerator, WWW_DIR};

/// Generate the site with the project's configured concurrency.
pub async fn generate(ctx: Arc<GenerationContext>, cancel: &CancellationToken) -> Result<RunSummary> {
    let engine = TaskEngine::new(ctx.project.concurrency());
    generate_with_engine(&engine, ctx, cancel).await
}

/// Generate the site on a caller-provided engine.
///
/// Previous output is cleared first and static public assets are copied
/// before any job runs. The writer is finalized once every job succeeded.
pub async fn generate_with_engine(
    engine: &TaskEngine,
    ctx: Arc<GenerationContext>,
    cancel: &CancellationToken,
) -> Result<RunSummary> {
    info!(
        output = ?ctx.project.output_directory(),
        locales = ctx.project.locales().len(),
        extensions = ctx.extensions.len(),
        "generating site"
    );
    ctx.writer.clear().await?;

    // Localized assets may overwrite static ones, so these go first.
    assets::copy_static_assets(&ctx, cancel).await?;

    let writer = Arc::clone(&ctx.writer);
    let summary = engine.run(job_stream(site_jobs(ctx)), cancel).await?;
    writer.finalize().await?;

    info!(
        completed = summary.completed,
        skipped = summary.skipped,
        max_in_flight = summary.max_in_flight,
        "site generated"
    );
    Ok(summary)
}
