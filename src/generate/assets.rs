// src/generate/assets.rs

//! Public asset files copied verbatim into the site.
//!
//! Below the project's assets directory, `public/static/` maps onto the www
//! directory and `public/localized/` onto each locale's www directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::engine::CancellationToken;
use crate::generate::context::GenerationContext;

pub const STATIC_ASSETS_DIR: &str = "public/static";
pub const LOCALIZED_ASSETS_DIR: &str = "public/localized";

/// Every file below `root`, relative to it and sorted.
///
/// A missing `root` has no files.
pub async fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(relative) = pending.pop() {
        let dir = root.join(&relative);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && relative.as_os_str().is_empty() => {
                return Ok(files);
            }
            Err(e) => return Err(e).with_context(|| format!("reading dir {:?}", dir)),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("reading dir {:?}", dir))?
        {
            let path = relative.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Copy every file below `source` to `destination` (an artifact path).
///
/// Returns the number of files copied.
pub async fn copy_tree(
    ctx: &GenerationContext,
    source: &Path,
    destination: &Path,
    cancel: &CancellationToken,
) -> Result<usize> {
    let files = list_files(source).await?;
    for relative in &files {
        if cancel.is_cancelled() {
            break;
        }
        let from = source.join(relative);
        let bytes = tokio::fs::read(&from)
            .await
            .with_context(|| format!("reading asset {:?}", from))?;
        ctx.writer.write(&destination.join(relative), bytes).await?;
    }
    Ok(files.len())
}

/// Copy the static public assets into the www directory.
pub async fn copy_static_assets(ctx: &GenerationContext, cancel: &CancellationToken) -> Result<usize> {
    let Some(assets) = ctx.project.assets_directory() else {
        return Ok(0);
    };
    let copied = copy_tree(
        ctx,
        &assets.join(STATIC_ASSETS_DIR),
        &ctx.urls.artifact_path(""),
        cancel,
    )
    .await?;
    debug!(files = copied, "copied static public assets");
    Ok(copied)
}

/// Copy the localized public assets into the www directory of `locale`.
pub async fn copy_localized_assets(
    ctx: &GenerationContext,
    locale: &str,
    cancel: &CancellationToken,
) -> Result<usize> {
    let Some(assets) = ctx.project.assets_directory() else {
        return Ok(0);
    };
    let copied = copy_tree(
        ctx,
        &assets.join(LOCALIZED_ASSETS_DIR),
        &ctx.urls.localized_artifact_path(locale, ""),
        cancel,
    )
    .await?;
    debug!(locale, files = copied, "copied localized public assets");
    Ok(copied)
}
