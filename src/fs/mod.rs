// src/fs/mod.rs

//! Where generated artifacts go.
//!
//! Jobs never touch the filesystem directly; they hand bytes and an
//! output-relative path to an [`ArtifactWriter`]. Production uses
//! [`DiskWriter`]; tests use [`mock::MemoryWriter`].

use std::fmt::Debug;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;

use anyhow::{bail, Context, Result};
use tracing::debug;

pub mod mock;

pub use mock::MemoryWriter;

pub type WriteFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Abstract artifact output.
///
/// Paths are relative to the output directory. Writes to distinct paths may
/// happen concurrently and in any order; writing the same path twice
/// replaces the previous contents.
pub trait ArtifactWriter: Send + Sync + Debug {
    fn write<'a>(&'a self, path: &'a Path, contents: Vec<u8>) -> WriteFuture<'a>;

    /// Remove everything previously written, leaving an empty output.
    fn clear(&self) -> WriteFuture<'_>;

    /// Called once after a successful generation.
    fn finalize(&self) -> WriteFuture<'_> {
        Box::pin(async { Ok(()) })
    }
}

/// Whether `segment` can be used as a single path component of an
/// artifact path: non-empty, no separators, no `..`, no control characters.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.trim().is_empty()
        && !segment.contains(['/', '\\'])
        && !segment.contains("..")
        && !segment.chars().any(char::is_control)
}

/// Reject artifact paths that could resolve outside the output directory.
pub fn ensure_relative(path: &Path) -> Result<()> {
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("artifact path escapes the output directory: {:?}", path)
            }
        }
    }
    Ok(())
}

/// Writes artifacts below a root directory using `tokio::fs`.
#[derive(Debug, Clone)]
pub struct DiskWriter {
    root: PathBuf,
}

impl DiskWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactWriter for DiskWriter {
    fn write<'a>(&'a self, path: &'a Path, contents: Vec<u8>) -> WriteFuture<'a> {
        Box::pin(async move {
            ensure_relative(path)?;
            let target = self.root.join(path);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating dir {:?}", parent))?;
            }
            tokio::fs::write(&target, contents)
                .await
                .with_context(|| format!("writing to file {:?}", target))?;
            Ok(())
        })
    }

    fn clear(&self) -> WriteFuture<'_> {
        Box::pin(async move {
            match tokio::fs::remove_dir_all(&self.root).await {
                Ok(()) => debug!(root = ?self.root, "removed previous output"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("removing dir {:?}", self.root));
                }
            }
            tokio::fs::create_dir_all(&self.root)
                .await
                .with_context(|| format!("creating dir {:?}", self.root))?;
            Ok(())
        })
    }

    /// Reset permissions so a web server can read everything: 0755 for
    /// directories, 0644 for files.
    fn finalize(&self) -> WriteFuture<'_> {
        Box::pin(async move {
            #[cfg(unix)]
            {
                reset_permissions(&self.root).await?;
            }
            Ok(())
        })
    }
}

#[cfg(unix)]
async fn reset_permissions(root: &Path) -> Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        tokio::fs::set_permissions(&dir, Permissions::from_mode(0o755))
            .await
            .with_context(|| format!("setting permissions of {:?}", dir))?;
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("reading dir {:?}", dir))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                tokio::fs::set_permissions(&path, Permissions::from_mode(0o644))
                    .await
                    .with_context(|| format!("setting permissions of {:?}", path))?;
            }
        }
    }
    debug!(root = ?root, "reset output permissions");
    Ok(())
}
