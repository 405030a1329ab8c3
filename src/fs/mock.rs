// src/fs/mock.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{ensure_relative, ArtifactWriter, WriteFuture};

/// In-memory [`ArtifactWriter`] for tests.
///
/// Clones share the same storage, so a test can keep one handle and give
/// another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.get(path.as_ref()).cloned()
    }

    pub fn read_to_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.get(path).and_then(|bytes| String::from_utf8(bytes).ok())
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.contains_key(path.as_ref())
    }

    /// All written paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactWriter for MemoryWriter {
    fn write<'a>(&'a self, path: &'a Path, contents: Vec<u8>) -> WriteFuture<'a> {
        Box::pin(async move {
            ensure_relative(path)?;
            let mut files = self.files.lock().unwrap_or_else(|e| e.into_inner());
            files.insert(path.to_path_buf(), contents);
            Ok(())
        })
    }

    fn clear(&self) -> WriteFuture<'_> {
        Box::pin(async move {
            let mut files = self.files.lock().unwrap_or_else(|e| e.into_inner());
            files.clear();
            Ok(())
        })
    }
}
