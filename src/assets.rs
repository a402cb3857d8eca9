//! Asset store
//!
//! Named byte blobs in persistent storage: font files, `.dat` glyph
//! tables and `.tga` atlas pages. Paths are relative, `/`-separated.

use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{FontError, Result};

/// Read/write access to named blobs
pub trait AssetStore {
    /// Read a whole blob; `FontError::NotFound` if it does not exist
    fn read_all(&mut self, path: &str) -> Result<Vec<u8>>;

    /// Write a whole blob, replacing any previous content
    fn write_all(&mut self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Check whether a blob exists
    fn exists(&self, path: &str) -> bool;
}

/// Asset store rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        // Absolute font paths from the command line are used as-is
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl AssetStore for DirAssetStore {
    fn read_all(&mut self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path);
        debug!("Reading asset: {}", full.display());
        std::fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FontError::NotFound(full.display().to_string()),
            _ => FontError::Io(format!("{}: {}", full.display(), e)),
        })
    }

    fn write_all(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, bytes)
            .map_err(|e| FontError::Io(format!("{}: {}", full.display(), e)))?;
        debug!("Wrote asset: {} ({} bytes)", full.display(), bytes.len());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }
}

/// In-memory asset store
///
/// Counts reads and writes so callers can verify when I/O happened.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssetStore {
    files: HashMap<String, Vec<u8>>,
    reads: usize,
    writes: usize,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a blob without counting it as a write
    pub fn insert(&mut self, path: &str, bytes: Vec<u8>) {
        self.files.insert(path.to_string(), bytes);
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    pub fn read_count(&self) -> usize {
        self.reads
    }

    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl AssetStore for MemoryAssetStore {
    fn read_all(&mut self, path: &str) -> Result<Vec<u8>> {
        self.reads += 1;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FontError::NotFound(path.to_string()))
    }

    fn write_all(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        self.writes += 1;
        self.files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}
