use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{DirCache, DirEntry, FileCache, FileReader};
use crate::errors::Result;

/// Caller-supplied in-memory replacements for on-disk unit contents,
/// typically a single unsaved editor buffer.
///
/// Overlay contents shadow both caches and disk for file reads, are never
/// persisted into either cache, and never affect directory listings.
#[derive(Debug, Default, Clone)]
pub struct Overlay {
    entries: HashMap<PathBuf, Arc<[u8]>>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// An overlay with a single replaced unit.
    pub fn single(path: impl Into<PathBuf>, content: impl Into<Arc<[u8]>>) -> Self {
        let mut overlay = Self::new();
        overlay.insert(path, content);
        overlay
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<Arc<[u8]>>) {
        self.entries.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &Path) -> Option<&Arc<[u8]>> {
        self.entries.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The single filesystem entry point handed to the frontend and to every
/// resolution tier.
///
/// File reads consult the overlay first (byte-exact path match), then the
/// file cache, then disk. Directory reads always go through the directory
/// cache and never see the overlay. Shared references are enough for the
/// locator's worker threads; the caches synchronize internally.
pub struct Vfs<'a> {
    overlay: &'a Overlay,
    files: &'a FileCache,
    dirs: &'a DirCache,
}

impl<'a> Vfs<'a> {
    pub fn new(overlay: &'a Overlay, files: &'a FileCache, dirs: &'a DirCache) -> Self {
        Self {
            overlay,
            files,
            dirs,
        }
    }

    /// Opens a unit for reading, preferring overlay content.
    pub fn open(&self, path: &Path) -> Result<FileReader> {
        if let Some(content) = self.overlay.get(path) {
            return Ok(FileReader::new(content.clone()));
        }
        self.files.open(path)
    }

    /// Reads a unit's full contents as a shared buffer.
    pub fn read(&self, path: &Path) -> Result<Arc<[u8]>> {
        self.open(path).map(|reader| reader.contents())
    }

    /// Lists a directory through the directory cache.
    pub fn read_dir(&self, path: &Path) -> Result<Arc<DirEntry>> {
        self.dirs.read_dir(path)
    }
}
