use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tracing::debug;

use crate::cache::lru::{BoundStrategy, LruContainer};
use crate::errors::Result;

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirChild {
    pub name: String,
    pub is_dir: bool,
}

/// An immutable snapshot of a directory listing.
///
/// Children are ordered by name and never individually updated; a stale
/// snapshot is replaced wholesale.
#[derive(Debug)]
pub struct DirEntry {
    children: Vec<DirChild>,
    mod_time: SystemTime,
}

impl DirEntry {
    pub fn children(&self) -> &[DirChild] {
        &self.children
    }
}

/// An entry-bounded cache of directory listings validated by the
/// directory's own modification time.
///
/// Locking mirrors [`FileCache`](crate::cache::FileCache): the lock covers
/// only map/list mutation, enumeration runs unlocked, and a post-I/O
/// re-validation keeps the later-mod-time snapshot on a race.
pub struct DirCache {
    inner: Mutex<LruContainer<PathBuf, Arc<DirEntry>>>,
    listings: AtomicU64,
}

impl DirCache {
    /// Creates a cache holding at most `max_entries` listings (0 = unbounded).
    pub fn new(max_entries: usize) -> Self {
        let bound = match max_entries {
            0 => BoundStrategy::Unbounded,
            max => BoundStrategy::MaxEntries(max),
        };
        Self {
            inner: Mutex::new(LruContainer::new(bound)),
            listings: AtomicU64::new(0),
        }
    }

    /// Returns the listing for `path`, re-enumerating only when the
    /// directory's mod-time no longer matches the cached snapshot.
    pub fn read_dir(&self, path: &Path) -> Result<Arc<DirEntry>> {
        if let Some(entry) = self.lookup(path) {
            match fs::metadata(path) {
                Ok(meta) if meta.modified().is_ok_and(|m| m == entry.mod_time) => {
                    return Ok(entry)
                }
                Ok(_) => self.remove(path),
                Err(err) => {
                    self.remove(path);
                    return Err(err.into());
                }
            }
        }
        self.list(path)
    }

    /// Number of actual directory enumerations performed so far.
    pub fn listings(&self) -> u64 {
        self.listings.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn lock(&self) -> std::sync::MutexGuard<'_, LruContainer<PathBuf, Arc<DirEntry>>> {
        self.inner.lock().expect("dir cache mutex poisoned")
    }

    fn lookup(&self, path: &Path) -> Option<Arc<DirEntry>> {
        let key = path.to_path_buf();
        self.lock().get(&key).cloned()
    }

    fn remove(&self, path: &Path) {
        self.lock().remove(&path.to_path_buf());
    }

    /// Enumerates `path` from disk and installs the snapshot, unless a
    /// newer one was inserted while the enumeration ran unlocked.
    fn list(&self, path: &Path) -> Result<Arc<DirEntry>> {
        let mod_time = fs::metadata(path)?.modified()?;
        self.listings.fetch_add(1, Ordering::Relaxed);

        let mut children = Vec::new();
        for dirent in fs::read_dir(path)? {
            let dirent = dirent?;
            let Ok(name) = dirent.file_name().into_string() else {
                // Go source trees have UTF-8 names; anything else cannot be
                // an import target.
                continue;
            };
            match fs::symlink_metadata(dirent.path()) {
                Ok(meta) => children.push(DirChild {
                    name,
                    is_dir: meta.is_dir(),
                }),
                // The child vanished between enumeration and stat; treat it
                // as if it never existed.
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            }
        }
        children.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(path = %path.display(), children = children.len(), "dir cache relist");

        let entry = Arc::new(DirEntry { children, mod_time });

        let key = path.to_path_buf();
        let mut inner = self.lock();
        if let Some(existing) = inner.get(&key) {
            if existing.mod_time > mod_time {
                return Ok(existing.clone());
            }
        }
        inner.add(key, entry.clone());
        drop(inner);

        Ok(entry)
    }
}
