use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tracing::debug;

use crate::cache::lru::{BoundStrategy, CacheListener, LruContainer};
use crate::errors::Result;

/// Files whose stat size is at or above this are read without preallocating
/// a matching buffer, in case the reported size is implausible.
const MAX_PREALLOC: u64 = 1 << 30;

/// An immutable snapshot of a file's contents.
///
/// Entries are replaced, never mutated, when staleness is detected, so any
/// number of cursors may read the shared buffer concurrently.
pub struct FileEntry {
    data: Arc<[u8]>,
    mod_time: SystemTime,
    size: u64,
}

impl FileEntry {
    /// Returns `true` if the entry still describes the file behind `meta`.
    fn matches(&self, meta: &fs::Metadata) -> bool {
        self.size == meta.len() && meta.modified().is_ok_and(|m| m == self.mod_time)
    }
}

/// An independent read cursor over a cached file buffer.
///
/// Supports forward reads, seeking, random-access reads, and bulk access to
/// the underlying bytes. Cursors never mutate the shared buffer.
pub struct FileReader {
    data: Arc<[u8]>,
    pos: usize,
}

impl FileReader {
    pub(crate) fn new(data: Arc<[u8]>) -> Self {
        Self { data, pos: 0 }
    }

    /// Total length of the underlying buffer, independent of the cursor.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The bytes remaining after the cursor.
    pub fn bytes(&self) -> &[u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    /// A shared handle to the full buffer, ignoring the cursor.
    pub fn contents(&self) -> Arc<[u8]> {
        self.data.clone()
    }

    /// Reads at `offset` without moving the cursor. Returns the number of
    /// bytes copied; zero when `offset` is at or past the end.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> usize {
        let offset = offset.min(self.data.len() as u64) as usize;
        let src = &self.data[offset..];
        let n = src.len().min(buf.len());
        buf[..n].copy_from_slice(&src[..n]);
        n
    }
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = FileReader::bytes(self);
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Seek for FileReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let abs = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::Current(offset) => self.pos as i64 + offset,
            SeekFrom::End(offset) => self.data.len() as i64 + offset,
        };
        if abs < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative position",
            ));
        }
        self.pos = abs as usize;
        Ok(abs as u64)
    }
}

/// Listener that keeps the shared byte total in step with the container.
struct ByteSizeListener {
    total: Arc<AtomicU64>,
}

impl CacheListener<PathBuf, Arc<FileEntry>> for ByteSizeListener {
    fn on_added(&mut self, _key: &PathBuf, value: &Arc<FileEntry>) {
        self.total.fetch_add(value.data.len() as u64, Ordering::Relaxed);
    }

    fn on_evicted(&mut self, _key: &PathBuf, value: &Arc<FileEntry>) {
        self.total.fetch_sub(value.data.len() as u64, Ordering::Relaxed);
    }
}

/// A byte-bounded cache of file contents validated by size and mod-time.
///
/// One lock guards the map and recency list; disk reads happen with the
/// lock released, and a post-read re-validation keeps whichever entry has
/// the later modification time when two readers race.
pub struct FileCache {
    inner: Mutex<LruContainer<PathBuf, Arc<FileEntry>>>,
    total: Arc<AtomicU64>,
    disk_reads: AtomicU64,
}

impl FileCache {
    /// Creates a cache bounded to `max_bytes` of content (0 = unbounded).
    pub fn new(max_bytes: u64) -> Self {
        let total = Arc::new(AtomicU64::new(0));
        let bound = match max_bytes {
            0 => BoundStrategy::Unbounded,
            ceiling => BoundStrategy::MaxTotalBytes {
                ceiling,
                total: total.clone(),
            },
        };
        let listener = ByteSizeListener {
            total: total.clone(),
        };
        Self {
            inner: Mutex::new(LruContainer::new(bound).with_listener(Box::new(listener))),
            total,
            disk_reads: AtomicU64::new(0),
        }
    }

    /// Opens `path`, serving from the cache when the on-disk size and
    /// mod-time still match; otherwise the entry is evicted and reloaded.
    pub fn open(&self, path: &Path) -> Result<FileReader> {
        if let Some(entry) = self.lookup(path) {
            match fs::metadata(path) {
                Ok(meta) if entry.matches(&meta) => {
                    return Ok(FileReader::new(entry.data.clone()))
                }
                Ok(_) => self.remove(path),
                Err(err) => {
                    self.remove(path);
                    return Err(err.into());
                }
            }
        }
        self.load(path)
    }

    /// Like [`open`](Self::open), but reuses a stat the caller already has
    /// (e.g. from enumerating a directory) instead of issuing another one.
    pub fn open_with_stat(&self, path: &Path, meta: &fs::Metadata) -> Result<FileReader> {
        if let Some(entry) = self.lookup(path) {
            if entry.matches(meta) {
                return Ok(FileReader::new(entry.data.clone()));
            }
            self.remove(path);
        }
        self.load(path)
    }

    /// Total bytes currently held across all entries.
    pub fn total_bytes(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Number of actual disk reads performed so far.
    pub fn disk_reads(&self) -> u64 {
        self.disk_reads.load(Ordering::Relaxed)
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

    fn lock(&self) -> std::sync::MutexGuard<'_, LruContainer<PathBuf, Arc<FileEntry>>> {
        self.inner.lock().expect("file cache mutex poisoned")
    }

    fn lookup(&self, path: &Path) -> Option<Arc<FileEntry>> {
        let key = path.to_path_buf();
        self.lock().get(&key).cloned()
    }

    fn remove(&self, path: &Path) {
        self.lock().remove(&path.to_path_buf());
    }

    /// Reads `path` from disk and installs the entry, unless a newer one
    /// was inserted while the read ran unlocked.
    fn load(&self, path: &Path) -> Result<FileReader> {
        let mut file = fs::File::open(path)?;
        let meta = file.metadata()?;
        self.disk_reads.fetch_add(1, Ordering::Relaxed);

        let size = meta.len();
        let mut buf = Vec::with_capacity(if size < MAX_PREALLOC { size as usize } else { 0 });
        file.read_to_end(&mut buf)?;
        let mod_time = meta.modified()?;
        debug!(path = %path.display(), bytes = buf.len(), "file cache reload");

        let entry = Arc::new(FileEntry {
            data: buf.into(),
            mod_time,
            size,
        });

        let key = path.to_path_buf();
        let mut inner = self.lock();
        // A newer version may have been inserted before we took the lock.
        if let Some(existing) = inner.get(&key) {
            if existing.mod_time > mod_time {
                return Ok(FileReader::new(existing.data.clone()));
            }
        }
        inner.add(key, entry.clone());
        drop(inner);

        Ok(FileReader::new(entry.data.clone()))
    }
}
