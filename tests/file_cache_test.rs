use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use defjump::cache::FileCache;
use tempfile::TempDir;

fn write_tmp(dir: &TempDir, name: &str, data: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, data).expect("failed to write temp file");
    path
}

fn read_cached(cache: &FileCache, path: &std::path::Path) -> Vec<u8> {
    let mut reader = cache.open(path).expect("open should succeed");
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).expect("read should succeed");
    buf
}

#[test]
fn test_cached_reread_skips_disk() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = write_tmp(&dir, "a.go", "Hello, World!");
    let cache = FileCache::new(0);

    assert_eq!(read_cached(&cache, &path), b"Hello, World!");
    assert_eq!(cache.disk_reads(), 1);

    // Byte-identical content, and no second disk read.
    assert_eq!(read_cached(&cache, &path), b"Hello, World!");
    assert_eq!(cache.disk_reads(), 1, "unmodified file must be served from cache");
}

#[test]
fn test_modified_file_invalidates_entry() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = write_tmp(&dir, "a.go", "Hello, World!");
    let cache = FileCache::new(0);
    assert_eq!(read_cached(&cache, &path), b"Hello, World!");

    // Differing lengths keep the staleness check independent of the
    // filesystem's timestamp resolution.
    let modified = [
        "HELLO, WORLD",
        "hello, world!!!",
        "Welp - hope this worked",
    ];
    for (i, content) in modified.iter().enumerate() {
        fs::write(&path, content).expect("failed to rewrite file");
        assert_eq!(read_cached(&cache, &path), content.as_bytes());
        assert_eq!(cache.disk_reads(), i as u64 + 2);
    }
}

#[test]
fn test_removed_file_errors_and_drops_entry() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = write_tmp(&dir, "a.go", "data");
    let cache = FileCache::new(0);
    assert_eq!(read_cached(&cache, &path), b"data");

    fs::remove_file(&path).expect("failed to remove file");
    assert!(cache.open(&path).is_err(), "removed file must not serve stale content");
    assert_eq!(cache.len(), 0, "the stale entry is evicted, not kept");
}

#[test]
fn test_open_with_stat_skips_redundant_stat() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = write_tmp(&dir, "a.go", "stat me");
    let cache = FileCache::new(0);

    let meta = fs::metadata(&path).expect("stat should succeed");
    let mut reader = cache
        .open_with_stat(&path, &meta)
        .expect("open_with_stat should succeed");
    let mut buf = String::new();
    reader.read_to_string(&mut buf).expect("read should succeed");
    assert_eq!(buf, "stat me");

    // The cached entry matches the same stat on the second call.
    let reader = cache
        .open_with_stat(&path, &meta)
        .expect("open_with_stat should hit the cache");
    assert_eq!(reader.bytes(), b"stat me");
    assert_eq!(cache.disk_reads(), 1);
}

#[test]
fn test_cursors_are_independent() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = write_tmp(&dir, "a.go", "abcdefgh");
    let cache = FileCache::new(0);

    let mut first = cache.open(&path).expect("open should succeed");
    let mut second = cache.open(&path).expect("open should succeed");

    let mut buf = [0u8; 4];
    first.read_exact(&mut buf).expect("read should succeed");
    assert_eq!(&buf, b"abcd");

    // The second cursor is unaffected by the first one's progress.
    second.read_exact(&mut buf).expect("read should succeed");
    assert_eq!(&buf, b"abcd");

    // Random access never moves the cursor.
    let n = first.read_at(&mut buf, 6);
    assert_eq!(&buf[..n], b"gh");
    assert_eq!(first.bytes(), b"efgh");

    // Seek and re-read.
    first.seek(SeekFrom::Start(0)).expect("seek should succeed");
    let mut all = Vec::new();
    first.read_to_end(&mut all).expect("read should succeed");
    assert_eq!(all, b"abcdefgh");
}

#[test]
fn test_total_bytes_accounting() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let a = write_tmp(&dir, "a.go", "12345");
    let b = write_tmp(&dir, "b.go", "1234567890");
    let cache = FileCache::new(0);

    cache.open(&a).expect("open should succeed");
    assert_eq!(cache.total_bytes(), 5);
    cache.open(&b).expect("open should succeed");
    assert_eq!(cache.total_bytes(), 15);
}

#[test]
fn test_byte_ceiling_evicts_least_recently_used() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let a = write_tmp(&dir, "a.go", "aaaaaaaa"); // 8 bytes
    let b = write_tmp(&dir, "b.go", "bbbbbbbb"); // 8 bytes
    let cache = FileCache::new(12);

    cache.open(&a).expect("open should succeed");
    assert_eq!(cache.len(), 1);

    // 16 >= 12 after inserting b: a is evicted, b stays resident.
    let reader = cache.open(&b).expect("open should succeed");
    assert_eq!(reader.bytes(), b"bbbbbbbb");
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.total_bytes(), 8);

    // Re-opening a reads from disk again.
    cache.open(&a).expect("open should succeed");
    assert_eq!(cache.disk_reads(), 3);
}
