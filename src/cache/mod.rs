//! Process-lifetime, in-memory caches backing every filesystem read.
//!
//! The generic LRU container carries the recency and eviction mechanics;
//! the file and directory caches wrap it with their own validation rules
//! and a single lock each.

pub mod dir;
pub mod file;
pub mod lru;

pub use dir::{DirCache, DirChild, DirEntry};
pub use file::{FileCache, FileReader};
pub use lru::{BoundStrategy, CacheListener, LruContainer};
