use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::errors::{DefjumpError, Result};

/// Default byte ceiling for the file content cache: 128 MiB.
pub const DEFAULT_FILE_CACHE_BYTES: u64 = 128 * 1024 * 1024;

/// Default entry ceiling for the directory listing cache.
pub const DEFAULT_DIR_CACHE_ENTRIES: usize = 4096;

/// Configuration for a resolver instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefjumpConfig {
    /// GOPATH-style source roots, each holding packages beneath `src/`.
    pub source_roots: Vec<PathBuf>,
    /// Byte ceiling for the file content cache (0 = unbounded).
    pub file_cache_bytes: u64,
    /// Entry ceiling for the directory listing cache (0 = unbounded).
    pub dir_cache_entries: usize,
    /// Worker parallelism for the cross-unit member search. Defaults to
    /// the available hardware parallelism.
    pub parallelism: Option<usize>,
}

impl Default for DefjumpConfig {
    fn default() -> Self {
        Self {
            source_roots: Vec::new(),
            file_cache_bytes: DEFAULT_FILE_CACHE_BYTES,
            dir_cache_entries: DEFAULT_DIR_CACHE_ENTRIES,
            parallelism: None,
        }
    }
}

impl DefjumpConfig {
    /// Builds a configuration from the environment, honoring `GOPATH`
    /// (list-separated) and `GOROOT` as source roots.
    pub fn from_env() -> Self {
        let mut source_roots = Vec::new();
        if let Ok(gopath) = env::var("GOPATH") {
            source_roots.extend(env::split_paths(&gopath));
        }
        if let Ok(goroot) = env::var("GOROOT") {
            source_roots.push(PathBuf::from(goroot));
        }
        Self {
            source_roots,
            ..Self::default()
        }
    }

    /// The worker parallelism to actually use.
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism
            .unwrap_or_else(|| {
                thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

/// Loads a configuration file (JSON) from disk.
///
/// If the file does not exist, returns the default configuration.
pub fn load_config(path: &Path) -> Result<DefjumpConfig> {
    if !path.exists() {
        return Ok(DefjumpConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| DefjumpError::Config {
        message: format!("failed to read config file '{}': {}", path.display(), e),
    })?;

    serde_json::from_str(&contents).map_err(|e| DefjumpError::Config {
        message: format!("failed to parse config file '{}': {}", path.display(), e),
    })
}
