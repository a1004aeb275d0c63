use std::fs;
use std::path::PathBuf;

use defjump::config::{
    load_config, DefjumpConfig, DEFAULT_DIR_CACHE_ENTRIES, DEFAULT_FILE_CACHE_BYTES,
};
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = DefjumpConfig::default();
    assert!(config.source_roots.is_empty());
    assert_eq!(config.file_cache_bytes, DEFAULT_FILE_CACHE_BYTES);
    assert_eq!(config.dir_cache_entries, DEFAULT_DIR_CACHE_ENTRIES);
    assert_eq!(config.parallelism, None);
    assert!(config.effective_parallelism() >= 1);
}

#[test]
fn test_explicit_parallelism_wins() {
    let config = DefjumpConfig {
        parallelism: Some(3),
        ..DefjumpConfig::default()
    };
    assert_eq!(config.effective_parallelism(), 3);

    let config = DefjumpConfig {
        parallelism: Some(0),
        ..DefjumpConfig::default()
    };
    assert_eq!(config.effective_parallelism(), 1, "zero workers is clamped");
}

#[test]
fn test_load_config_missing_file_yields_default() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let config = load_config(&dir.path().join("absent.json")).expect("missing file is fine");
    assert_eq!(config, DefjumpConfig::default());
}

#[test]
fn test_load_config_roundtrip() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("config.json");
    let written = DefjumpConfig {
        source_roots: vec![PathBuf::from("/go"), PathBuf::from("/usr/local/go")],
        file_cache_bytes: 1024,
        dir_cache_entries: 16,
        parallelism: Some(2),
    };
    fs::write(&path, serde_json::to_string_pretty(&written).unwrap()).expect("write failed");

    let loaded = load_config(&path).expect("load should succeed");
    assert_eq!(loaded, written);
}

#[test]
fn test_load_config_rejects_bad_json() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").expect("write failed");
    assert!(load_config(&path).is_err());
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"source_roots": ["/go"]}"#).expect("write failed");

    let loaded = load_config(&path).expect("load should succeed");
    assert_eq!(loaded.source_roots, vec![PathBuf::from("/go")]);
    assert_eq!(loaded.file_cache_bytes, DEFAULT_FILE_CACHE_BYTES);
}
