//! Resolution of units to import paths and import paths to source files.
//!
//! This is the narrow seam the resolution core calls; the only provided
//! implementation walks GOPATH-style source roots, listing candidate
//! directories through the directory cache.

use std::path::{Path, PathBuf};

use crate::errors::{DefjumpError, Result};
use crate::vfs::Vfs;

/// The import identifier of the package enclosing a unit.
#[derive(Debug, Clone)]
pub struct UnitLocation {
    pub import_path: String,
    /// The source root the unit was found beneath.
    pub src_root: PathBuf,
}

/// An importable package: its directory and candidate source files.
#[derive(Debug, Clone)]
pub struct ImportedUnit {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Locates packages for the resolution tiers.
pub trait BuildResolver: Send + Sync {
    /// Maps a unit path to the import identifier of its enclosing package.
    fn locate_enclosing_unit(&self, unit: &Path) -> Result<UnitLocation>;

    /// Resolves an import path to a package directory and its `.go` source
    /// files (test files excluded). Relative import paths are resolved
    /// against `search_dir`, the directory of the importing unit.
    fn import_unit(&self, vfs: &Vfs<'_>, import_path: &str, search_dir: &Path)
        -> Result<ImportedUnit>;
}

/// A [`BuildResolver`] over GOPATH-style source roots, each of which holds
/// packages beneath a `src/` directory.
pub struct SourceRootResolver {
    roots: Vec<PathBuf>,
}

impl SourceRootResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Lists the non-test Go source files of `dir` through the directory
    /// cache. Returns `None` when the directory is missing or has none.
    fn source_files(&self, vfs: &Vfs<'_>, dir: &Path) -> Option<ImportedUnit> {
        let listing = vfs.read_dir(dir).ok()?;
        let files: Vec<PathBuf> = listing
            .children()
            .iter()
            .filter(|child| {
                !child.is_dir
                    && child.name.ends_with(".go")
                    && !child.name.ends_with("_test.go")
            })
            .map(|child| dir.join(&child.name))
            .collect();
        if files.is_empty() {
            return None;
        }
        Some(ImportedUnit {
            dir: dir.to_path_buf(),
            files,
        })
    }
}

impl BuildResolver for SourceRootResolver {
    fn locate_enclosing_unit(&self, unit: &Path) -> Result<UnitLocation> {
        let abs = std::path::absolute(unit)?;
        let dir = abs.parent().unwrap_or(Path::new("/"));

        // Prefer the innermost enclosing root: the one leaving the fewest
        // remaining path segments.
        let mut best: Option<(usize, UnitLocation)> = None;
        for root in &self.roots {
            let src = root.join("src");
            let Ok(rest) = dir.strip_prefix(&src) else {
                continue;
            };
            let segments: Vec<String> = rest
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if segments.is_empty() {
                // A unit sitting directly in src/ belongs to no package.
                continue;
            }
            let depth = segments.len();
            if best.as_ref().map_or(true, |(d, _)| depth < *d) {
                best = Some((
                    depth,
                    UnitLocation {
                        import_path: segments.join("/"),
                        src_root: root.clone(),
                    },
                ));
            }
        }
        best.map(|(_, loc)| loc)
            .ok_or_else(|| DefjumpError::UnitNotFound {
                import_path: dir.display().to_string(),
            })
    }

    fn import_unit(
        &self,
        vfs: &Vfs<'_>,
        import_path: &str,
        search_dir: &Path,
    ) -> Result<ImportedUnit> {
        if import_path.starts_with("./") || import_path.starts_with("../") {
            let dir = search_dir.join(import_path);
            return self
                .source_files(vfs, &dir)
                .ok_or_else(|| DefjumpError::UnitNotFound {
                    import_path: import_path.to_string(),
                });
        }
        for root in &self.roots {
            let dir = root.join("src").join(import_path);
            if let Some(unit) = self.source_files(vfs, &dir) {
                return Ok(unit);
            }
        }
        Err(DefjumpError::UnitNotFound {
            import_path: import_path.to_string(),
        })
    }
}
