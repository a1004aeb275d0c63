//! The resolution coordinator: owns the caches, runs the tiers in strict
//! priority order, and maps the winning declaration into the output
//! position format.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::build::{BuildResolver, SourceRootResolver};
use crate::cache::{DirCache, FileCache};
use crate::config::DefjumpConfig;
use crate::errors::{DefjumpError, Result};
use crate::frontend::GoFrontend;
use crate::resolution::fast_path::{self, FastPath};
use crate::resolution::{program, MemberLocator, RawDefinition};
use crate::types::{check_offsets, parse_query, position_at, Position, QueryPosition};
use crate::vfs::{Overlay, Vfs};

/// A successfully resolved definition: where the identifier was declared,
/// a human-readable `<kind> <qualified-name>` label, and the declaring
/// unit's raw content.
#[derive(Debug, Clone)]
pub struct Definition {
    pub position: Position,
    pub label: String,
    pub content: Vec<u8>,
}

/// Snapshot of how many times each tier has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierCounts {
    pub fast_path: u64,
    pub member_locator: u64,
    pub program: u64,
}

/// Orchestrates the three resolution tiers over explicitly owned caches.
///
/// Instances are shared across concurrent queries; the caches synchronize
/// internally, and there is deliberately no coordinator-level lock.
pub struct DefinitionResolver {
    files: FileCache,
    dirs: DirCache,
    frontend: GoFrontend,
    build: Box<dyn BuildResolver>,
    parallelism: usize,
    fast_path_runs: AtomicU64,
    member_locator_runs: AtomicU64,
    program_runs: AtomicU64,
}

impl DefinitionResolver {
    pub fn new(config: DefjumpConfig) -> Self {
        let build = Box::new(SourceRootResolver::new(config.source_roots.clone()));
        Self::with_build_resolver(config, build)
    }

    /// Builds a resolver with a custom build resolver (tests, editors with
    /// their own project model).
    pub fn with_build_resolver(config: DefjumpConfig, build: Box<dyn BuildResolver>) -> Self {
        Self {
            files: FileCache::new(config.file_cache_bytes),
            dirs: DirCache::new(config.dir_cache_entries),
            frontend: GoFrontend::new(),
            build,
            parallelism: config.effective_parallelism(),
            fast_path_runs: AtomicU64::new(0),
            member_locator_runs: AtomicU64::new(0),
            program_runs: AtomicU64::new(0),
        }
    }

    /// Resolves a textual query of the form `<path>:#<start>[,#<end>]`.
    pub fn define(&self, query: &str, overlay: &Overlay) -> Result<Definition> {
        let qpos = parse_query(query)?;
        self.define_at(&qpos, overlay)
    }

    /// Resolves a point query, optionally with the unit's unsaved content.
    pub fn define_source(
        &self,
        path: &Path,
        offset: usize,
        source: Option<&[u8]>,
    ) -> Result<Definition> {
        let overlay = match source {
            Some(bytes) => Overlay::single(path, bytes),
            None => Overlay::new(),
        };
        let qpos = QueryPosition {
            path: path.to_path_buf(),
            start: offset,
            end: offset,
        };
        self.define_at(&qpos, &overlay)
    }

    /// Per-tier invocation counters.
    pub fn tier_counts(&self) -> TierCounts {
        TierCounts {
            fast_path: self.fast_path_runs.load(Ordering::Relaxed),
            member_locator: self.member_locator_runs.load(Ordering::Relaxed),
            program: self.program_runs.load(Ordering::Relaxed),
        }
    }

    pub fn file_cache(&self) -> &FileCache {
        &self.files
    }

    pub fn dir_cache(&self) -> &DirCache {
        &self.dirs
    }

    fn define_at(&self, qpos: &QueryPosition, overlay: &Overlay) -> Result<Definition> {
        let vfs = Vfs::new(overlay, &self.files, &self.dirs);

        // Range-check the offsets against the unit before any parsing.
        let source = vfs.read(&qpos.path)?;
        check_offsets(qpos, source.len())?;

        self.fast_path_runs.fetch_add(1, Ordering::Relaxed);
        let fallthrough = match fast_path::resolve(&self.frontend, &vfs, qpos)? {
            FastPath::Resolved(raw) => return self.finish(&vfs, raw),
            FastPath::Qualified {
                import_path,
                member,
            } => {
                self.member_locator_runs.fetch_add(1, Ordering::Relaxed);
                let search_dir = qpos.path.parent().unwrap_or(Path::new("."));
                let located = self
                    .build
                    .import_unit(&vfs, &import_path, search_dir)
                    .and_then(|unit| {
                        MemberLocator::new(&self.frontend, &vfs, self.parallelism).locate(
                            &import_path,
                            &unit,
                            &member,
                        )
                    });
                match located {
                    Ok(raw) => return self.finish(&vfs, raw),
                    Err(err) => err,
                }
            }
            FastPath::Fallthrough(err) => err,
        };
        debug!(error = %fallthrough, "falling back to whole-program resolution");

        self.program_runs.fetch_add(1, Ordering::Relaxed);
        match program::resolve(&self.frontend, &vfs, self.build.as_ref(), qpos) {
            Ok(raw) => self.finish(&vfs, raw),
            // A failed member search is more specific than the program
            // tier's generic miss; surface it once the final tier fails.
            Err(DefjumpError::NoBindingForIdentifier { .. })
                if matches!(
                    fallthrough,
                    DefjumpError::MemberNotFound { .. } | DefjumpError::UnitNotFound { .. }
                ) =>
            {
                Err(fallthrough)
            }
            Err(err) => Err(err),
        }
    }

    /// Translates the winning declaration into the output position format
    /// and attaches the declaring unit's content.
    fn finish(&self, vfs: &Vfs<'_>, raw: RawDefinition) -> Result<Definition> {
        let content = vfs.read(&raw.path)?;
        let position = position_at(&raw.path, &content, raw.offset);
        debug!(position = %position, label = %raw.label, "definition resolved");
        Ok(Definition {
            position,
            label: raw.label,
            content: content.to_vec(),
        })
    }
}
