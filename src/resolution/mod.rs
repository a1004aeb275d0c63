//! The three-tier definition resolution strategy.
//!
//! Tiers run in strict priority order: the single-unit fast path, the
//! concurrent cross-unit member locator (only for qualified references the
//! fast path could not bind), and finally the whole-package resolver.

pub mod fast_path;
pub mod member_locator;
pub mod program;
pub mod resolver;

use std::path::PathBuf;

pub use member_locator::MemberLocator;
pub use resolver::{Definition, DefinitionResolver, TierCounts};

/// A declaration location before byte-offset translation: the declaring
/// unit, the offset of the declaration name, and a `<kind> <name>` label.
#[derive(Debug, Clone)]
pub struct RawDefinition {
    pub path: PathBuf,
    pub offset: usize,
    pub label: String,
}
