//! Tier 1: single-unit resolution through the lexical binder.

use crate::errors::{DefjumpError, Result};
use crate::frontend::{scope, GoFrontend};
use crate::resolution::RawDefinition;
use crate::types::QueryPosition;
use crate::vfs::Vfs;

/// Outcome of the fast path.
pub enum FastPath {
    /// The unit's own scope information bound the identifier.
    Resolved(RawDefinition),
    /// The identifier is the member side of a qualified reference whose
    /// operand names an import; tier 2 should search that package.
    Qualified {
        import_path: String,
        member: String,
    },
    /// Nothing the fast path can do; the carried error is surfaced only if
    /// the final tier also fails.
    Fallthrough(DefjumpError),
}

/// Parses only the queried unit and tries to bind the identifier under the
/// query range locally.
pub fn resolve(frontend: &GoFrontend, vfs: &Vfs<'_>, qpos: &QueryPosition) -> Result<FastPath> {
    let unit = frontend.parse_unit(vfs, &qpos.path)?;
    let Some(ident) = unit.identifier_at(qpos.start, qpos.end) else {
        return Ok(FastPath::Fallthrough(DefjumpError::NoIdentifier {
            path: qpos.path.display().to_string(),
            offset: qpos.start,
        }));
    };
    let name = unit.text(ident).to_string();

    if let Some(decl) = scope::resolve_in_unit(&unit, ident) {
        return Ok(FastPath::Resolved(RawDefinition {
            path: qpos.path.clone(),
            offset: decl.offset,
            label: format!("{} {}", decl.kind, name),
        }));
    }

    if let Some(qref) = scope::qualified_reference(&unit, ident) {
        return Ok(FastPath::Qualified {
            import_path: qref.import_path,
            member: name,
        });
    }

    Ok(FastPath::Fallthrough(DefjumpError::UnresolvedIdentifier {
        name,
    }))
}
