//! Tier 3: whole-package resolution through the binding tables.
//!
//! Loads every unit of the package enclosing the query (falling back to a
//! single-unit program when the unit lies outside all source roots), plus
//! the top-level surface of each imported package, with diagnostics
//! suppressed so a partially invalid program still yields partial
//! bindings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::build::BuildResolver;
use crate::errors::{DefjumpError, Result};
use crate::frontend::bindings::{bind_unit, Binding, ImportedSurface, PackageDecl};
use crate::frontend::{import_base_name, GoFrontend};
use crate::resolution::RawDefinition;
use crate::types::QueryPosition;
use crate::vfs::Vfs;

pub fn resolve(
    frontend: &GoFrontend,
    vfs: &Vfs<'_>,
    build: &dyn BuildResolver,
    qpos: &QueryPosition,
) -> Result<RawDefinition> {
    let dir = qpos
        .path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let files = match build.locate_enclosing_unit(&qpos.path) {
        Ok(location) => {
            debug!(import_path = %location.import_path, "loading enclosing package");
            package_files(vfs, &dir, &qpos.path)?
        }
        // Outside every source root: the unit is its own program.
        Err(_) => vec![qpos.path.clone()],
    };

    let query_unit = frontend.parse_unit(vfs, &qpos.path)?;

    // Package scope is the union of every unit's top-level declarations.
    let mut package_scope: HashMap<String, PackageDecl> = HashMap::new();
    for file in &files {
        let Ok(unit) = frontend.parse_unit(vfs, file) else {
            continue;
        };
        for decl in unit.top_level_decls() {
            package_scope.entry(decl.name).or_insert(PackageDecl {
                kind: decl.kind,
                path: file.clone(),
                offset: decl.offset,
            });
        }
    }

    // The exportable surface of each import, for qualified references. An
    // import that fails to resolve simply contributes no bindings.
    let mut imports: HashMap<String, ImportedSurface> = HashMap::new();
    for spec in query_unit.imports() {
        let reference = match &spec.alias {
            Some(alias) if alias == "." || alias == "_" => continue,
            Some(alias) => alias.clone(),
            None => import_base_name(&spec.path).to_string(),
        };
        let Ok(imported) = build.import_unit(vfs, &spec.path, &dir) else {
            continue;
        };
        let mut members = HashMap::new();
        for file in &imported.files {
            let Ok(unit) = frontend.parse_unit(vfs, file) else {
                continue;
            };
            for decl in unit.top_level_decls() {
                members.entry(decl.name).or_insert(PackageDecl {
                    kind: decl.kind,
                    path: file.clone(),
                    offset: decl.offset,
                });
            }
        }
        imports.insert(
            reference,
            ImportedSurface {
                import_path: spec.path,
                spec_offset: spec.offset,
                members,
            },
        );
    }

    let bindings = bind_unit(&query_unit, &package_scope, &imports);

    let Some(ident) = query_unit.identifier_at(qpos.start, qpos.end) else {
        return Err(DefjumpError::NoIdentifier {
            path: qpos.path.display().to_string(),
            offset: qpos.start,
        });
    };
    let name = query_unit.text(ident).to_string();
    match bindings.lookup(ident.start_byte()) {
        Some(Binding::Source {
            path,
            offset,
            label,
            ..
        }) => Ok(RawDefinition {
            path: path.clone(),
            offset: *offset,
            label: label.clone(),
        }),
        Some(Binding::Builtin { name }) => Err(DefjumpError::BuiltinDeclaration {
            name: name.clone(),
        }),
        None => Err(DefjumpError::NoBindingForIdentifier { name }),
    }
}

/// The units of the package in `dir`: every non-test `.go` file, plus the
/// query unit itself when it is not among them (e.g. a test file).
fn package_files(vfs: &Vfs<'_>, dir: &Path, query_unit: &Path) -> Result<Vec<PathBuf>> {
    let listing = vfs
        .read_dir(dir)
        .map_err(|err| DefjumpError::FrontendLoadFailure {
            message: format!("cannot list package directory {}: {err}", dir.display()),
        })?;
    let mut files: Vec<PathBuf> = listing
        .children()
        .iter()
        .filter(|child| {
            !child.is_dir && child.name.ends_with(".go") && !child.name.ends_with("_test.go")
        })
        .map(|child| dir.join(&child.name))
        .collect();
    if !files.iter().any(|f| f == query_unit) {
        files.push(query_unit.to_path_buf());
    }
    Ok(files)
}
