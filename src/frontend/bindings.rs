//! Whole-package binding tables.
//!
//! [`bind_unit`] walks every identifier in a query unit and records where
//! it binds: the `uses` table links references to declarations, the `defs`
//! table links declaration names to themselves. Resolution order per
//! identifier is lexical scope, then package scope (all units of the
//! package), then imported package surfaces, then the predeclared universe
//! scope.

use std::collections::HashMap;
use std::path::PathBuf;

use tree_sitter::Node;

use crate::frontend::{is_identifier_kind, scope, ParsedUnit};

/// Names predeclared in Go's universe scope.
const PREDECLARED: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "true",
    "false",
    "iota",
    "nil",
    "append",
    "cap",
    "clear",
    "close",
    "complex",
    "copy",
    "delete",
    "imag",
    "len",
    "make",
    "max",
    "min",
    "new",
    "panic",
    "print",
    "println",
    "real",
    "recover",
];

pub fn is_predeclared(name: &str) -> bool {
    PREDECLARED.contains(&name)
}

/// Where an identifier binds.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A declaration with a real source position.
    Source {
        kind: &'static str,
        path: PathBuf,
        offset: usize,
        label: String,
    },
    /// A predeclared entity with no source position.
    Builtin { name: String },
}

/// A declaration visible at package scope.
#[derive(Debug, Clone)]
pub struct PackageDecl {
    pub kind: &'static str,
    pub path: PathBuf,
    pub offset: usize,
}

/// The top-level surface of one imported package, as seen from the query
/// unit.
pub struct ImportedSurface {
    pub import_path: String,
    /// Byte offset of the import spec inside the query unit; the package
    /// name itself binds there.
    pub spec_offset: usize,
    pub members: HashMap<String, PackageDecl>,
}

/// Per-identifier binding tables for one unit, keyed by the identifier's
/// byte offset.
pub struct ProgramBindings {
    uses: HashMap<usize, Binding>,
    defs: HashMap<usize, Binding>,
}

impl ProgramBindings {
    /// A node can be both a use and a def (an anonymous embedded field is
    /// a use of a type and the def of a field); the use is preferred.
    pub fn lookup(&self, offset: usize) -> Option<&Binding> {
        self.uses.get(&offset).or_else(|| self.defs.get(&offset))
    }
}

/// Builds the binding tables for `unit` against the assembled package
/// scope and imported surfaces.
pub fn bind_unit(
    unit: &ParsedUnit,
    package_scope: &HashMap<String, PackageDecl>,
    imports: &HashMap<String, ImportedSurface>,
) -> ProgramBindings {
    let mut bindings = ProgramBindings {
        uses: HashMap::new(),
        defs: HashMap::new(),
    };
    let mut idents = Vec::new();
    collect_identifiers(unit.root(), &mut idents);
    for ident in idents {
        bind_identifier(unit, ident, package_scope, imports, &mut bindings);
    }
    bindings
}

fn collect_identifiers<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if is_identifier_kind(node.kind()) {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_identifiers(child, out);
    }
}

fn bind_identifier(
    unit: &ParsedUnit,
    ident: Node<'_>,
    package_scope: &HashMap<String, PackageDecl>,
    imports: &HashMap<String, ImportedSurface>,
    bindings: &mut ProgramBindings,
) {
    let name = unit.text(ident);
    if name.is_empty() || name == "_" {
        return;
    }
    let offset = ident.start_byte();
    let parent_kind = ident.parent().map(|p| p.kind()).unwrap_or("");

    // The package clause name denotes no object.
    if parent_kind == "package_clause" {
        return;
    }

    // An import alias defines the package name within this unit.
    if parent_kind == "import_spec" {
        bindings.defs.insert(
            offset,
            Binding::Source {
                kind: "package",
                path: unit.path().to_path_buf(),
                offset,
                label: format!("package {name}"),
            },
        );
        return;
    }

    if let Some(kind) = scope::declaration_kind(unit, ident) {
        bindings.defs.insert(
            offset,
            Binding::Source {
                kind,
                path: unit.path().to_path_buf(),
                offset,
                label: format!("{kind} {name}"),
            },
        );
        return;
    }

    // Member side of a selector: resolvable only when the operand names an
    // imported package. Field or method selection on a typed value needs a
    // real type checker and stays unbound.
    if let Some(operand) = selector_operand(ident) {
        let op_name = unit.text(operand);
        if scope::resolve_in_unit(unit, operand).is_none() {
            if let Some(surface) = imports.get(op_name) {
                if let Some(member) = surface.members.get(name) {
                    bindings.uses.insert(
                        offset,
                        Binding::Source {
                            kind: member.kind,
                            path: member.path.clone(),
                            offset: member.offset,
                            label: format!("{} {}.{}", member.kind, op_name, name),
                        },
                    );
                }
            }
        }
        return;
    }

    if let Some(decl) = scope::resolve_in_unit(unit, ident) {
        bindings.uses.insert(
            offset,
            Binding::Source {
                kind: decl.kind,
                path: unit.path().to_path_buf(),
                offset: decl.offset,
                label: format!("{} {}", decl.kind, name),
            },
        );
        return;
    }

    if let Some(decl) = package_scope.get(name) {
        bindings.uses.insert(
            offset,
            Binding::Source {
                kind: decl.kind,
                path: decl.path.clone(),
                offset: decl.offset,
                label: format!("{} {}", decl.kind, name),
            },
        );
        return;
    }

    // A bare package reference (the operand side of a selector).
    if let Some(surface) = imports.get(name) {
        bindings.uses.insert(
            offset,
            Binding::Source {
                kind: "package",
                path: unit.path().to_path_buf(),
                offset: surface.spec_offset,
                label: format!("package {name}"),
            },
        );
        return;
    }

    if is_predeclared(name) {
        bindings.uses.insert(
            offset,
            Binding::Builtin {
                name: name.to_string(),
            },
        );
    }
}

/// Returns the operand node when `ident` is the member side of a selector
/// expression or qualified type.
fn selector_operand<'t>(ident: Node<'t>) -> Option<Node<'t>> {
    let parent = ident.parent()?;
    match parent.kind() {
        "selector_expression" if parent.child_by_field_name("field") == Some(ident) => {
            parent.child_by_field_name("operand")
        }
        "qualified_type" if parent.child_by_field_name("name") == Some(ident) => {
            parent.child_by_field_name("package")
        }
        _ => None,
    }
}
