//! Single-unit lexical binding.
//!
//! Links an identifier reference to a declaration visible within the unit
//! alone: enclosing blocks, statement initializers, parameters, receivers,
//! labels, and the unit's own top-level declarations. This is the fast
//! path's entire view of the world; whole-package resolution lives in
//! [`bindings`](crate::frontend::bindings).

use tree_sitter::Node;

use crate::frontend::{import_base_name, is_exported, ParsedUnit};

/// A declaration found within the unit.
#[derive(Debug, Clone, Copy)]
pub struct LocalDecl {
    pub kind: &'static str,
    pub offset: usize,
}

/// A reference classified as `package.Member`.
#[derive(Debug, Clone)]
pub struct QualifiedRef {
    pub package: String,
    pub import_path: String,
}

/// Resolves `ident` against the unit's lexical scopes.
///
/// Declarations are scanned whole-block without honoring statement order;
/// the fast path is allowed to be unsound and a miss merely falls through
/// to a stronger tier.
pub fn resolve_in_unit(unit: &ParsedUnit, ident: Node<'_>) -> Option<LocalDecl> {
    let name = unit.text(ident);
    if name.is_empty() || name == "_" {
        return None;
    }
    if ident.kind() == "label_name" {
        return resolve_label(unit, ident, name);
    }
    // The declaration name itself binds to its own position.
    if let Some(kind) = declaration_kind(unit, ident) {
        return Some(LocalDecl {
            kind,
            offset: ident.start_byte(),
        });
    }
    let mut node = ident;
    while let Some(parent) = node.parent() {
        if let Some(decl) = scope_declaration(unit, parent, name) {
            return Some(decl);
        }
        node = parent;
    }
    None
}

/// Returns the declaration kind when `ident` is itself a declaration name.
///
/// Import aliases are deliberately excluded: the fast path leaves package
/// names to the whole-program tier, mirroring how a parser-level resolver
/// never binds imports.
pub fn declaration_kind(unit: &ParsedUnit, ident: Node<'_>) -> Option<&'static str> {
    let parent = ident.parent()?;
    let named_by = |field: &str| parent.child_by_field_name(field) == Some(ident);
    let among = |field: &str| {
        let mut cursor = parent.walk();
        let found = parent
            .children_by_field_name(field, &mut cursor)
            .any(|n| n == ident);
        found
    };
    match parent.kind() {
        "function_declaration" | "method_declaration" if named_by("name") => Some("func"),
        "type_spec" | "type_alias" if named_by("name") => Some("type"),
        "type_parameter_declaration" if among("name") => Some("type"),
        "const_spec" if among("name") => Some("const"),
        "var_spec" if among("name") => Some("var"),
        "parameter_declaration" | "variadic_parameter_declaration" if among("name") => Some("var"),
        "field_declaration" if among("name") => Some("field"),
        // The grammar renamed method_spec to method_elem; accept both.
        "method_spec" | "method_elem" if named_by("name") => Some("func"),
        "labeled_statement" if named_by("label") => Some("label"),
        "expression_list" => {
            let list = parent;
            let stmt = list.parent()?;
            let declares = match stmt.kind() {
                "short_var_declaration" => stmt.child_by_field_name("left") == Some(list),
                "range_clause" => {
                    stmt.child_by_field_name("left") == Some(list) && range_declares(stmt)
                }
                _ => false,
            };
            (declares && list_contains(list, ident)).then_some("var")
        }
        _ => None,
    }
}

/// Classifies `ident` as the member side of a qualified reference `X.Y`:
/// `X` must be an unbound plain identifier naming an import of this unit,
/// and `Y` must look exported.
///
/// Best-effort by design: a package-level declaration in a sibling file can
/// shadow an import name and still classify here.
pub fn qualified_reference(unit: &ParsedUnit, ident: Node<'_>) -> Option<QualifiedRef> {
    let member = unit.text(ident);
    if !is_exported(member) {
        return None;
    }
    let parent = ident.parent()?;
    let operand = match parent.kind() {
        "selector_expression" if parent.child_by_field_name("field") == Some(ident) => {
            parent.child_by_field_name("operand")?
        }
        "qualified_type" if parent.child_by_field_name("name") == Some(ident) => {
            parent.child_by_field_name("package")?
        }
        _ => return None,
    };
    if !matches!(operand.kind(), "identifier" | "package_identifier") {
        return None;
    }
    // A binding for the operand means it denotes a value, not a package.
    if resolve_in_unit(unit, operand).is_some() {
        return None;
    }
    let package = unit.text(operand);
    let import_path = unit.imports().into_iter().find_map(|imp| match &imp.alias {
        Some(alias) => (alias == package).then_some(imp.path),
        None => (import_base_name(&imp.path) == package).then_some(imp.path),
    })?;
    Some(QualifiedRef {
        package: package.to_string(),
        import_path,
    })
}

// ---------------------------------------------------------------------------
// Scope scanning
// ---------------------------------------------------------------------------

/// Looks for a declaration of `name` introduced by the given scope node.
fn scope_declaration(unit: &ParsedUnit, scope: Node<'_>, name: &str) -> Option<LocalDecl> {
    match scope.kind() {
        // Case clauses hold their statements directly, like blocks.
        "block" | "source_file" | "expression_case" | "type_case" | "default_case"
        | "communication_case" => {
            let top_level = scope.kind() == "source_file";
            let mut cursor = scope.walk();
            let found = scope
                .named_children(&mut cursor)
                .find_map(|stmt| statement_declaration(unit, stmt, name, top_level));
            found
        }
        "if_statement" | "expression_switch_statement" | "type_switch_statement" => scope
            .child_by_field_name("initializer")
            .and_then(|init| statement_declaration(unit, init, name, false)),
        "for_statement" => {
            let mut cursor = scope.walk();
            let found = scope.named_children(&mut cursor).find_map(|clause| {
                match clause.kind() {
                    "for_clause" => clause
                        .child_by_field_name("initializer")
                        .and_then(|init| statement_declaration(unit, init, name, false)),
                    "range_clause" if range_declares(clause) => clause
                        .child_by_field_name("left")
                        .and_then(|left| find_in_list(unit, left, name))
                        .map(|offset| LocalDecl {
                            kind: "var",
                            offset,
                        }),
                    _ => None,
                }
            });
            found
        }
        "function_declaration" | "method_declaration" | "func_literal" => {
            function_scope_declaration(unit, scope, name)
        }
        _ => None,
    }
}

/// Looks for a declaration of `name` in a single statement.
fn statement_declaration(
    unit: &ParsedUnit,
    stmt: Node<'_>,
    name: &str,
    top_level: bool,
) -> Option<LocalDecl> {
    match stmt.kind() {
        "short_var_declaration" => stmt
            .child_by_field_name("left")
            .and_then(|left| find_in_list(unit, left, name))
            .map(|offset| LocalDecl {
                kind: "var",
                offset,
            }),
        "var_declaration" => spec_declaration(unit, stmt, "var_spec", "var", name),
        "const_declaration" => spec_declaration(unit, stmt, "const_spec", "const", name),
        "type_declaration" => {
            let mut cursor = stmt.walk();
            let found = stmt.named_children(&mut cursor).find_map(|spec| {
                if !matches!(spec.kind(), "type_spec" | "type_alias") {
                    return None;
                }
                let name_node = spec.child_by_field_name("name")?;
                (unit.text(name_node) == name).then(|| LocalDecl {
                    kind: "type",
                    offset: name_node.start_byte(),
                })
            });
            found
        }
        "function_declaration" if top_level => {
            let name_node = stmt.child_by_field_name("name")?;
            (unit.text(name_node) == name).then(|| LocalDecl {
                kind: "func",
                offset: name_node.start_byte(),
            })
        }
        _ => None,
    }
}

fn spec_declaration(
    unit: &ParsedUnit,
    decl: Node<'_>,
    spec_kind: &str,
    kind: &'static str,
    name: &str,
) -> Option<LocalDecl> {
    let mut cursor = decl.walk();
    let found = decl.named_children(&mut cursor).find_map(|spec| {
        if spec.kind() != spec_kind {
            return None;
        }
        let mut name_cursor = spec.walk();
        let hit = spec
            .children_by_field_name("name", &mut name_cursor)
            .find(|n| unit.text(*n) == name)
            .map(|n| LocalDecl {
                kind,
                offset: n.start_byte(),
            });
        hit
    });
    found
}

/// Parameters, named results, receiver, and type parameters of a function.
fn function_scope_declaration(
    unit: &ParsedUnit,
    func: Node<'_>,
    name: &str,
) -> Option<LocalDecl> {
    for field in ["parameters", "result", "receiver"] {
        let Some(list) = func.child_by_field_name(field) else {
            continue;
        };
        if list.kind() != "parameter_list" {
            continue;
        }
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            if !matches!(
                param.kind(),
                "parameter_declaration" | "variadic_parameter_declaration"
            ) {
                continue;
            }
            let mut name_cursor = param.walk();
            let hit = param
                .children_by_field_name("name", &mut name_cursor)
                .find(|n| unit.text(*n) == name);
            if let Some(n) = hit {
                return Some(LocalDecl {
                    kind: "var",
                    offset: n.start_byte(),
                });
            }
        }
    }
    if let Some(params) = func.child_by_field_name("type_parameters") {
        let mut cursor = params.walk();
        for decl in params.named_children(&mut cursor) {
            if decl.kind() != "type_parameter_declaration" {
                continue;
            }
            let mut name_cursor = decl.walk();
            let hit = decl
                .children_by_field_name("name", &mut name_cursor)
                .find(|n| unit.text(*n) == name);
            if let Some(n) = hit {
                return Some(LocalDecl {
                    kind: "type",
                    offset: n.start_byte(),
                });
            }
        }
    }
    None
}

/// Labels live in their own namespace, scoped to the enclosing function.
fn resolve_label(unit: &ParsedUnit, ident: Node<'_>, name: &str) -> Option<LocalDecl> {
    let mut func = ident;
    while let Some(parent) = func.parent() {
        func = parent;
        if matches!(
            func.kind(),
            "function_declaration" | "method_declaration" | "func_literal"
        ) {
            break;
        }
    }
    find_label(unit, func, name)
}

fn find_label(unit: &ParsedUnit, node: Node<'_>, name: &str) -> Option<LocalDecl> {
    if node.kind() == "labeled_statement" {
        if let Some(label) = node.child_by_field_name("label") {
            if unit.text(label) == name {
                return Some(LocalDecl {
                    kind: "label",
                    offset: label.start_byte(),
                });
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        // Nested function literals get their own label namespace.
        if child.kind() == "func_literal" {
            continue;
        }
        if let Some(decl) = find_label(unit, child, name) {
            return Some(decl);
        }
    }
    None
}

/// Whether a range clause declares its left-hand identifiers (`:=`).
fn range_declares(clause: Node<'_>) -> bool {
    let mut cursor = clause.walk();
    let mut found = false;
    if cursor.goto_first_child() {
        loop {
            if cursor.node().kind() == ":=" {
                found = true;
                break;
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    found
}

fn find_in_list(unit: &ParsedUnit, list: Node<'_>, name: &str) -> Option<usize> {
    let mut cursor = list.walk();
    let found = list
        .named_children(&mut cursor)
        .find(|n| n.kind() == "identifier" && unit.text(*n) == name)
        .map(|n| n.start_byte());
    found
}

fn list_contains(list: Node<'_>, ident: Node<'_>) -> bool {
    let mut cursor = list.walk();
    let found = list.named_children(&mut cursor).any(|n| n == ident);
    found
}
