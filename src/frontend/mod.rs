//! Tree-sitter based Go language frontend.
//!
//! The resolution tiers consume this seam and never touch the grammar
//! directly: parsing a unit, finding the identifier under a byte range,
//! single-unit lexical binding, the qualified-reference classifier, and
//! the whole-package binding tables all live here.

pub mod bindings;
pub mod scope;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tree_sitter::{Node, Parser, Tree};

use crate::errors::{DefjumpError, Result};
use crate::vfs::Vfs;

/// Go language frontend. Parsing is tolerant of syntax errors; a broken
/// unit still yields a partial tree.
#[derive(Debug, Default)]
pub struct GoFrontend;

impl GoFrontend {
    pub fn new() -> Self {
        Self
    }

    /// Parses a unit, reading its content through the overlay facade so
    /// unsaved edits are honored.
    pub fn parse_unit(&self, vfs: &Vfs<'_>, path: &Path) -> Result<ParsedUnit> {
        let source = vfs.read(path)?;
        let mut parser = Parser::new();
        let language = tree_sitter_go::LANGUAGE;
        parser
            .set_language(&language.into())
            .map_err(|e| DefjumpError::FrontendLoadFailure {
                message: format!("failed to load Go grammar: {e}"),
            })?;
        let tree =
            parser
                .parse(source.as_ref(), None)
                .ok_or_else(|| DefjumpError::FrontendLoadFailure {
                    message: format!("failed to parse {}", path.display()),
                })?;
        Ok(ParsedUnit {
            path: path.to_path_buf(),
            source,
            tree,
        })
    }
}

/// A single parsed unit: its path, source bytes, and syntax tree.
pub struct ParsedUnit {
    path: PathBuf,
    source: Arc<[u8]>,
    tree: Tree,
}

/// An import declared by a unit.
#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// Renaming alias, if any (`x "pkg/path"`). Dot and blank imports keep
    /// their literal `.` / `_` alias and never match a package reference.
    pub alias: Option<String>,
    /// The quoted import path, unquoted.
    pub path: String,
    /// Byte offset of the import spec; the package name binds here.
    pub offset: usize,
}

/// A declaration at the top level of a unit.
#[derive(Debug, Clone)]
pub struct TopLevelDecl {
    pub name: String,
    pub kind: &'static str,
    pub offset: usize,
}

impl ParsedUnit {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// The source text of a node; empty for invalid UTF-8.
    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Finds the smallest identifier node enclosing `[start, end]`.
    ///
    /// A point query sitting immediately after an identifier's last
    /// character still selects it, matching editor cursor behavior.
    pub fn identifier_at(&self, start: usize, end: usize) -> Option<Node<'_>> {
        let root = self.root();
        if let Some(node) = root.named_descendant_for_byte_range(start, end) {
            if is_identifier_kind(node.kind()) {
                return Some(node);
            }
        }
        if start == end && start > 0 {
            if let Some(node) = root.named_descendant_for_byte_range(start - 1, start - 1) {
                if is_identifier_kind(node.kind()) && node.end_byte() == start {
                    return Some(node);
                }
            }
        }
        None
    }

    /// Returns the unit's import table.
    pub fn imports(&self) -> Vec<ImportSpec> {
        let mut specs = Vec::new();
        let root = self.root();
        let mut cursor = root.walk();
        for decl in root.named_children(&mut cursor) {
            if decl.kind() != "import_declaration" {
                continue;
            }
            let mut decl_cursor = decl.walk();
            for child in decl.named_children(&mut decl_cursor) {
                match child.kind() {
                    "import_spec" => self.push_import(child, &mut specs),
                    "import_spec_list" => {
                        let mut list_cursor = child.walk();
                        for spec in child.named_children(&mut list_cursor) {
                            if spec.kind() == "import_spec" {
                                self.push_import(spec, &mut specs);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        specs
    }

    fn push_import(&self, spec: Node<'_>, out: &mut Vec<ImportSpec>) {
        let Some(path_node) = spec.child_by_field_name("path") else {
            return;
        };
        let path = self
            .text(path_node)
            .trim_matches(|c| c == '"' || c == '`')
            .to_string();
        let alias = spec
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string());
        out.push(ImportSpec {
            alias,
            path,
            offset: spec.start_byte(),
        });
    }

    /// Scans the unit's top-level declarations: functions without
    /// receivers, constants, variables, and type definitions.
    pub fn top_level_decls(&self) -> Vec<TopLevelDecl> {
        let mut decls = Vec::new();
        let root = self.root();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "function_declaration" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        decls.push(TopLevelDecl {
                            name: self.text(name).to_string(),
                            kind: "func",
                            offset: name.start_byte(),
                        });
                    }
                }
                "const_declaration" => self.push_spec_names(child, "const_spec", "const", &mut decls),
                "var_declaration" => self.push_spec_names(child, "var_spec", "var", &mut decls),
                "type_declaration" => {
                    let mut decl_cursor = child.walk();
                    for spec in child.named_children(&mut decl_cursor) {
                        if !matches!(spec.kind(), "type_spec" | "type_alias") {
                            continue;
                        }
                        if let Some(name) = spec.child_by_field_name("name") {
                            decls.push(TopLevelDecl {
                                name: self.text(name).to_string(),
                                kind: "type",
                                offset: name.start_byte(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
        decls
    }

    fn push_spec_names(
        &self,
        decl: Node<'_>,
        spec_kind: &str,
        kind: &'static str,
        out: &mut Vec<TopLevelDecl>,
    ) {
        let mut decl_cursor = decl.walk();
        for spec in decl.named_children(&mut decl_cursor) {
            if spec.kind() != spec_kind {
                continue;
            }
            let mut name_cursor = spec.walk();
            for name in spec.children_by_field_name("name", &mut name_cursor) {
                out.push(TopLevelDecl {
                    name: self.text(name).to_string(),
                    kind,
                    offset: name.start_byte(),
                });
            }
        }
    }

    /// Finds a top-level declaration named `member`, if this unit has one.
    pub fn find_member(&self, member: &str) -> Option<TopLevelDecl> {
        self.top_level_decls()
            .into_iter()
            .find(|decl| decl.name == member)
    }
}

/// Returns `true` for the node kinds that denote an identifier reference
/// or declaration name.
pub(crate) fn is_identifier_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier" | "field_identifier" | "type_identifier" | "package_identifier" | "label_name"
    )
}

/// Go export rule: a name is exported iff its first character is uppercase.
pub fn is_exported(name: &str) -> bool {
    name.starts_with(|c: char| c.is_uppercase())
}

/// The final segment of an import path, which names the package when the
/// import carries no alias.
pub fn import_base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
