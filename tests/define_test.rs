use std::fs;
use std::path::PathBuf;

use defjump::config::DefjumpConfig;
use defjump::errors::DefjumpError;
use defjump::resolution::DefinitionResolver;
use defjump::vfs::Overlay;
use tempfile::TempDir;

const ALPHA_A: &str = "package alpha\n\nconst Answer = 42\n";

const ALPHA_B: &str = "package alpha\n\ntype Thing struct {\n\tvalue int\n}\n";

const ALPHA_C: &str = "package alpha\n\n// Foo reports a fixed value.\nfunc Foo() int { return 1 }\n";

const BETA_MAIN: &str = "package beta\n\nimport \"alpha\"\n\nvar total = alpha.Answer\n\nfunc Use() int {\n\tx := alpha.Foo()\n\treturn x\n}\n\nfunc Twice() int {\n\treturn helper() + helper()\n}\n\nfunc Length(s string) int {\n\treturn len(s)\n}\n";

const BETA_OTHER: &str = "package beta\n\nfunc helper() int { return 2 }\n";

/// A GOPATH-style tree: packages `alpha` and `beta` under `<root>/src`,
/// where `beta` imports `alpha`.
struct Tree {
    _dir: TempDir,
    beta_main: PathBuf,
    alpha_a: PathBuf,
    alpha_c: PathBuf,
    beta_other: PathBuf,
    resolver: DefinitionResolver,
}

fn setup() -> Tree {
    let dir = TempDir::new().expect("failed to create temp dir");
    let alpha = dir.path().join("src/alpha");
    let beta = dir.path().join("src/beta");
    fs::create_dir_all(&alpha).expect("mkdir failed");
    fs::create_dir_all(&beta).expect("mkdir failed");

    let alpha_a = alpha.join("a.go");
    let alpha_c = alpha.join("c.go");
    let beta_main = beta.join("beta.go");
    let beta_other = beta.join("other.go");
    fs::write(&alpha_a, ALPHA_A).expect("write failed");
    fs::write(alpha.join("b.go"), ALPHA_B).expect("write failed");
    fs::write(&alpha_c, ALPHA_C).expect("write failed");
    fs::write(&beta_main, BETA_MAIN).expect("write failed");
    fs::write(&beta_other, BETA_OTHER).expect("write failed");

    let config = DefjumpConfig {
        source_roots: vec![dir.path().to_path_buf()],
        ..DefjumpConfig::default()
    };
    Tree {
        _dir: dir,
        beta_main,
        alpha_a,
        alpha_c,
        beta_other,
        resolver: DefinitionResolver::new(config),
    }
}

fn offset_of(haystack: &str, needle: &str, skip: usize) -> usize {
    haystack.find(needle).expect("needle present") + skip
}

#[test]
fn test_local_variable_resolves_via_fast_path_alone() {
    let tree = setup();
    // The `x` of `return x`.
    let offset = offset_of(BETA_MAIN, "return x", "return ".len());
    let def = tree
        .resolver
        .define_source(&tree.beta_main, offset, None)
        .expect("local variable should resolve");

    assert_eq!(def.position.path, tree.beta_main);
    assert_eq!(def.position.offset, offset_of(BETA_MAIN, "x :=", 0));
    assert_eq!((def.position.line, def.position.column), (8, 2));
    assert_eq!(def.label, "var x");

    let counts = tree.resolver.tier_counts();
    assert_eq!(counts.fast_path, 1);
    assert_eq!(counts.member_locator, 0, "fast path must not spill over");
    assert_eq!(counts.program, 0);
}

#[test]
fn test_declaration_name_resolves_to_itself() {
    let tree = setup();
    let offset = offset_of(ALPHA_C, "func Foo", "func ".len());
    let def = tree
        .resolver
        .define_source(&tree.alpha_c, offset, None)
        .expect("declaration name should resolve");
    assert_eq!(def.position.path, tree.alpha_c);
    assert_eq!((def.position.line, def.position.column), (4, 6));
    assert_eq!(def.label, "func Foo");
}

#[test]
fn test_qualified_reference_resolves_across_units() {
    let tree = setup();
    // The `Foo` of `alpha.Foo()` in beta.go.
    let offset = offset_of(BETA_MAIN, "alpha.Foo", "alpha.".len());
    let def = tree
        .resolver
        .define_source(&tree.beta_main, offset, None)
        .expect("cross-unit member should resolve");

    assert_eq!(def.position.path, tree.alpha_c);
    assert_eq!(def.position.offset, offset_of(ALPHA_C, "func Foo", "func ".len()));
    assert_eq!((def.position.line, def.position.column), (4, 6));
    assert_eq!(def.label, "func alpha.Foo");
    assert_eq!(def.content, ALPHA_C.as_bytes(), "declaring unit content is returned");

    let counts = tree.resolver.tier_counts();
    assert_eq!(counts.member_locator, 1);
    assert_eq!(counts.program, 0, "the member locator settles the query");
}

#[test]
fn test_qualified_const_reference() {
    let tree = setup();
    let offset = offset_of(BETA_MAIN, "alpha.Answer", "alpha.".len());
    let def = tree
        .resolver
        .define_source(&tree.beta_main, offset, None)
        .expect("cross-unit const should resolve");
    assert_eq!(def.position.path, tree.alpha_a);
    assert_eq!((def.position.line, def.position.column), (3, 7));
    assert_eq!(def.label, "const alpha.Answer");
}

#[test]
fn test_same_package_cross_file_via_program_tier() {
    let tree = setup();
    // `helper` is declared in other.go, invisible to the fast path.
    let offset = offset_of(BETA_MAIN, "helper()", 0);
    let def = tree
        .resolver
        .define_source(&tree.beta_main, offset, None)
        .expect("sibling-file declaration should resolve");

    assert_eq!(def.position.path, tree.beta_other);
    assert_eq!((def.position.line, def.position.column), (3, 6));
    assert_eq!(def.label, "func helper");

    let counts = tree.resolver.tier_counts();
    assert_eq!(counts.program, 1, "only the program tier can see sibling files");
}

#[test]
fn test_builtin_reference_is_surfaced() {
    let tree = setup();
    let offset = offset_of(BETA_MAIN, "len(s)", 0);
    let err = tree
        .resolver
        .define_source(&tree.beta_main, offset, None)
        .expect_err("a predeclared entity has no position");
    match err {
        DefjumpError::BuiltinDeclaration { name } => assert_eq!(name, "len"),
        other => panic!("expected BuiltinDeclaration, got {other}"),
    }
    assert_eq!(err_message_of(&tree, offset), "len is built in");
}

fn err_message_of(tree: &Tree, offset: usize) -> String {
    tree.resolver
        .define_source(&tree.beta_main, offset, None)
        .expect_err("still an error")
        .to_string()
}

#[test]
fn test_offset_at_length_is_accepted_past_length_rejected() {
    let tree = setup();
    let len = BETA_MAIN.len();

    // At the very end of the unit: a well-formed query with nothing there.
    let err = tree
        .resolver
        .define_source(&tree.beta_main, len, None)
        .expect_err("nothing to resolve at EOF");
    assert!(
        !matches!(err, DefjumpError::QueryMalformed { .. }),
        "offset == length is within bounds, got {err}"
    );

    let err = tree
        .resolver
        .define_source(&tree.beta_main, len + 1, None)
        .expect_err("offset beyond the unit must fail");
    assert!(matches!(err, DefjumpError::QueryMalformed { .. }));
    // A malformed query is caught before any tier runs.
    assert_eq!(tree.resolver.tier_counts().fast_path, 1);
}

#[test]
fn test_textual_query_encoding() {
    let tree = setup();
    let offset = offset_of(BETA_MAIN, "alpha.Foo", "alpha.".len());
    let query = format!("{}:#{}", tree.beta_main.display(), offset);
    let def = tree
        .resolver
        .define(&query, &Overlay::new())
        .expect("textual query should resolve");
    assert_eq!(def.position.path, tree.alpha_c);

    let range_query = format!("{}:#{},#{}", tree.beta_main.display(), offset, offset + 3);
    let def = tree
        .resolver
        .define(&range_query, &Overlay::new())
        .expect("range query should resolve");
    assert_eq!(def.position.path, tree.alpha_c);
}

#[test]
fn test_overlay_shadows_disk_for_the_queried_unit() {
    let tree = setup();
    // Unsaved edit: a comment line shifts every offset by ten bytes.
    let edited = format!("// edited\n{BETA_MAIN}");
    let offset = offset_of(&edited, "alpha.Foo", "alpha.".len());
    assert_eq!(offset, offset_of(BETA_MAIN, "alpha.Foo", "alpha.".len()) + 10);

    let def = tree
        .resolver
        .define_source(&tree.beta_main, offset, Some(edited.as_bytes()))
        .expect("overlay content should drive resolution");
    assert_eq!(def.position.path, tree.alpha_c);
    assert_eq!(def.label, "func alpha.Foo");
}

#[test]
fn test_overlay_content_is_returned_for_overlaid_declaring_unit() {
    let tree = setup();
    let edited = format!("// edited\n{BETA_MAIN}");
    let offset = offset_of(&edited, "return x", "return ".len());

    let def = tree
        .resolver
        .define_source(&tree.beta_main, offset, Some(edited.as_bytes()))
        .expect("local query against overlay should resolve");
    assert_eq!(def.position.path, tree.beta_main);
    assert_eq!(def.position.offset, offset_of(&edited, "x :=", 0));
    assert_eq!(def.position.line, 9, "positions are relative to the overlay content");
    assert_eq!(def.content, edited.as_bytes());
}

#[test]
fn test_unresolvable_identifier_reports_no_binding() {
    let tree = setup();
    // A unit with a reference to a name that exists nowhere.
    let content = "package beta\n\nfunc broken() int { return missing() }\n";
    let offset = content.find("missing").unwrap();
    let err = tree
        .resolver
        .define_source(&tree.beta_main, offset, Some(content.as_bytes()))
        .expect_err("unknown identifier cannot resolve");
    match err {
        DefjumpError::NoBindingForIdentifier { name } => assert_eq!(name, "missing"),
        other => panic!("expected NoBindingForIdentifier, got {other}"),
    }
}

#[test]
fn test_missing_import_surfaces_member_not_found() {
    let tree = setup();
    // `gamma` is imported but has no package directory anywhere.
    let content = "package beta\n\nimport \"gamma\"\n\nvar v = gamma.Thing\n";
    let offset = content.find("gamma.Thing").unwrap() + "gamma.".len();
    let err = tree
        .resolver
        .define_source(&tree.beta_main, offset, Some(content.as_bytes()))
        .expect_err("unknown package cannot resolve");
    assert!(
        matches!(err, DefjumpError::UnitNotFound { .. }),
        "the member search failure is surfaced after the final tier fails, got {err}"
    );
    assert_eq!(tree.resolver.tier_counts().program, 1, "the final tier still ran");
}

#[test]
fn test_caches_are_reused_across_queries() {
    let tree = setup();
    // The program tier deterministically reads every unit of the package
    // and of its imports, so the second query's read counts are exact.
    let offset = offset_of(BETA_MAIN, "helper()", 0);
    tree.resolver
        .define_source(&tree.beta_main, offset, None)
        .expect("first query should resolve");
    let reads_after_first = tree.resolver.file_cache().disk_reads();
    let listings_after_first = tree.resolver.dir_cache().listings();

    tree.resolver
        .define_source(&tree.beta_main, offset, None)
        .expect("second query should resolve");
    assert_eq!(
        tree.resolver.file_cache().disk_reads(),
        reads_after_first,
        "a repeated query re-reads nothing from disk"
    );
    assert_eq!(tree.resolver.dir_cache().listings(), listings_after_first);
}
