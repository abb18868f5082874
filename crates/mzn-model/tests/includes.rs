//! Include resolution against a real directory tree.

use mzn_ast::WriteMode;
use mzn_model::{ModelBuilder, ModelConfig, ModelError, ModelWarning};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, text).unwrap();
    }
    dir
}

fn build_file(path: &Path) -> Result<ModelBuilder, ModelError> {
    let mut b = ModelBuilder::new();
    b.add_file(path)?;
    Ok(b)
}

#[test]
fn included_items_merge_in_place() {
    let dir = tree(&[
        ("main.mzn", "include \"defs.mzn\";\nconstraint x < n;\n"),
        ("defs.mzn", "int: n = 3;\nvar int: x;\n"),
    ]);
    let b = build_file(&dir.path().join("main.mzn")).unwrap();
    assert!(b.warnings().is_empty());
    assert_eq!(
        b.write(WriteMode::Pretty),
        "int: n = 3;\nvar int: x;\nconstraint x < n;\n"
    );
}

#[test]
fn missing_include_passes_through_with_a_warning() {
    let dir = tree(&[("main.mzn", "include \"globals.mzn\";\nvar int: x;\n")]);
    let b = build_file(&dir.path().join("main.mzn")).unwrap();
    assert_eq!(
        b.warnings(),
        [ModelWarning::UnresolvedInclude {
            path: "globals.mzn".to_string()
        }]
    );
    assert_eq!(b.unresolved_includes().len(), 1);
    assert_eq!(
        b.write(WriteMode::Pretty),
        "include \"globals.mzn\";\nvar int: x;\n"
    );
}

#[test]
fn repeated_missing_include_is_written_once() {
    let mut b = ModelBuilder::new();
    b.add_string("a", "include \"globals.mzn\";").unwrap();
    b.add_string("b", "include \"globals.mzn\";").unwrap();
    assert_eq!(b.warnings().len(), 1);
    assert_eq!(b.write(WriteMode::Minimal), "include \"globals.mzn\";");
}

#[test]
fn self_include_is_recursive() {
    let dir = tree(&[("loop.mzn", "include \"loop.mzn\";\n")]);
    let err = build_file(&dir.path().join("loop.mzn")).unwrap_err();
    assert!(matches!(err, ModelError::RecursiveInclude { .. }), "{err}");
    assert!(err.to_string().contains("loop.mzn -> "), "{err}");
}

#[test]
fn indirect_cycle_is_recursive() {
    let dir = tree(&[
        ("a.mzn", "include \"b.mzn\";\nint: a = 1;\n"),
        ("b.mzn", "include \"c.mzn\";\n"),
        ("c.mzn", "include \"a.mzn\";\n"),
    ]);
    let err = build_file(&dir.path().join("a.mzn")).unwrap_err();
    let ModelError::RecursiveInclude { path, chain } = &err else {
        panic!("expected a recursive include, got {err}");
    };
    assert!(path.ends_with("a.mzn"));
    assert_eq!(chain.matches(" -> ").count(), 3, "{chain}");
}

#[test]
fn diamond_include_merges_shared_file_once() {
    let dir = tree(&[
        ("main.mzn", "include \"left.mzn\";\ninclude \"right.mzn\";\n"),
        ("left.mzn", "include \"shared.mzn\";\nint: l = s;\n"),
        ("right.mzn", "include \"shared.mzn\";\nint: r = s;\n"),
        ("shared.mzn", "int: s = 1;\n"),
    ]);
    let b = build_file(&dir.path().join("main.mzn")).unwrap();
    assert_eq!(b.names().collect::<Vec<_>>(), ["s", "l", "r"]);
}

#[test]
fn search_dirs_supply_libraries() {
    let lib = tree(&[("lib/alldiff.mzn", "predicate alldiff(array[int] of var int: x);\n")]);
    let config = ModelConfig::default().search_dir(lib.path().join("lib"));
    let mut b = ModelBuilder::with_config(config);
    b.add_string(
        "<mem>",
        "include \"alldiff.mzn\";\narray[1..3] of var 1..3: q;\nconstraint alldiff(q);",
    )
    .unwrap();
    assert!(b.warnings().is_empty());
    assert_eq!(b.overloads("alldiff").len(), 1);
    assert_eq!(b.names().collect::<Vec<_>>(), ["alldiff", "q"]);
}

#[test]
fn includes_resolve_next_to_the_including_file() {
    let dir = tree(&[
        ("main.mzn", "include \"sub/a.mzn\";\n"),
        ("sub/a.mzn", "include \"b.mzn\";\nint: a = b;\n"),
        ("sub/b.mzn", "int: b = 2;\n"),
    ]);
    let b = build_file(&dir.path().join("main.mzn")).unwrap();
    assert!(b.warnings().is_empty());
    assert_eq!(b.names().collect::<Vec<_>>(), ["b", "a"]);
    let sub = dir.path().join("sub").canonicalize().unwrap();
    assert!(b.search_dirs().contains(&sub));
}

#[test]
fn adding_the_same_file_twice_is_a_no_op() {
    let dir = tree(&[("m.mzn", "int: k = 1;\n")]);
    let mut b = ModelBuilder::new();
    b.add_file(dir.path().join("m.mzn")).unwrap();
    b.add_file(dir.path().join("m.mzn")).unwrap();
    assert_eq!(b.names().count(), 1);
}

#[test]
fn errors_in_included_files_name_the_file() {
    let dir = tree(&[
        ("main.mzn", "include \"bad.mzn\";\n"),
        ("bad.mzn", "int: a = 1\nint: b;\n"),
    ]);
    let err = build_file(&dir.path().join("main.mzn")).unwrap_err();
    let ModelError::Parse { source_name, message } = &err else {
        panic!("expected a parse error, got {err}");
    };
    assert!(source_name.ends_with("bad.mzn"), "{source_name}");
    assert!(message.contains(":2:1:"), "{message}");
}

#[test]
fn missing_top_level_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = build_file(&dir.path().join("absent.mzn")).unwrap_err();
    assert!(matches!(err, ModelError::Io { .. }), "{err}");
}

#[test]
fn conflicts_across_files_are_reported() {
    let dir = tree(&[
        ("main.mzn", "include \"one.mzn\";\nsolve satisfy;\n"),
        ("one.mzn", "solve satisfy;\n"),
    ]);
    assert!(matches!(
        build_file(&dir.path().join("main.mzn")),
        Err(ModelError::DuplicateSolve { .. })
    ));
}
