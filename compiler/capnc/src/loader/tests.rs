#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::path::Path;

use capn_schema::{ImportLoader, LoadError};
use pretty_assertions::assert_eq;

use super::{normalize, sibling_name, MemoryLoader};

#[test]
fn test_normalize_folds_dots() {
    assert_eq!(normalize(Path::new("./a/b/../c.capnp")), "a/c.capnp");
    assert_eq!(normalize(Path::new("../x.capnp")), "../x.capnp");
    assert_eq!(normalize(Path::new("/usr/../include/y.capnp")), "/include/y.capnp");
    assert_eq!(normalize(Path::new("/../z.capnp")), "/z.capnp");
}

#[test]
fn test_sibling_names() {
    assert_eq!(sibling_name("shop/orders.capnp", "common.capnp"), "shop/common.capnp");
    assert_eq!(sibling_name("shop/orders.capnp", "../base.capnp"), "base.capnp");
    assert_eq!(sibling_name("top.capnp", "sub/leaf.capnp"), "sub/leaf.capnp");
}

#[test]
fn test_memory_canonicalize() {
    let loader = MemoryLoader::new()
        .with_file("shop/orders.capnp", "")
        .with_file("shop/common.capnp", "")
        .with_file("/capnp/c++.capnp", "");

    assert!(loader.contains("capnp/c++.capnp"));
    assert_eq!(
        loader.canonicalize("shop/orders.capnp", "common.capnp").unwrap(),
        "shop/common.capnp"
    );
    assert_eq!(
        loader.canonicalize("shop/orders.capnp", "/capnp/c++.capnp").unwrap(),
        "capnp/c++.capnp"
    );
    assert_eq!(
        loader.canonicalize("shop/orders.capnp", "missing.capnp"),
        Err(LoadError::NotFound {
            import: "missing.capnp".to_string(),
            searched: vec!["shop/missing.capnp".to_string()],
        })
    );
}

#[test]
fn test_memory_load_reports_syntax_errors_by_name() {
    let loader = MemoryLoader::new().with_file("bad.capnp", "struct {");
    match loader.load("bad.capnp") {
        Err(LoadError::Syntax { file, .. }) => assert_eq!(file, "bad.capnp"),
        other => panic!("expected a syntax error, got {other:?}"),
    }
    assert!(loader
        .load("bad.capnp")
        .unwrap_err()
        .to_string()
        .starts_with("bad.capnp:"));
}
