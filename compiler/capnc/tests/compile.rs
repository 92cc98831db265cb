// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end compiles against real files in temporary directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use capn_diagnostic::ErrorCode;
use capn_schema::CompileError;
use capnc::{
    compile, compile_memory, dump, load_precompiled, write_precompiled, CompileOptions, Compiler,
    MemoryLoader, NodeRef, Reflect, SchemaCache,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, source).unwrap();
    path
}

fn isolated() -> CompileOptions {
    CompileOptions {
        no_standard_import: true,
        ..CompileOptions::default()
    }
}

fn file_names(root: &NodeRef) -> Vec<String> {
    root.graph()
        .files()
        .map(|file| file.display_name.clone())
        .collect()
}

#[test]
fn test_point_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "point.capnp",
        "struct Point { x @0 :Int32; y @1 :Int32; }",
    );

    let root = compile(&path).unwrap();
    assert_eq!(root.children().collect::<Vec<_>>(), vec!["Point"]);

    let point = root.resolve_child("Point").unwrap();
    assert_eq!(point.children().collect::<Vec<_>>(), vec!["x", "y"]);
    let y = point.resolve_child("y").unwrap();
    let y = y.as_field().unwrap();
    assert_eq!(y.type_name(), "Int32");
    assert_eq!(y.slot().unwrap().byte_offset(), Some(4));
}

#[test]
fn test_relative_import_and_src_prefix() {
    let dir = TempDir::new().unwrap();
    let root_path = write(
        dir.path(),
        "shop/orders.capnp",
        "using import \"common.capnp\".Money;\nstruct Order { total @0 :Money; }",
    );
    write(dir.path(), "shop/common.capnp", "struct Money { cents @0 :Int64; }");

    let options = CompileOptions {
        src_prefixes: vec![dir.path().to_path_buf()],
        ..isolated()
    };
    let root = Compiler::new(options).compile(&root_path).unwrap();

    assert_eq!(
        file_names(&root),
        vec!["shop/orders.capnp", "shop/common.capnp"]
    );
    let order = root.resolve_child("Order").unwrap();
    let total = order.resolve_child("total").unwrap();
    assert_eq!(total.as_field().unwrap().type_name(), "Money");
}

#[test]
fn test_absolute_import_searches_import_paths() {
    let dir = TempDir::new().unwrap();
    let empty = dir.path().join("empty");
    let vendor = dir.path().join("vendor");
    fs::create_dir_all(&empty).unwrap();
    write(&vendor, "capnp/opts.capnp", "struct Opt { on @0 :Bool; }");
    let root_path = write(
        dir.path(),
        "app.capnp",
        "using Opts = import \"/capnp/opts.capnp\";\nstruct App { opt @0 :Opts.Opt; }",
    );

    let options = CompileOptions {
        import_paths: vec![empty, vendor],
        ..isolated()
    };
    let root = Compiler::new(options).compile(&root_path).unwrap();
    let names = file_names(&root);
    assert_eq!(names[1], "capnp/opts.capnp");
}

#[test]
fn test_missing_import_lists_searched_paths() {
    let dir = TempDir::new().unwrap();
    let vendor = dir.path().join("vendor");
    fs::create_dir_all(&vendor).unwrap();
    let root_path = write(
        dir.path(),
        "app.capnp",
        "using import \"/nope.capnp\".Thing;\nstruct App { }",
    );

    let options = CompileOptions {
        import_paths: vec![vendor.clone()],
        ..isolated()
    };
    let err = Compiler::new(options).compile(&root_path).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E4002);
    let CompileError::ImportNotFound {
        import,
        searched,
        location,
    } = &err
    else {
        panic!("expected ImportNotFound, got {err:?}");
    };
    assert_eq!(import, "/nope.capnp");
    assert_eq!(searched, &vec![vendor.join("nope.capnp").display().to_string()]);
    assert_eq!(location.as_ref().unwrap().line, 1);
}

#[test]
fn test_missing_root_file() {
    let dir = TempDir::new().unwrap();
    let err = compile(dir.path().join("absent.capnp")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E4002);
    assert!(err.location().is_none());
}

#[test]
fn test_self_import_is_a_cycle() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "loop.capnp",
        "using import \"loop.capnp\".A;\nstruct A { }",
    );
    let options = CompileOptions {
        src_prefixes: vec![dir.path().to_path_buf()],
        ..isolated()
    };
    let err = Compiler::new(options).compile(&path).unwrap_err();
    let CompileError::CyclicImport { cycle, .. } = &err else {
        panic!("expected CyclicImport, got {err:?}");
    };
    assert_eq!(cycle, &vec!["loop.capnp", "loop.capnp"]);
}

#[test]
fn test_two_spellings_are_one_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sub/leaf.capnp", "struct Leaf { }");
    let root_path = write(
        dir.path(),
        "top.capnp",
        "using import \"sub/leaf.capnp\".Leaf;\n\
         struct Top { a @0 :Leaf; b @1 :import \"./sub/../sub/leaf.capnp\".Leaf; }",
    );
    let options = CompileOptions {
        src_prefixes: vec![dir.path().to_path_buf()],
        ..isolated()
    };
    let root = Compiler::new(options).compile(&root_path).unwrap();
    assert_eq!(file_names(&root), vec!["top.capnp", "sub/leaf.capnp"]);
}

#[test]
fn test_duplicate_id_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "dup.capnp",
        "struct A @0xabcdef0123456789 { }\nstruct B @0xabcdef0123456789 { }",
    );
    let err = compile(&path).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E2002);
    assert_eq!(err.location().unwrap().line, 2);
}

#[test]
fn test_precompiled_reflects_like_source() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "person.capnp",
        "struct Person @0xabcdef0123456789 {\n\
           name @0 :Text;\n\
           age @1 :UInt8 = 30;\n\
           union { email @2 :Text; phone @3 :Text; }\n\
         }\n\
         enum Color { red @0; green @1; }",
    );
    let compiled = compile(&path).unwrap();
    let out = dir.path().join("person.capnp.bin");
    write_precompiled(compiled.graph(), &out).unwrap();

    let loaded = load_precompiled(&out).unwrap();
    assert_eq!(dump(&loaded).unwrap(), dump(&compiled).unwrap());
    assert_eq!(
        loaded.resolve_child("Person").unwrap().identifier_display(),
        "@0xabcdef0123456789"
    );
}

#[test]
fn test_garbage_precompiled_file() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "junk.bin", "not a schema");
    let err = load_precompiled(&path).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E4004);
}

#[test]
fn test_cache_returns_the_same_graph() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "a.capnp", "struct A { }");
    let cache = SchemaCache::new();
    let compiler = Compiler::new(isolated()).with_cache(&cache);

    let first = compiler.compile(&path).unwrap();
    let second = compiler.compile(dir.path().join(".").join("a.capnp")).unwrap();
    assert!(Arc::ptr_eq(first.graph(), second.graph()));
    assert_eq!(cache.len(), 1);

    cache.clear();
    let third = compiler.compile(&path).unwrap();
    assert!(!Arc::ptr_eq(first.graph(), third.graph()));
}

#[test]
fn test_cache_hit_skips_reading_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "a.capnp", "struct A { }");
    let cache = SchemaCache::new();
    let compiler = Compiler::new(isolated()).with_cache(&cache);

    let first = compiler.compile(&path).unwrap();
    // An edit is not seen while the entry is cached.
    fs::write(&path, "struct {").unwrap();
    let second = compiler.compile(&path).unwrap();
    assert!(Arc::ptr_eq(first.graph(), second.graph()));

    assert_eq!(cache.remove(&path.canonicalize().unwrap()), 1);
    let err = compiler.compile(&path).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E1002);
}

#[test]
fn test_cache_keeps_options_apart() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "pkg/a.capnp", "struct A { }");
    let cache = SchemaCache::new();

    let plain = Compiler::new(isolated())
        .with_cache(&cache)
        .compile(&path)
        .unwrap();
    let prefixed_options = CompileOptions {
        src_prefixes: vec![dir.path().to_path_buf()],
        ..isolated()
    };
    let prefixed = Compiler::new(prefixed_options.clone())
        .with_cache(&cache)
        .compile(&path)
        .unwrap();

    assert!(!Arc::ptr_eq(plain.graph(), prefixed.graph()));
    assert_eq!(file_names(&prefixed), vec!["pkg/a.capnp"]);
    assert_ne!(file_names(&plain), file_names(&prefixed));
    assert_eq!(cache.len(), 2);

    let again = Compiler::new(prefixed_options)
        .with_cache(&cache)
        .compile(&path)
        .unwrap();
    assert!(Arc::ptr_eq(prefixed.graph(), again.graph()));
    assert_eq!(cache.remove(&path.canonicalize().unwrap()), 2);
    assert!(cache.is_empty());
}

#[test]
fn test_dump_walks_every_level() {
    let loader = MemoryLoader::new().with_file(
        "shapes.capnp",
        "struct Shape @0x8000000000000001 {\n\
           area @0 :Float64;\n\
           kind :group { sides @1 :UInt8; }\n\
         }",
    );
    let root = compile_memory(&loader, "shapes.capnp").unwrap();
    let text = dump(&root).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with("file shapes.capnp @0x"), "{text}");
    assert_eq!(lines[1], "  struct Shape @0x8000000000000001");
    assert_eq!(lines[2], "    area @0 :Float64");
    assert!(lines[3].starts_with("    group kind @0x"), "{text}");
    assert_eq!(lines[4], "      sides @1 :UInt8");
    assert_eq!(lines.len(), 5);
}

#[test]
fn test_memory_compile_is_deterministic() {
    let loader = MemoryLoader::new()
        .with_file("a.capnp", "using import \"b.capnp\".B;\nstruct A { b @0 :B; }")
        .with_file("b.capnp", "struct B { x @0 :Int32; }");
    let first = dump(&compile_memory(&loader, "a.capnp").unwrap()).unwrap();
    let second = dump(&compile_memory(&loader, "a.capnp").unwrap()).unwrap();
    assert_eq!(first, second);
}
