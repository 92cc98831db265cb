#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::sync::Arc;

use capn_diagnostic::ErrorCode;
use capn_parse::ParsedFile;
use capn_schema::{resolve, ImportLoader, LoadError, NodeKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::{EnumerantRef, FieldRef, MethodRef, NodeRef, Reflect, ReflectError, Reflected};

/// Loads nothing; the schemas here import no files.
struct NoImports;

impl ImportLoader for NoImports {
    fn canonicalize(&self, _importer: &str, import: &str) -> Result<String, LoadError> {
        Err(LoadError::NotFound {
            import: import.to_string(),
            searched: Vec::new(),
        })
    }

    fn load(&self, key: &str) -> Result<ParsedFile, LoadError> {
        Err(LoadError::NotFound {
            import: key.to_string(),
            searched: Vec::new(),
        })
    }
}

fn root(source: &str) -> NodeRef {
    let parsed = ParsedFile::parse("test.capnp", source).unwrap();
    NodeRef::root(Arc::new(resolve(parsed, &NoImports).unwrap()))
}

fn child(of: &impl Reflect, name: &str) -> Reflected {
    of.resolve_child(name).unwrap()
}

const SCHEMA: &str = "\
struct Person @0xabcdef0123456789 {
  name @0 :Text;
  age @1 :UInt8 = 30;
  address :group {
    city @2 :Text;
  }
  struct Tag { }
}
enum Color { red @0; green @1; }
interface Calc {
  add @0 (a :Int32, b :Int32) -> (sum :Int32);
  echo @1 Person -> Person;
}
";

#[test]
fn test_point_children_and_offsets() {
    let root = root("struct Point { x @0 :Int32; y @1 :Int32; }");
    assert_eq!(root.children().collect::<Vec<_>>(), vec!["Point"]);

    let point = child(&root, "Point");
    assert_eq!(point.children().collect::<Vec<_>>(), vec!["x", "y"]);

    let offsets: Vec<Option<u32>> = ["x", "y"]
        .iter()
        .map(|name| {
            let field = child(&point, name);
            let field = field.as_field().unwrap();
            assert_eq!(field.type_name(), "Int32");
            field.slot().unwrap().byte_offset()
        })
        .collect();
    assert_eq!(offsets, vec![Some(0), Some(4)]);
}

#[test]
fn test_identifier_display() {
    let root = root(SCHEMA);
    let person = child(&root, "Person");
    assert_eq!(person.identifier_display(), "@0xabcdef0123456789");
    assert_eq!(child(&person, "age").identifier_display(), "@1");

    let color = child(&root, "Color");
    assert_eq!(child(&color, "green").identifier_display(), "@1");
    let calc = child(&root, "Calc");
    assert_eq!(child(&calc, "echo").identifier_display(), "@1");

    let file_id = root.identifier_display();
    assert_eq!(file_id.len(), 3 + 16);
    assert!(file_id.starts_with("@0x"));
}

#[test]
fn test_resolve_kinds() {
    let root = root(SCHEMA);
    let person = child(&root, "Person");
    assert!(child(&person, "name").as_field().is_some());

    let address = child(&person, "address");
    let address = address.as_node().unwrap();
    assert_eq!(address.kind(), NodeKind::Group);
    assert_eq!(address.children().collect::<Vec<_>>(), vec!["city"]);
    assert_eq!(address.parent().unwrap().name(), "Person");

    let tag = child(&person, "Tag");
    assert_eq!(tag.as_node().unwrap().kind(), NodeKind::Struct);

    let color = child(&root, "Color");
    assert_eq!(child(&color, "red").as_enumerant().unwrap().name(), "red");
    assert!(child(&child(&root, "Calc"), "add").as_method().is_some());
}

#[test]
fn test_unknown_child() {
    let root = root(SCHEMA);
    let person = child(&root, "Person");
    let err = person.resolve_child("nope").unwrap_err();
    assert_eq!(
        err,
        ReflectError::NoSuchChild {
            name: "nope".into(),
            node: "test.capnp:Person".into(),
        }
    );
    assert_eq!(err.to_string(), "`test.capnp:Person` has no child named `nope`");
    assert_eq!(err.code(), ErrorCode::E5001);
    assert_eq!(err.to_diagnostic().notes.len(), 1);

    let name = child(&person, "name");
    assert!(name.children().next().is_none());
    assert!(matches!(
        name.resolve_child("x"),
        Err(ReflectError::NoSuchChild { .. })
    ));
}

#[test]
fn test_member_handles_need_an_existing_index() {
    let root = root(SCHEMA);
    let color = child(&root, "Color");
    let color = color.as_node().unwrap();
    assert_eq!(EnumerantRef::new(color.clone(), 1).unwrap().name(), "green");
    assert!(EnumerantRef::new(color.clone(), 2).is_none());
    assert!(MethodRef::new(color.clone(), 0).is_none());
    assert!(FieldRef::new(color.clone(), 0).is_none());

    let calc = child(&root, "Calc");
    let calc = calc.as_node().unwrap();
    assert_eq!(MethodRef::new(calc.clone(), 1).unwrap().name(), "echo");
    assert!(MethodRef::new(calc.clone(), 2).is_none());
}

#[test]
fn test_children_restart_and_size() {
    let root = root(SCHEMA);
    let person = child(&root, "Person");
    let mut children = person.children();
    assert_eq!(children.len(), 4);
    children.next();
    assert_eq!(children.len(), 3);
    assert_eq!(
        person.children().collect::<Vec<_>>(),
        person.children().collect::<Vec<_>>()
    );
}

#[test]
fn test_describe() {
    let root = root(SCHEMA);
    let person = child(&root, "Person");
    assert_eq!(person.describe(), "struct Person @0xabcdef0123456789");
    assert_eq!(child(&person, "name").describe(), "name @0 :Text");
    assert_eq!(child(&person, "age").describe(), "age @1 :UInt8 = 30");

    let color = child(&root, "Color");
    assert_eq!(child(&color, "green").describe(), "green @1");

    let calc = child(&root, "Calc");
    assert_eq!(
        child(&calc, "add").describe(),
        "add @0 (a :Int32, b :Int32) -> (sum :Int32)"
    );
    assert_eq!(child(&calc, "echo").describe(), "echo @1 Person -> Person");

    let generic = root_describe("struct Map(K, V) { }");
    assert!(generic.starts_with("struct Map(K, V) @0x"), "{generic}");
}

fn root_describe(source: &str) -> String {
    child(&root(source), "Map").describe()
}

#[test]
fn test_method_param_structs() {
    let root = root(SCHEMA);
    let calc = child(&root, "Calc");
    let add = child(&calc, "add");
    let add = add.as_method().unwrap();

    let params = add.params().unwrap();
    assert_eq!(params.name(), "add$Params");
    assert_eq!(params.children().collect::<Vec<_>>(), vec!["a", "b"]);
    assert!(params.parent().is_none());
    assert_eq!(add.results().unwrap().children().collect::<Vec<_>>(), vec!["sum"]);

    let echo = child(&calc, "echo");
    assert_eq!(echo.as_method().unwrap().params().unwrap().name(), "Person");
}

#[test]
fn test_render_tree() {
    let root = root("struct Outer { struct Inner { } x @0 :Int32; }\nstruct Other { }");
    assert_eq!(root.render_tree(), "test.capnp(Outer(Inner()), Other())");
    assert_eq!(root.to_string(), root.render_tree());
}

/// Walk every child, resolving each name, and count visits.
fn walk(item: &Reflected, depth: usize, seen: &mut Vec<String>) {
    assert!(depth < 32, "walk did not terminate");
    for name in item.children() {
        let next = item.resolve_child(&name).unwrap();
        seen.push(format!("{}{name}", "  ".repeat(depth)));
        walk(&next, depth + 1, seen);
    }
}

#[test]
fn test_recursive_walk() {
    let root = Reflected::Node(root(SCHEMA));
    let mut seen = Vec::new();
    walk(&root, 0, &mut seen);
    assert_eq!(
        seen,
        vec![
            "Person",
            "  name",
            "  age",
            "  address",
            "    city",
            "  Tag",
            "Color",
            "  red",
            "  green",
            "Calc",
            "  add",
            "  echo",
        ]
    );
}

#[test]
fn test_handles_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NodeRef>();
    assert_send_sync::<Reflected>();

    let root = root(SCHEMA);
    let handle = std::thread::spawn(move || root.children().count());
    assert_eq!(handle.join().unwrap(), 3);
}

proptest! {
    #[test]
    fn prop_only_listed_names_resolve(name in "[a-zA-Z][a-zA-Z0-9]{0,8}") {
        let root = root(SCHEMA);
        let person = child(&root, "Person");
        let listed = person.children().any(|c| c == name);
        prop_assert_eq!(person.resolve_child(&name).is_ok(), listed);
    }
}
