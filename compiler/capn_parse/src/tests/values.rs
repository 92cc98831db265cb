//! Value expressions and annotation arguments.

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use capn_ir::{DeclKind, ValueExpr, ValueExprKind};
use pretty_assertions::assert_eq;

use crate::parse;

fn const_value(source: &str) -> ValueExpr {
    let tree = parse(source).unwrap();
    match &tree.decls[0].kind {
        DeclKind::Const(c) => c.value.clone(),
        other => panic!("expected const, got {}", other.keyword()),
    }
}

#[test]
fn test_negative_numbers() {
    assert_eq!(
        const_value("const a :Int64 = -9223372036854775808;").kind,
        ValueExprKind::Int {
            magnitude: 9_223_372_036_854_775_808,
            negative: true
        }
    );
    assert_eq!(
        const_value("const b :Float64 = -1.5;").kind,
        ValueExprKind::Float(-1.5)
    );
    assert_eq!(
        const_value("const c :Float64 = -inf;").kind,
        ValueExprKind::Float(f64::NEG_INFINITY)
    );
}

#[test]
fn test_names_are_paths() {
    for (source, name) in [
        ("const t :Bool = true;", "true"),
        ("const v :Void = void;", "void"),
        ("const n :Float32 = nan;", "nan"),
    ] {
        let ValueExprKind::Path(path) = const_value(source).kind else {
            panic!("expected path for {source}");
        };
        assert_eq!(path.as_simple_name(), Some(name));
    }
}

#[test]
fn test_list_and_struct_literals() {
    let value = const_value("const l :List(Int32) = [1, 2, 3];");
    let ValueExprKind::List(items) = value.kind else {
        panic!("expected list");
    };
    assert_eq!(items.len(), 3);

    let value = const_value("const p :Point = (x = 1.0, y = -2.0, tags = [\"a\"]);");
    let ValueExprKind::Struct(fields) = value.kind else {
        panic!("expected struct");
    };
    let names: Vec<_> = fields.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["x", "y", "tags"]);

    let empty = const_value("const e :Point = ();");
    assert_eq!(empty.kind, ValueExprKind::Struct(Vec::new()));

    let empty_list = const_value("const e :List(Int32) = [];");
    assert_eq!(empty_list.kind, ValueExprKind::List(Vec::new()));
}

#[test]
fn test_bytes_and_text() {
    assert_eq!(
        const_value("const d :Data = 0x\"de ad be ef\";").kind,
        ValueExprKind::Bytes(vec![0xde, 0xad, 0xbe, 0xef])
    );
    assert_eq!(
        const_value("const s :Text = \"hi\\n\";").kind,
        ValueExprKind::Str("hi\n".to_string())
    );
}

#[test]
fn test_qualified_constant_reference() {
    let ValueExprKind::Path(path) = const_value("const r :Int32 = .Outer.limit;").kind else {
        panic!("expected path");
    };
    assert!(path.absolute);
    assert_eq!(path.to_string(), ".Outer.limit");
}

#[test]
fn test_annotation_argument_shapes() {
    let tree = parse(
        "struct S $flag $label(\"x\") $pair(a = 1, b = 2) $unit() { }",
    )
    .unwrap();
    let apps = &tree.decls[0].annotations;
    assert_eq!(apps.len(), 4);
    assert!(apps[0].value.is_none());
    assert!(matches!(
        apps[1].value.as_ref().map(|v| &v.kind),
        Some(ValueExprKind::Str(s)) if s == "x"
    ));
    assert!(matches!(
        apps[2].value.as_ref().map(|v| &v.kind),
        Some(ValueExprKind::Struct(f)) if f.len() == 2
    ));
    assert!(matches!(
        apps[3].value.as_ref().map(|v| &v.kind),
        Some(ValueExprKind::Struct(f)) if f.is_empty()
    ));
}

#[test]
fn test_keyword_struct_literal_fields() {
    let value = const_value("const v :Value = (enum = 3, struct = (union = true));");
    let ValueExprKind::Struct(fields) = value.kind else {
        panic!("expected struct");
    };
    let names: Vec<_> = fields.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["enum", "struct"]);

    let tree = parse("struct S $tag(group = 1) { }").unwrap();
    let app = &tree.decls[0].annotations[0];
    assert!(matches!(
        app.value.as_ref().map(|v| &v.kind),
        Some(ValueExprKind::Struct(f)) if f[0].0.as_str() == "group"
    ));
}
