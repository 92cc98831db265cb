use super::*;

fn ident(name: &str) -> Ident {
    Ident::new(name, Span::DUMMY)
}

fn path(names: &[&str]) -> Path {
    Path {
        absolute: false,
        base: PathBase::Name,
        segments: names
            .iter()
            .map(|n| PathSegment {
                name: ident(n),
                args: Vec::new(),
            })
            .collect(),
        span: Span::DUMMY,
    }
}

fn import_path(file: &str, names: &[&str]) -> Path {
    let mut p = path(names);
    p.base = PathBase::Import {
        path: file.to_string(),
        span: Span::DUMMY,
    };
    p
}

fn ty(p: Path) -> TypeExpr {
    TypeExpr {
        path: p,
        span: Span::DUMMY,
    }
}

#[test]
fn test_simple_name() {
    assert_eq!(path(&["Int32"]).as_simple_name(), Some("Int32"));
    assert_eq!(path(&["Outer", "Inner"]).as_simple_name(), None);
    let mut abs = path(&["Foo"]);
    abs.absolute = true;
    assert_eq!(abs.as_simple_name(), None);
}

#[test]
fn test_path_display() {
    let mut generic = path(&["Map"]);
    generic.segments[0].args = vec![ty(path(&["Text"])), ty(path(&["Person"]))];
    assert_eq!(generic.to_string(), "Map(Text, Person)");

    let imported = import_path("other.capnp", &["Thing"]);
    assert_eq!(imported.to_string(), "import \"other.capnp\".Thing");

    let mut abs = path(&["Outer", "Inner"]);
    abs.absolute = true;
    assert_eq!(abs.to_string(), ".Outer.Inner");
}

#[test]
fn test_imports_collected_in_first_use_order() {
    let field = |name: &str, p: Path| {
        Member::Field(FieldDecl {
            name: ident(name),
            ordinal: Ordinal {
                value: 0,
                span: Span::DUMMY,
            },
            ty: ty(p),
            default: None,
            annotations: Vec::new(),
            span: Span::DUMMY,
        })
    };
    let tree = SyntaxTree {
        id: None,
        annotations: Vec::new(),
        decls: vec![
            Decl {
                name: ident("A"),
                id: None,
                params: Vec::new(),
                annotations: Vec::new(),
                kind: DeclKind::Struct(StructDecl {
                    members: vec![
                        field("x", import_path("b.capnp", &["B"])),
                        field("y", import_path("a.capnp", &["A"])),
                        field("z", import_path("b.capnp", &["C"])),
                    ],
                }),
                span: Span::DUMMY,
            },
            Decl {
                name: ident("Alias"),
                id: None,
                params: Vec::new(),
                annotations: Vec::new(),
                kind: DeclKind::Using(UsingDecl {
                    target: ty(import_path("c.capnp", &[])),
                }),
                span: Span::DUMMY,
            },
        ],
        span: Span::DUMMY,
    };
    assert_eq!(tree.imports(), vec!["b.capnp", "a.capnp", "c.capnp"]);
}

#[test]
fn test_annotation_target_names() {
    for target in AnnotationTarget::ALL_TARGETS {
        assert_eq!(AnnotationTarget::from_name(target.as_str()), Some(target));
    }
    assert_eq!(AnnotationTarget::from_name("*"), Some(AnnotationTarget::All));
    assert_eq!(AnnotationTarget::from_name("module"), None);
}
