//! Schema Syntax Tree
//!
//! Declarations exactly as written. Every sequence keeps source order.
//!
//! ```capnp
//! @0xdbb9ad1f14bf0b36;
//! struct Person @0x8e0594c8abeb307c {
//!   name @0 :Text;
//!   birthday @1 :Date;
//! }
//! ```

use crate::Span;

/// A name with its source span.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Ident {
            name: name.into(),
            span,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

/// Explicit 64-bit id: `@0x8e0594c8abeb307c`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdLiteral {
    pub value: u64,
    pub span: Span,
}

/// Ordinal number on a field, enumerant or method: `@3`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ordinal {
    pub value: u32,
    pub span: Span,
}

/// A parsed schema file.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxTree {
    /// File id from the leading `@0x...;` line.
    pub id: Option<IdLiteral>,
    /// File-level `$annotation;` applications.
    pub annotations: Vec<AnnotationApp>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

impl SyntaxTree {
    /// Every `import "..."` string mentioned anywhere in the file, in first-use
    /// order, without duplicates.
    pub fn imports(&self) -> Vec<&str> {
        self.import_sites().into_iter().map(|(path, _)| path).collect()
    }

    /// Like [`imports`](Self::imports), paired with the span of the first
    /// `import` that names each file.
    pub fn import_sites(&self) -> Vec<(&str, Span)> {
        let mut out = Vec::new();
        for app in &self.annotations {
            app.collect_imports(&mut out);
        }
        for decl in &self.decls {
            decl.collect_imports(&mut out);
        }
        out
    }
}

/// A named declaration: struct, enum, interface, const, annotation or using.
#[derive(Clone, Debug, PartialEq)]
pub struct Decl {
    pub name: Ident,
    pub id: Option<IdLiteral>,
    /// Generic parameters: `struct Map(Key, Value)`.
    pub params: Vec<Ident>,
    pub annotations: Vec<AnnotationApp>,
    pub kind: DeclKind,
    pub span: Span,
}

impl Decl {
    fn collect_imports<'a>(&'a self, out: &mut Vec<(&'a str, Span)>) {
        for app in &self.annotations {
            app.collect_imports(out);
        }
        match &self.kind {
            DeclKind::Struct(s) => {
                for m in &s.members {
                    m.collect_imports(out);
                }
            }
            DeclKind::Enum(e) => {
                for en in &e.enumerants {
                    for app in &en.annotations {
                        app.collect_imports(out);
                    }
                }
            }
            DeclKind::Interface(i) => {
                for sup in &i.superclasses {
                    sup.path.collect_imports(out);
                }
                for m in &i.members {
                    m.collect_imports(out);
                }
            }
            DeclKind::Const(c) => {
                c.ty.path.collect_imports(out);
                c.value.collect_imports(out);
            }
            DeclKind::Annotation(a) => a.ty.path.collect_imports(out),
            DeclKind::Using(u) => u.target.path.collect_imports(out),
        }
    }
}

/// The kind of declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum DeclKind {
    Struct(StructDecl),
    Enum(EnumDecl),
    Interface(InterfaceDecl),
    Const(ConstDecl),
    Annotation(AnnotationDecl),
    /// `using Name = path;` or `using path;` (name taken from the last segment).
    Using(UsingDecl),
}

impl DeclKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            DeclKind::Struct(_) => "struct",
            DeclKind::Enum(_) => "enum",
            DeclKind::Interface(_) => "interface",
            DeclKind::Const(_) => "const",
            DeclKind::Annotation(_) => "annotation",
            DeclKind::Using(_) => "using",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructDecl {
    pub members: Vec<Member>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumDecl {
    pub enumerants: Vec<EnumerantDecl>,
}

/// `name @N $annots;`
#[derive(Clone, Debug, PartialEq)]
pub struct EnumerantDecl {
    pub name: Ident,
    pub ordinal: Ordinal,
    pub annotations: Vec<AnnotationApp>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceDecl {
    /// `extends(Base, Other)`
    pub superclasses: Vec<TypeExpr>,
    /// Methods and nested declarations.
    pub members: Vec<Member>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstDecl {
    pub ty: TypeExpr,
    pub value: ValueExpr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationDecl {
    pub targets: Vec<AnnotationTarget>,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UsingDecl {
    pub target: TypeExpr,
}

/// A member of a struct, group, union or interface body.
#[derive(Clone, Debug, PartialEq)]
pub enum Member {
    Field(FieldDecl),
    Group(GroupDecl),
    Union(UnionDecl),
    Nested(Decl),
    Method(MethodDecl),
}

impl Member {
    pub fn span(&self) -> Span {
        match self {
            Member::Field(f) => f.span,
            Member::Group(g) => g.span,
            Member::Union(u) => u.span,
            Member::Nested(d) => d.span,
            Member::Method(m) => m.span,
        }
    }

    fn collect_imports<'a>(&'a self, out: &mut Vec<(&'a str, Span)>) {
        match self {
            Member::Field(f) => {
                f.ty.path.collect_imports(out);
                if let Some(v) = &f.default {
                    v.collect_imports(out);
                }
                for app in &f.annotations {
                    app.collect_imports(out);
                }
            }
            Member::Group(g) => {
                for app in &g.annotations {
                    app.collect_imports(out);
                }
                for m in &g.members {
                    m.collect_imports(out);
                }
            }
            Member::Union(u) => {
                for app in &u.annotations {
                    app.collect_imports(out);
                }
                for m in &u.members {
                    m.collect_imports(out);
                }
            }
            Member::Nested(d) => d.collect_imports(out),
            Member::Method(m) => {
                m.params.collect_imports(out);
                if let Some(r) = &m.results {
                    r.collect_imports(out);
                }
                for app in &m.annotations {
                    app.collect_imports(out);
                }
            }
        }
    }
}

/// `name @N :Type = default $annots;`
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: Ident,
    pub ordinal: Ordinal,
    pub ty: TypeExpr,
    pub default: Option<ValueExpr>,
    pub annotations: Vec<AnnotationApp>,
    pub span: Span,
}

/// `name :group { ... }`
#[derive(Clone, Debug, PartialEq)]
pub struct GroupDecl {
    pub name: Ident,
    pub annotations: Vec<AnnotationApp>,
    pub members: Vec<Member>,
    pub span: Span,
}

/// `union { ... }` or `name :union { ... }`
#[derive(Clone, Debug, PartialEq)]
pub struct UnionDecl {
    /// `None` for an unnamed union.
    pub name: Option<Ident>,
    pub annotations: Vec<AnnotationApp>,
    pub members: Vec<Member>,
    pub span: Span,
}

/// `name @N (params) -> (results) $annots;`
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDecl {
    pub name: Ident,
    pub ordinal: Ordinal,
    pub params: MethodParams,
    /// `None` when the `->` clause is omitted.
    pub results: Option<MethodParams>,
    pub annotations: Vec<AnnotationApp>,
    pub span: Span,
}

/// Method parameter or result list.
#[derive(Clone, Debug, PartialEq)]
pub enum MethodParams {
    /// Inline list `(a :Int32, b :Text)`; becomes an auto-generated struct.
    Named(Vec<ParamDecl>),
    /// An existing struct type used directly.
    Struct(TypeExpr),
}

impl MethodParams {
    fn collect_imports<'a>(&'a self, out: &mut Vec<(&'a str, Span)>) {
        match self {
            MethodParams::Named(params) => {
                for p in params {
                    p.ty.path.collect_imports(out);
                    if let Some(v) = &p.default {
                        v.collect_imports(out);
                    }
                    for app in &p.annotations {
                        app.collect_imports(out);
                    }
                }
            }
            MethodParams::Struct(ty) => ty.path.collect_imports(out),
        }
    }
}

/// `name :Type = default $annots`
#[derive(Clone, Debug, PartialEq)]
pub struct ParamDecl {
    pub name: Ident,
    pub ty: TypeExpr,
    pub default: Option<ValueExpr>,
    pub annotations: Vec<AnnotationApp>,
    pub span: Span,
}

/// A type expression. Types are paths, possibly with generic arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeExpr {
    pub path: Path,
    pub span: Span,
}

/// A possibly qualified, possibly generic reference.
///
/// ```capnp
/// List(Person)
/// .Outer.Inner
/// import "other.capnp".Thing(Text)
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    /// Leading `.`: resolved from the file scope.
    pub absolute: bool,
    pub base: PathBase,
    /// Member segments after the base. For `PathBase::Name` the first
    /// segment is the base name itself.
    pub segments: Vec<PathSegment>,
    pub span: Span,
}

impl Path {
    /// The name of a plain single-segment path without arguments.
    pub fn as_simple_name(&self) -> Option<&str> {
        match (&self.base, self.absolute, self.segments.as_slice()) {
            (PathBase::Name, false, [seg]) if seg.args.is_empty() => Some(seg.name.as_str()),
            _ => None,
        }
    }

    /// The last segment's name, used for `using path;`.
    pub fn last_name(&self) -> Option<&Ident> {
        self.segments.last().map(|s| &s.name)
    }

    fn collect_imports<'a>(&'a self, out: &mut Vec<(&'a str, Span)>) {
        if let PathBase::Import { path, span } = &self.base {
            if !out.iter().any(|(seen, _)| *seen == path.as_str()) {
                out.push((path.as_str(), *span));
            }
        }
        for seg in &self.segments {
            for arg in &seg.args {
                arg.path.collect_imports(out);
            }
        }
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.absolute {
            f.write_str(".")?;
        }
        let mut first = true;
        if let PathBase::Import { path, .. } = &self.base {
            write!(f, "import \"{path}\"")?;
            first = false;
        }
        for seg in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            first = false;
            f.write_str(&seg.name.name)?;
            if !seg.args.is_empty() {
                f.write_str("(")?;
                for (i, arg) in seg.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg.path)?;
                }
                f.write_str(")")?;
            }
        }
        Ok(())
    }
}

/// Where a path starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathBase {
    /// `import "file.capnp"`
    Import { path: String, span: Span },
    /// The first segment is looked up lexically.
    Name,
}

/// One `.Name(Args)` step of a path.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSegment {
    pub name: Ident,
    pub args: Vec<TypeExpr>,
}

/// A literal or reference in value position.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueExpr {
    pub kind: ValueExprKind,
    pub span: Span,
}

impl ValueExpr {
    fn collect_imports<'a>(&'a self, out: &mut Vec<(&'a str, Span)>) {
        match &self.kind {
            ValueExprKind::Path(p) => p.collect_imports(out),
            ValueExprKind::List(items) => {
                for v in items {
                    v.collect_imports(out);
                }
            }
            ValueExprKind::Struct(fields) => {
                for (_, v) in fields {
                    v.collect_imports(out);
                }
            }
            _ => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueExprKind {
    /// Integer with sign kept apart so `-0x8000000000000000` is representable.
    Int { magnitude: u64, negative: bool },
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Bare names: `void`, `true`, `false`, `inf`, `nan`, enumerants and
    /// constant references.
    Path(Path),
    /// `[a, b, c]`
    List(Vec<ValueExpr>),
    /// `(name = value, ...)`
    Struct(Vec<(Ident, ValueExpr)>),
}

/// `$path(value)` annotation application.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationApp {
    pub path: Path,
    /// `None` when applied without parentheses (void annotations).
    pub value: Option<ValueExpr>,
    pub span: Span,
}

impl AnnotationApp {
    fn collect_imports<'a>(&'a self, out: &mut Vec<(&'a str, Span)>) {
        self.path.collect_imports(out);
        if let Some(v) = &self.value {
            v.collect_imports(out);
        }
    }
}

/// Declaration kinds an annotation may be applied to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum AnnotationTarget {
    File,
    Struct,
    Field,
    Union,
    Group,
    Enum,
    Enumerant,
    Interface,
    Method,
    Param,
    Annotation,
    Const,
    /// `*`: every target.
    All,
}

impl AnnotationTarget {
    pub const ALL_TARGETS: [AnnotationTarget; 12] = [
        AnnotationTarget::File,
        AnnotationTarget::Struct,
        AnnotationTarget::Field,
        AnnotationTarget::Union,
        AnnotationTarget::Group,
        AnnotationTarget::Enum,
        AnnotationTarget::Enumerant,
        AnnotationTarget::Interface,
        AnnotationTarget::Method,
        AnnotationTarget::Param,
        AnnotationTarget::Annotation,
        AnnotationTarget::Const,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "file" => AnnotationTarget::File,
            "struct" => AnnotationTarget::Struct,
            "field" => AnnotationTarget::Field,
            "union" => AnnotationTarget::Union,
            "group" => AnnotationTarget::Group,
            "enum" => AnnotationTarget::Enum,
            "enumerant" => AnnotationTarget::Enumerant,
            "interface" => AnnotationTarget::Interface,
            "method" => AnnotationTarget::Method,
            "param" => AnnotationTarget::Param,
            "annotation" => AnnotationTarget::Annotation,
            "const" => AnnotationTarget::Const,
            "*" => AnnotationTarget::All,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationTarget::File => "file",
            AnnotationTarget::Struct => "struct",
            AnnotationTarget::Field => "field",
            AnnotationTarget::Union => "union",
            AnnotationTarget::Group => "group",
            AnnotationTarget::Enum => "enum",
            AnnotationTarget::Enumerant => "enumerant",
            AnnotationTarget::Interface => "interface",
            AnnotationTarget::Method => "method",
            AnnotationTarget::Param => "param",
            AnnotationTarget::Annotation => "annotation",
            AnnotationTarget::Const => "const",
            AnnotationTarget::All => "*",
        }
    }
}

#[cfg(test)]
mod tests;
