//! Declaration table.
//!
//! One [`Scope`] per future node (plus one per `using` alias), created in
//! preorder so scope indices double as the graph's node order. Building the
//! table assigns ids, rejects duplicate ids and names, flattens struct
//! bodies into code-ordered member lists and checks union placement.

use capn_diagnostic::SourceLocation;
use capn_ir::{
    AnnotationApp, AnnotationDecl, ConstDecl, Decl, DeclKind, EnumDecl, FieldDecl, Ident,
    InterfaceDecl, Member, MethodDecl, MethodParams, ParamDecl, Span, TypeExpr,
    UnionDecl, UsingDecl, ValueExpr,
};
use rustc_hash::FxHashMap;

use super::loader::LoadedFile;
use crate::{id, CompileError, LayoutProblem};

pub(crate) type ScopeIdx = usize;

#[derive(Copy, Clone, Debug)]
pub(crate) enum ScopeKind<'a> {
    File,
    Struct,
    /// Group or named union.
    Group { is_union: bool },
    Enum(&'a EnumDecl),
    Interface(&'a InterfaceDecl),
    Const(&'a ConstDecl),
    Annotation(&'a AnnotationDecl),
    Using(&'a UsingDecl),
    /// Struct generated for a method's inline parameter or result list.
    Params,
}

impl ScopeKind<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            ScopeKind::File => "file",
            ScopeKind::Struct => "struct",
            ScopeKind::Group { is_union: false } => "group",
            ScopeKind::Group { is_union: true } => "union",
            ScopeKind::Enum(_) => "enum",
            ScopeKind::Interface(_) => "interface",
            ScopeKind::Const(_) => "constant",
            ScopeKind::Annotation(_) => "annotation",
            ScopeKind::Using(_) => "alias",
            ScopeKind::Params => "parameter list",
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum MemberSource<'a> {
    Slot(&'a FieldDecl),
    Param { decl: &'a ParamDecl, ordinal: u16 },
    /// Group or named union.
    Group(ScopeIdx),
}

/// A field of a struct-like scope, in code order.
#[derive(Copy, Clone, Debug)]
pub(crate) struct MemberPlan<'a> {
    pub name: &'a str,
    pub span: Span,
    /// Arm of the owning scope's union.
    pub in_union: bool,
    pub annotations: &'a [AnnotationApp],
    pub source: MemberSource<'a>,
}

impl<'a> MemberPlan<'a> {
    pub fn ordinal(&self) -> Option<u16> {
        match self.source {
            MemberSource::Slot(f) => u16::try_from(f.ordinal.value).ok(),
            MemberSource::Param { ordinal, .. } => Some(ordinal),
            MemberSource::Group(_) => None,
        }
    }

    pub fn ty(&self) -> Option<&'a TypeExpr> {
        match self.source {
            MemberSource::Slot(f) => Some(&f.ty),
            MemberSource::Param { decl, .. } => Some(&decl.ty),
            MemberSource::Group(_) => None,
        }
    }

    pub fn default(&self) -> Option<&'a ValueExpr> {
        match self.source {
            MemberSource::Slot(f) => f.default.as_ref(),
            MemberSource::Param { decl, .. } => decl.default.as_ref(),
            MemberSource::Group(_) => None,
        }
    }

    pub fn group(&self) -> Option<ScopeIdx> {
        match self.source {
            MemberSource::Group(scope) => Some(scope),
            MemberSource::Slot(_) | MemberSource::Param { .. } => None,
        }
    }
}

/// One entry of a node's child list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ChildPlan {
    Member(u16),
    Decl(ScopeIdx),
    Enumerant(u16),
    Method(u16),
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum ParamsSource<'a> {
    Generated(ScopeIdx),
    Existing(&'a TypeExpr),
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct MethodPlan<'a> {
    pub decl: &'a MethodDecl,
    pub params: ParamsSource<'a>,
    pub results: ParamsSource<'a>,
}

#[derive(Debug)]
pub(crate) struct Scope<'a> {
    pub id: u64,
    pub file: usize,
    /// Lexical parent.
    pub parent: Option<ScopeIdx>,
    /// Has a lexical parent but is not nested in it.
    pub detached: bool,
    pub display_name: String,
    pub prefix_len: u32,
    pub span: Span,
    pub params: &'a [Ident],
    pub annotations: &'a [AnnotationApp],
    pub kind: ScopeKind<'a>,
    /// Nested declarations and aliases.
    pub names: FxHashMap<&'a str, ScopeIdx>,
    pub members: Vec<MemberPlan<'a>>,
    pub methods: Vec<MethodPlan<'a>>,
    pub children: Vec<ChildPlan>,
    pub unnamed_union: Option<&'a UnionDecl>,
    declared: FxHashMap<&'a str, Span>,
}

impl<'a> Scope<'a> {
    fn new(id: u64, file: usize, display_name: String, prefix_len: usize, span: Span, kind: ScopeKind<'a>) -> Self {
        Scope {
            id,
            file,
            parent: None,
            detached: false,
            display_name,
            prefix_len: u32::try_from(prefix_len).unwrap_or(0),
            span,
            params: &[],
            annotations: &[],
            kind,
            names: FxHashMap::default(),
            members: Vec::new(),
            methods: Vec::new(),
            children: Vec::new(),
            unnamed_union: None,
            declared: FxHashMap::default(),
        }
    }

    fn within(mut self, parent: ScopeIdx) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn short_name(&self) -> &str {
        let start = usize::try_from(self.prefix_len).unwrap_or(0);
        self.display_name.get(start..).unwrap_or(&self.display_name)
    }

    /// The scope owns a union: a named union, or a struct or group with an
    /// unnamed one.
    pub fn has_union(&self) -> bool {
        self.unnamed_union.is_some() || matches!(self.kind, ScopeKind::Group { is_union: true })
    }
}

/// All scopes of an import closure.
pub(crate) struct DeclTable<'a> {
    pub files: &'a [LoadedFile],
    pub scopes: Vec<Scope<'a>>,
    /// Root scope of each file, by file index.
    pub file_scopes: Vec<ScopeIdx>,
    by_id: FxHashMap<u64, ScopeIdx>,
}

impl<'a> DeclTable<'a> {
    pub fn build(files: &'a [LoadedFile]) -> Result<Self, CompileError> {
        let mut table = DeclTable {
            files,
            scopes: Vec::new(),
            file_scopes: Vec::with_capacity(files.len()),
            by_id: FxHashMap::default(),
        };
        for (file, loaded) in files.iter().enumerate() {
            let tree = &loaded.parsed.tree;
            let name = loaded.parsed.name.as_str();
            let (id, span) = match &tree.id {
                Some(lit) => (lit.value, lit.span),
                None => (id::file_id(name), Span::DUMMY),
            };
            let scope = table.push(Scope::new(id, file, name.to_string(), 0, span, ScopeKind::File))?;
            table.scopes[scope].annotations = &tree.annotations;
            table.file_scopes.push(scope);
            for decl in &tree.decls {
                table.add_decl(scope, decl)?;
            }
        }
        tracing::debug!(scopes = table.scopes.len(), files = files.len(), "declaration table built");
        Ok(table)
    }

    pub fn locate(&self, scope: ScopeIdx, span: Span) -> SourceLocation {
        self.files[self.scopes[scope].file].parsed.locate(span)
    }

    pub fn location_of(&self, scope: ScopeIdx) -> SourceLocation {
        self.locate(scope, self.scopes[scope].span)
    }

    pub fn scope_by_id(&self, id: u64) -> Option<ScopeIdx> {
        self.by_id.get(&id).copied()
    }

    pub fn file_scope(&self, scope: ScopeIdx) -> ScopeIdx {
        self.file_scopes[self.scopes[scope].file]
    }

    /// Root scope of the file `import` names, as written in `scope`'s file.
    pub fn import_target(&self, scope: ScopeIdx, import: &str) -> Option<ScopeIdx> {
        self.files[self.scopes[scope].file]
            .import_target(import)
            .map(|file| self.file_scopes[file])
    }

    /// `inner` is `outer` or lexically nested inside it.
    pub fn is_within(&self, inner: ScopeIdx, outer: ScopeIdx) -> bool {
        let mut current = Some(inner);
        while let Some(scope) = current {
            if scope == outer {
                return true;
            }
            current = self.scopes[scope].parent;
        }
        false
    }

    fn push(&mut self, scope: Scope<'a>) -> Result<ScopeIdx, CompileError> {
        let index = self.scopes.len();
        if !matches!(scope.kind, ScopeKind::Using(_)) {
            if let Some(&first) = self.by_id.get(&scope.id) {
                let first_scope = &self.scopes[first];
                return Err(CompileError::DuplicateId {
                    id: scope.id,
                    name: scope.display_name.clone(),
                    location: self.files[scope.file].parsed.locate(scope.span),
                    first_name: first_scope.display_name.clone(),
                    first: self.location_of(first),
                });
            }
            self.by_id.insert(scope.id, index);
            tracing::trace!(id = %format_args!("@0x{:016x}", scope.id), name = %scope.display_name, "scope");
        }
        self.scopes.push(scope);
        Ok(index)
    }

    fn declare(&mut self, scope: ScopeIdx, name: &'a str, span: Span) -> Result<(), CompileError> {
        if let Some(&first) = self.scopes[scope].declared.get(name) {
            return Err(CompileError::DuplicateName {
                name: name.to_string(),
                location: self.locate(scope, span),
                first: self.locate(scope, first),
            });
        }
        self.scopes[scope].declared.insert(name, span);
        Ok(())
    }

    fn nested_display_name(&self, parent: ScopeIdx, name: &str) -> (String, usize) {
        let parent = &self.scopes[parent];
        let separator = if matches!(parent.kind, ScopeKind::File) { ':' } else { '.' };
        let display = format!("{}{separator}{name}", parent.display_name);
        let prefix = display.len() - name.len();
        (display, prefix)
    }

    fn add_decl(&mut self, parent: ScopeIdx, decl: &'a Decl) -> Result<ScopeIdx, CompileError> {
        let name = decl.name.as_str();
        self.declare(parent, name, decl.name.span)?;

        let kind = match &decl.kind {
            DeclKind::Struct(_) => ScopeKind::Struct,
            DeclKind::Enum(e) => ScopeKind::Enum(e),
            DeclKind::Interface(i) => ScopeKind::Interface(i),
            DeclKind::Const(c) => ScopeKind::Const(c),
            DeclKind::Annotation(a) => ScopeKind::Annotation(a),
            DeclKind::Using(u) => ScopeKind::Using(u),
        };
        let id = match (&decl.kind, &decl.id) {
            (DeclKind::Using(_), _) => 0,
            (_, Some(lit)) => lit.value,
            (_, None) => id::child_id(self.scopes[parent].id, name),
        };
        let (display, prefix) = self.nested_display_name(parent, name);
        let file = self.scopes[parent].file;
        let scope = self.push(Scope::new(id, file, display, prefix, decl.span, kind).within(parent))?;
        self.scopes[scope].params = &decl.params;
        self.scopes[scope].annotations = &decl.annotations;
        self.scopes[parent].names.insert(name, scope);
        if !matches!(decl.kind, DeclKind::Using(_)) {
            self.scopes[parent].children.push(ChildPlan::Decl(scope));
        }

        match &decl.kind {
            DeclKind::Struct(s) => {
                self.add_members(scope, &s.members, false)?;
                self.check_union_size(scope)?;
            }
            DeclKind::Enum(e) => self.add_enumerants(scope, e)?,
            DeclKind::Interface(i) => self.add_interface_body(scope, i)?,
            DeclKind::Const(_) | DeclKind::Annotation(_) | DeclKind::Using(_) => {}
        }
        Ok(scope)
    }

    fn push_member(&mut self, scope: ScopeIdx, plan: MemberPlan<'a>) -> Result<u16, CompileError> {
        let code_order = self.next_code_order(scope, plan.span)?;
        self.scopes[scope].members.push(plan);
        self.scopes[scope].children.push(ChildPlan::Member(code_order));
        Ok(code_order)
    }

    fn next_code_order(&self, scope: ScopeIdx, span: Span) -> Result<u16, CompileError> {
        u16::try_from(self.scopes[scope].members.len()).map_err(|_| CompileError::Layout {
            problem: LayoutProblem::Ordinals,
            message: "too many members".to_string(),
            location: self.locate(scope, span),
        })
    }

    fn add_members(&mut self, scope: ScopeIdx, members: &'a [Member], in_union: bool) -> Result<(), CompileError> {
        for member in members {
            match member {
                Member::Field(f) => {
                    self.declare(scope, f.name.as_str(), f.name.span)?;
                    self.push_member(
                        scope,
                        MemberPlan {
                            name: f.name.as_str(),
                            span: f.span,
                            in_union,
                            annotations: &f.annotations,
                            source: MemberSource::Slot(f),
                        },
                    )?;
                }
                Member::Group(g) => {
                    self.add_group(scope, &g.name, &g.annotations, &g.members, g.span, in_union, false)?;
                }
                Member::Union(u) => match &u.name {
                    Some(name) => {
                        self.add_group(scope, name, &u.annotations, &u.members, u.span, in_union, true)?;
                    }
                    None => {
                        if in_union {
                            return Err(self.misplaced_union(
                                scope,
                                "an unnamed union cannot appear directly inside another union",
                                u.span,
                            ));
                        }
                        if self.scopes[scope].unnamed_union.is_some() {
                            return Err(self.misplaced_union(
                                scope,
                                "only one unnamed union is allowed per struct or group",
                                u.span,
                            ));
                        }
                        self.scopes[scope].unnamed_union = Some(u);
                        self.add_members(scope, &u.members, true)?;
                    }
                },
                Member::Nested(decl) => {
                    self.add_decl(scope, decl)?;
                }
                Member::Method(m) => {
                    return Err(CompileError::InvalidType {
                        message: format!("method `{}` declared outside an interface", m.name.as_str()),
                        location: self.locate(scope, m.span),
                    });
                }
            }
        }
        Ok(())
    }

    fn misplaced_union(&self, scope: ScopeIdx, message: &str, span: Span) -> CompileError {
        CompileError::Layout {
            problem: LayoutProblem::MisplacedUnion,
            message: message.to_string(),
            location: self.locate(scope, span),
        }
    }

    #[expect(clippy::too_many_arguments, reason = "groups and named unions share this path")]
    fn add_group(
        &mut self,
        parent: ScopeIdx,
        name: &'a Ident,
        annotations: &'a [AnnotationApp],
        members: &'a [Member],
        span: Span,
        in_union: bool,
        is_union: bool,
    ) -> Result<(), CompileError> {
        self.declare(parent, name.as_str(), name.span)?;
        let code_order = self.next_code_order(parent, span)?;
        let id = id::group_id(self.scopes[parent].id, code_order);
        let (display, prefix) = self.nested_display_name(parent, name.as_str());
        let file = self.scopes[parent].file;
        let group = self.push(Scope::new(id, file, display, prefix, span, ScopeKind::Group { is_union }).within(parent))?;
        self.scopes[group].annotations = annotations;
        self.push_member(
            parent,
            MemberPlan {
                name: name.as_str(),
                span,
                in_union,
                annotations,
                source: MemberSource::Group(group),
            },
        )?;
        self.add_members(group, members, is_union)?;
        self.check_union_size(group)
    }

    fn check_union_size(&self, scope: ScopeIdx) -> Result<(), CompileError> {
        let s = &self.scopes[scope];
        if !s.has_union() {
            return Ok(());
        }
        let arms = s.members.iter().filter(|m| m.in_union).count();
        if arms >= 2 {
            return Ok(());
        }
        let span = s.unnamed_union.map_or(s.span, |u| u.span);
        Err(CompileError::Layout {
            problem: LayoutProblem::UnionTooSmall,
            message: format!("union in `{}` must have at least two members", s.display_name),
            location: self.locate(scope, span),
        })
    }

    fn add_enumerants(&mut self, scope: ScopeIdx, decl: &'a EnumDecl) -> Result<(), CompileError> {
        let mut ordinals = Vec::with_capacity(decl.enumerants.len());
        for (i, en) in decl.enumerants.iter().enumerate() {
            self.declare(scope, en.name.as_str(), en.name.span)?;
            let index = u16::try_from(i).map_err(|_| self.too_many(scope, en.span))?;
            self.scopes[scope].children.push(ChildPlan::Enumerant(index));
            ordinals.push((en.ordinal.value, en.name.as_str(), en.ordinal.span));
        }
        self.check_ordinals(scope, &mut ordinals)
    }

    fn add_interface_body(&mut self, scope: ScopeIdx, decl: &'a InterfaceDecl) -> Result<(), CompileError> {
        let mut ordinals = Vec::new();
        for member in &decl.members {
            match member {
                Member::Nested(nested) => {
                    self.add_decl(scope, nested)?;
                }
                Member::Method(method) => {
                    self.declare(scope, method.name.as_str(), method.name.span)?;
                    let index = u16::try_from(self.scopes[scope].methods.len())
                        .map_err(|_| self.too_many(scope, method.span))?;
                    let params = self.add_params(scope, method, Some(&method.params), false)?;
                    let results = self.add_params(scope, method, method.results.as_ref(), true)?;
                    self.scopes[scope].methods.push(MethodPlan {
                        decl: method,
                        params,
                        results,
                    });
                    self.scopes[scope].children.push(ChildPlan::Method(index));
                    ordinals.push((method.ordinal.value, method.name.as_str(), method.ordinal.span));
                }
                other => {
                    return Err(CompileError::InvalidType {
                        message: "interfaces may only contain methods and nested declarations"
                            .to_string(),
                        location: self.locate(scope, other.span()),
                    });
                }
            }
        }
        self.check_ordinals(scope, &mut ordinals)
    }

    /// Scope for an inline parameter list; `None` is the empty result list
    /// of a method without `->`.
    fn add_params(
        &mut self,
        iface: ScopeIdx,
        method: &'a MethodDecl,
        params: Option<&'a MethodParams>,
        is_results: bool,
    ) -> Result<ParamsSource<'a>, CompileError> {
        let list: &'a [ParamDecl] = match params {
            Some(MethodParams::Struct(ty)) => return Ok(ParamsSource::Existing(ty)),
            Some(MethodParams::Named(list)) => list,
            None => &[],
        };
        let ordinal = u16::try_from(method.ordinal.value).map_err(|_| self.too_many(iface, method.span))?;
        let id = id::method_param_id(self.scopes[iface].id, ordinal, is_results);
        let suffix = if is_results { "$Results" } else { "$Params" };
        let short = format!("{}{suffix}", method.name.as_str());
        let (display, prefix) = self.nested_display_name(iface, &short);
        let file = self.scopes[iface].file;
        let mut scope = Scope::new(id, file, display, prefix, method.span, ScopeKind::Params)
            .within(iface);
        scope.detached = true;
        let scope = self.push(scope)?;

        for (i, param) in list.iter().enumerate() {
            self.declare(scope, param.name.as_str(), param.name.span)?;
            let ordinal = u16::try_from(i).map_err(|_| self.too_many(scope, param.span))?;
            self.push_member(
                scope,
                MemberPlan {
                    name: param.name.as_str(),
                    span: param.span,
                    in_union: false,
                    annotations: &param.annotations,
                    source: MemberSource::Param { decl: param, ordinal },
                },
            )?;
        }
        Ok(ParamsSource::Generated(scope))
    }

    fn too_many(&self, scope: ScopeIdx, span: Span) -> CompileError {
        CompileError::Layout {
            problem: LayoutProblem::Ordinals,
            message: "too many members".to_string(),
            location: self.locate(scope, span),
        }
    }

    /// Ordinals must be unique and run `0..n`.
    pub fn check_ordinals(&self, scope: ScopeIdx, ordinals: &mut [(u32, &str, Span)]) -> Result<(), CompileError> {
        ordinals.sort_by_key(|&(ordinal, _, _)| ordinal);
        for pair in ordinals.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.0 == b.0 {
                return Err(self.ordinal_error(
                    scope,
                    format!("ordinal @{} is used by both `{}` and `{}`", a.0, a.1, b.1),
                    b.2,
                ));
            }
        }
        for (expected, &(ordinal, name, span)) in (0u32..).zip(ordinals.iter()) {
            if ordinal != expected {
                return Err(self.ordinal_error(
                    scope,
                    format!("skipped ordinal @{expected}: `{name}` is @{ordinal}, but ordinals must be sequential starting from @0"),
                    span,
                ));
            }
        }
        Ok(())
    }

    fn ordinal_error(&self, scope: ScopeIdx, message: String, span: Span) -> CompileError {
        CompileError::Layout {
            problem: LayoutProblem::Ordinals,
            message,
            location: self.locate(scope, span),
        }
    }
}
