//! Resolution: from parsed files to a [`SchemaGraph`].
//!
//! Passes run in a fixed order over the whole import closure: loading,
//! the declaration table (ids, names, member lists), types, struct layout,
//! then values and annotations while nodes are assembled. The first error
//! stops the compile.

mod annotations;
mod layout;
mod loader;
mod scope;
mod types;
mod values;

use capn_ir::AnnotationTarget;
use capn_parse::ParsedFile;
use rustc_hash::FxHashMap;

pub use loader::{ImportLoader, LoadError};

use self::layout::Layouts;
use self::scope::{ChildPlan, DeclTable, MemberPlan, MemberSource, ParamsSource, ScopeIdx, ScopeKind};
use self::types::Lookup;
use self::values::Evaluator;
use crate::{
    AnnotationNode, AnnotationUse, Child, ChildRef, CompileError, ConstNode, EnumNode, Enumerant,
    Field, FieldBody, FileNode, ImportEdge, InterfaceNode, Method, NestedNode, Node, NodeBody,
    SchemaGraph, Slot, SlotLocation, StructNode, TypeRef, Value,
};

/// Compile `root` and everything it imports. The root's file name is its
/// loader key.
pub fn resolve(root: ParsedFile, loader: &dyn ImportLoader) -> Result<SchemaGraph, CompileError> {
    let key = root.name.clone();
    resolve_keyed(key, root, loader)
}

/// Compile `root`, known to `loader` as `key`.
pub fn resolve_keyed(
    key: String,
    root: ParsedFile,
    loader: &dyn ImportLoader,
) -> Result<SchemaGraph, CompileError> {
    let files = loader::load_closure(key, root, loader)?;
    let table = DeclTable::build(&files)?;

    let mut lookup = Lookup::new(&table);
    let types = resolve_types(&mut lookup)?;
    let layouts = layout::compute(&table, &types.slots)?;

    let mut builder = NodeBuilder {
        table: &table,
        types: &types,
        layouts: &layouts,
        eval: Evaluator::new(lookup, &types),
    };
    let mut nodes = Vec::with_capacity(table.scopes.len());
    for index in 0..table.scopes.len() {
        if let Some(node) = builder.build(index)? {
            nodes.push(node);
        }
    }

    let graph = SchemaGraph::from_nodes(nodes).map_err(|message| CompileError::Precompiled {
        message: format!("malformed schema graph: {message}"),
    })?;
    tracing::debug!(root = %graph.root().display_name, nodes = graph.len(), "resolved");
    Ok(graph)
}

/// Types of everything that has one, by scope.
#[derive(Debug, Default)]
pub(crate) struct ResolvedTypes {
    /// Slot types by `(scope, member code order)`.
    pub slots: FxHashMap<(ScopeIdx, u16), TypeRef>,
    pub consts: FxHashMap<ScopeIdx, TypeRef>,
    pub annotations: FxHashMap<ScopeIdx, TypeRef>,
    pub superclasses: FxHashMap<ScopeIdx, Vec<TypeRef>>,
    /// Param and result struct ids by `(interface, method index)`.
    pub methods: FxHashMap<(ScopeIdx, u16), (u64, u64)>,
}

fn resolve_types(lookup: &mut Lookup<'_, '_>) -> Result<ResolvedTypes, CompileError> {
    let table = lookup.table();
    let mut types = ResolvedTypes::default();

    for (index, scope) in table.scopes.iter().enumerate() {
        match scope.kind {
            ScopeKind::Const(decl) => {
                types.consts.insert(index, lookup.resolve_type(&decl.ty, index)?);
            }
            ScopeKind::Annotation(decl) => {
                types.annotations.insert(index, lookup.resolve_type(&decl.ty, index)?);
            }
            ScopeKind::Interface(decl) => {
                let mut supers = Vec::with_capacity(decl.superclasses.len());
                for expr in &decl.superclasses {
                    let ty = lookup.resolve_type(expr, index)?;
                    if !matches!(ty, TypeRef::Interface { .. }) {
                        return Err(CompileError::InvalidType {
                            message: format!("superclass `{}` is not an interface", expr.path),
                            location: table.locate(index, expr.span),
                        });
                    }
                    supers.push(ty);
                }
                types.superclasses.insert(index, supers);

                for (i, plan) in scope.methods.iter().enumerate() {
                    let params = params_struct(lookup, plan.params, index)?;
                    let results = params_struct(lookup, plan.results, index)?;
                    let i = u16::try_from(i).unwrap_or(u16::MAX);
                    types.methods.insert((index, i), (params, results));
                }
            }
            _ => {}
        }

        for (i, member) in scope.members.iter().enumerate() {
            if let Some(expr) = member.ty() {
                let ty = lookup.resolve_type(expr, index)?;
                let i = u16::try_from(i).unwrap_or(u16::MAX);
                types.slots.insert((index, i), ty);
            }
        }
    }
    Ok(types)
}

/// Struct id behind a method's parameter or result list.
fn params_struct(lookup: &mut Lookup<'_, '_>, source: ParamsSource<'_>, iface: ScopeIdx) -> Result<u64, CompileError> {
    let table = lookup.table();
    match source {
        ParamsSource::Generated(scope) => Ok(table.scopes[scope].id),
        ParamsSource::Existing(expr) => match lookup.resolve_type(expr, iface)? {
            TypeRef::Struct { id, .. } => Ok(id),
            other => Err(CompileError::InvalidType {
                message: format!(
                    "method parameters must be a struct, found `{}`",
                    lookup.type_display(&other)
                ),
                location: table.locate(iface, expr.span),
            }),
        },
    }
}

struct NodeBuilder<'t, 'a> {
    table: &'t DeclTable<'a>,
    types: &'t ResolvedTypes,
    layouts: &'t Layouts,
    eval: Evaluator<'t, 'a>,
}

impl NodeBuilder<'_, '_> {
    /// Node for a scope; aliases produce none.
    fn build(&mut self, index: ScopeIdx) -> Result<Option<Node>, CompileError> {
        let table = self.table;
        let scope = &table.scopes[index];

        let (target, body) = match scope.kind {
            ScopeKind::Using(_) => return Ok(None),
            ScopeKind::File => (Some(AnnotationTarget::File), self.file_body(index)),
            ScopeKind::Struct => (Some(AnnotationTarget::Struct), self.struct_body(index, false)?),
            ScopeKind::Params => (None, self.struct_body(index, false)?),
            ScopeKind::Group { is_union } => {
                let target = if is_union {
                    AnnotationTarget::Union
                } else {
                    AnnotationTarget::Group
                };
                (Some(target), self.struct_body(index, true)?)
            }
            ScopeKind::Enum(_) => (Some(AnnotationTarget::Enum), self.enum_body(index)?),
            ScopeKind::Interface(_) => (Some(AnnotationTarget::Interface), self.interface_body(index)?),
            ScopeKind::Const(_) => {
                let ty = self.types.consts.get(&index).cloned().unwrap_or(TypeRef::Void);
                let value = self.eval.const_value(index)?;
                (Some(AnnotationTarget::Const), NodeBody::Const(ConstNode { ty, value }))
            }
            ScopeKind::Annotation(decl) => {
                let ty = self.types.annotations.get(&index).cloned().unwrap_or(TypeRef::Void);
                let body = NodeBody::Annotation(AnnotationNode {
                    ty,
                    targets: decl.targets.clone(),
                });
                (Some(AnnotationTarget::Annotation), body)
            }
        };

        let annotations = match target {
            Some(target) => self.eval.annotations(scope.annotations, target, index)?,
            None => Vec::new(),
        };

        let scope_id = match scope.parent {
            Some(parent) if !scope.detached => table.scopes[parent].id,
            _ => 0,
        };

        let mut children = Vec::with_capacity(scope.children.len());
        let mut nested = Vec::new();
        for plan in &scope.children {
            let child = self.child(index, *plan);
            if let ChildPlan::Decl(decl) = plan {
                nested.push(NestedNode {
                    name: child.name.clone(),
                    id: table.scopes[*decl].id,
                });
            }
            children.push(child);
        }

        Ok(Some(Node {
            id: scope.id,
            display_name: scope.display_name.clone(),
            display_name_prefix_length: scope.prefix_len,
            scope_id,
            parameters: scope.params.iter().map(|p| p.as_str().to_string()).collect(),
            nested,
            children,
            annotations,
            location: table.location_of(index),
            body,
        }))
    }

    fn child(&self, index: ScopeIdx, plan: ChildPlan) -> Child {
        let table = self.table;
        let scope = &table.scopes[index];
        let (name, target) = match plan {
            ChildPlan::Member(i) => (
                scope.members.get(usize::from(i)).map_or("", |m| m.name).to_string(),
                ChildRef::Field(u32::from(i)),
            ),
            ChildPlan::Decl(decl) => {
                let nested = &table.scopes[decl];
                (nested.short_name().to_string(), ChildRef::Node(nested.id))
            }
            ChildPlan::Enumerant(i) => {
                let name = match scope.kind {
                    ScopeKind::Enum(decl) => decl
                        .enumerants
                        .get(usize::from(i))
                        .map_or("", |en| en.name.as_str()),
                    _ => "",
                };
                (name.to_string(), ChildRef::Enumerant(u32::from(i)))
            }
            ChildPlan::Method(i) => (
                scope
                    .methods
                    .get(usize::from(i))
                    .map_or("", |m| m.decl.name.as_str())
                    .to_string(),
                ChildRef::Method(u32::from(i)),
            ),
        };
        Child { name, target }
    }

    fn file_body(&self, index: ScopeIdx) -> NodeBody {
        let table = self.table;
        let loaded = &table.files[table.scopes[index].file];
        let imports = loaded
            .imports
            .iter()
            .map(|(name, file)| ImportEdge {
                id: table.scopes[table.file_scopes[*file]].id,
                name: name.clone(),
            })
            .collect();
        NodeBody::File(FileNode { imports })
    }

    fn struct_body(&mut self, index: ScopeIdx, is_group: bool) -> Result<NodeBody, CompileError> {
        let table = self.table;
        let scope = &table.scopes[index];

        if let Some(union) = scope.unnamed_union {
            // Checked, but there is no node to carry them.
            self.eval.annotations(&union.annotations, AnnotationTarget::Union, index)?;
        }

        let mut fields = Vec::with_capacity(scope.members.len());
        for (i, member) in scope.members.iter().enumerate() {
            let code_order = u16::try_from(i).unwrap_or(u16::MAX);
            fields.push(self.field(index, code_order, member)?);
        }

        let (data_words, pointer_count) = self.layouts.sizes.get(&index).copied().unwrap_or_default();
        let (discriminant_count, discriminant_offset) = self.layouts.unions.get(&index).copied().unwrap_or_default();
        Ok(NodeBody::Struct(StructNode {
            data_words,
            pointer_count,
            is_group,
            discriminant_count,
            discriminant_offset,
            fields,
        }))
    }

    fn field(&mut self, index: ScopeIdx, code_order: u16, member: &MemberPlan<'_>) -> Result<Field, CompileError> {
        let key = (index, code_order);
        let discriminant_value = self.layouts.discriminants.get(&key).copied();

        let (annotations, body) = match member.source {
            MemberSource::Group(group) => {
                let target = match self.table.scopes[group].kind {
                    ScopeKind::Group { is_union: true } => AnnotationTarget::Union,
                    _ => AnnotationTarget::Group,
                };
                let annotations = self.eval.annotations(member.annotations, target, index)?;
                let body = FieldBody::Group {
                    type_id: self.table.scopes[group].id,
                };
                (annotations, body)
            }
            MemberSource::Slot(_) | MemberSource::Param { .. } => {
                let target = match member.source {
                    MemberSource::Param { .. } => AnnotationTarget::Param,
                    _ => AnnotationTarget::Field,
                };
                let ty = self.types.slots.get(&key).cloned().unwrap_or(TypeRef::Void);
                let (default, had_explicit_default) = match member.default() {
                    Some(expr) => (self.eval.eval(expr, &ty, index)?, true),
                    None => (Value::default_for(&ty), false),
                };
                let annotations = self.eval.annotations(member.annotations, target, index)?;
                let location = self.layouts.slots.get(&key).copied().unwrap_or(SlotLocation::None);
                let body = FieldBody::Slot(Slot {
                    ty,
                    default,
                    had_explicit_default,
                    location,
                });
                (annotations, body)
            }
        };

        Ok(Field {
            name: member.name.to_string(),
            code_order,
            ordinal: member.ordinal(),
            discriminant_value,
            annotations,
            body,
        })
    }

    fn enum_body(&mut self, index: ScopeIdx) -> Result<NodeBody, CompileError> {
        let ScopeKind::Enum(decl) = self.table.scopes[index].kind else {
            return Ok(NodeBody::Enum(EnumNode { enumerants: Vec::new() }));
        };
        let mut enumerants = Vec::with_capacity(decl.enumerants.len());
        for (i, en) in decl.enumerants.iter().enumerate() {
            enumerants.push(Enumerant {
                name: en.name.as_str().to_string(),
                ordinal: u16::try_from(en.ordinal.value).unwrap_or(u16::MAX),
                code_order: u16::try_from(i).unwrap_or(u16::MAX),
                annotations: self.eval.annotations(&en.annotations, AnnotationTarget::Enumerant, index)?,
            });
        }
        Ok(NodeBody::Enum(EnumNode { enumerants }))
    }

    fn interface_body(&mut self, index: ScopeIdx) -> Result<NodeBody, CompileError> {
        let table = self.table;
        let scope = &table.scopes[index];
        let mut methods = Vec::with_capacity(scope.methods.len());
        for (i, plan) in scope.methods.iter().enumerate() {
            let code_order = u16::try_from(i).unwrap_or(u16::MAX);
            let (param_struct, result_struct) = self
                .types
                .methods
                .get(&(index, code_order))
                .copied()
                .unwrap_or_default();
            let annotations: Vec<AnnotationUse> =
                self.eval.annotations(&plan.decl.annotations, AnnotationTarget::Method, index)?;
            methods.push(Method {
                name: plan.decl.name.as_str().to_string(),
                ordinal: u16::try_from(plan.decl.ordinal.value).unwrap_or(u16::MAX),
                code_order,
                param_struct,
                result_struct,
                annotations,
            });
        }
        let superclasses = self.types.superclasses.get(&index).cloned().unwrap_or_default();
        Ok(NodeBody::Interface(InterfaceNode {
            methods,
            superclasses,
        }))
    }
}

#[cfg(test)]
mod tests;
