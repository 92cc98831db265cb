//! Handles on schema nodes.

use std::fmt;
use std::sync::Arc;

use capn_schema::{ChildRef, FieldBody, Node, NodeKind, SchemaGraph};

use crate::{Children, EnumerantRef, FieldRef, MethodRef, Reflect, ReflectError, Reflected};

/// A node of a shared schema graph.
#[derive(Clone)]
pub struct NodeRef {
    graph: Arc<SchemaGraph>,
    index: usize,
}

impl NodeRef {
    /// Handle on the node `id`, if the graph has one.
    pub fn new(graph: Arc<SchemaGraph>, id: u64) -> Option<Self> {
        let index = graph.position(id)?;
        Some(NodeRef { graph, index })
    }

    /// Handle on the compiled root file.
    pub fn root(graph: Arc<SchemaGraph>) -> Self {
        NodeRef { graph, index: 0 }
    }

    pub fn node(&self) -> &Node {
        &self.graph.nodes()[self.index]
    }

    pub fn graph(&self) -> &Arc<SchemaGraph> {
        &self.graph
    }

    pub fn id(&self) -> u64 {
        self.node().id
    }

    pub fn kind(&self) -> NodeKind {
        self.node().kind()
    }

    pub fn name(&self) -> &str {
        self.node().short_name()
    }

    pub fn display_name(&self) -> &str {
        &self.node().display_name
    }

    /// Enclosing node; `None` for files and method parameter structs.
    pub fn parent(&self) -> Option<NodeRef> {
        let scope_id = self.node().scope_id;
        if scope_id == 0 {
            return None;
        }
        NodeRef::new(Arc::clone(&self.graph), scope_id)
    }

    /// Nested declarations, in declaration order.
    pub fn nested(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.node()
            .nested
            .iter()
            .filter_map(|n| NodeRef::new(Arc::clone(&self.graph), n.id))
    }

    pub(crate) fn at(&self, id: u64) -> Result<NodeRef, ReflectError> {
        NodeRef::new(Arc::clone(&self.graph), id).ok_or(ReflectError::MissingNode { id })
    }

    fn no_such_child(&self, name: &str) -> ReflectError {
        ReflectError::NoSuchChild {
            name: name.to_string(),
            node: self.node().display_name.clone(),
        }
    }

    /// `Name(Nested(...), ...)` over nested declarations.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        out.push_str(self.name());
        out.push('(');
        for (i, nested) in self.nested().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            nested.render_into(out);
        }
        out.push(')');
    }
}

impl Reflect for NodeRef {
    fn children(&self) -> Children {
        Children::of(Arc::clone(&self.graph), self.index)
    }

    fn resolve_child(&self, name: &str) -> Result<Reflected, ReflectError> {
        let node = self.node();
        let child = node.child(name).ok_or_else(|| self.no_such_child(name))?;
        tracing::trace!(node = %node.display_name, child = name, "resolve child");

        let missing = || self.no_such_child(name);
        let member = |i: u32| usize::try_from(i).map_err(|_| missing());
        match child.target {
            ChildRef::Node(id) => self.at(id).map(Reflected::Node),
            ChildRef::Field(i) => {
                let index = member(i)?;
                let field = node.fields().get(index).ok_or_else(missing)?;
                match field.body {
                    FieldBody::Group { type_id } => self.at(type_id).map(Reflected::Node),
                    FieldBody::Slot(_) => FieldRef::new(self.clone(), index)
                        .map(Reflected::Field)
                        .ok_or_else(missing),
                }
            }
            ChildRef::Enumerant(i) => EnumerantRef::new(self.clone(), member(i)?)
                .map(Reflected::Enumerant)
                .ok_or_else(missing),
            ChildRef::Method(i) => MethodRef::new(self.clone(), member(i)?)
                .map(Reflected::Method)
                .ok_or_else(missing),
        }
    }

    fn identifier_display(&self) -> String {
        format!("@0x{:016x}", self.id())
    }

    fn describe(&self) -> String {
        let node = self.node();
        let mut out = format!("{} {}", node.kind(), node.short_name());
        if node.is_generic() {
            out.push('(');
            out.push_str(&node.parameters.join(", "));
            out.push(')');
        }
        out.push(' ');
        out.push_str(&self.identifier_display());
        out
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &format_args!("@0x{:016x}", self.id()))
            .field("name", &self.display_name())
            .finish()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_tree())
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph) && self.index == other.index
    }
}

impl Eq for NodeRef {}
