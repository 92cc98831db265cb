//! The compiled, immutable schema graph.

use rustc_hash::FxHashMap;

use crate::{BrandBinding, ChildRef, Node, NodeKind, TypeRef};
#[cfg(feature = "cache")]
use crate::CompileError;

/// Every node reachable from one compiled root file.
///
/// Nodes are stored in a deterministic order: the root file first, then
/// each file's declarations depth-first in declaration order, files in the
/// order their imports were first loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaGraph {
    nodes: Vec<Node>,
    index: FxHashMap<u64, usize>,
}

impl SchemaGraph {
    /// Build a graph. Ids must be unique and the first node must be a file.
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Result<Self, String> {
        match nodes.first() {
            Some(root) if root.kind() == NodeKind::File => {}
            Some(root) => return Err(format!("root node `{}` is not a file", root.display_name)),
            None => return Err("graph has no nodes".to_string()),
        }
        let mut index = FxHashMap::default();
        index.reserve(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id, i).is_some() {
                return Err(format!("id @0x{:016x} used by more than one node", node.id));
            }
        }
        let graph = SchemaGraph { nodes, index };
        graph.check_references()?;
        Ok(graph)
    }

    /// Every child must point at something that exists: a node in the
    /// graph, or an index into its owner's fields, enumerants or methods.
    fn check_references(&self) -> Result<(), String> {
        for node in &self.nodes {
            for child in &node.children {
                let missing = |what: &str| {
                    format!("`{}` child `{}` has no {what}", node.display_name, child.name)
                };
                let target = match child.target {
                    ChildRef::Node(id) => Some(id),
                    ChildRef::Field(i) => as_index(i)
                        .and_then(|i| node.fields().get(i))
                        .ok_or_else(|| missing("field"))?
                        .group_id(),
                    ChildRef::Enumerant(i) => {
                        as_index(i)
                            .and_then(|i| node.enumerants().get(i))
                            .ok_or_else(|| missing("enumerant"))?;
                        None
                    }
                    ChildRef::Method(i) => {
                        as_index(i)
                            .and_then(|i| node.methods().get(i))
                            .ok_or_else(|| missing("method"))?;
                        None
                    }
                };
                if let Some(id) = target {
                    if !self.index.contains_key(&id) {
                        return Err(format!(
                            "`{}` child `{}` refers to missing node @0x{id:016x}",
                            node.display_name, child.name
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get_node(&self, id: u64) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Index of a node in [`nodes`](Self::nodes).
    pub fn position(&self, id: u64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// All nodes in deterministic order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The file that was compiled.
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// File nodes, root first.
    pub fn files(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind() == NodeKind::File)
    }

    /// Iterate over [`nodes`](Self::nodes).
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a graph holds at least its root file.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Enclosing node, `None` for files and detached parameter structs.
    pub fn parent(&self, node: &Node) -> Option<&Node> {
        if node.scope_id == 0 {
            None
        } else {
            self.get_node(node.scope_id)
        }
    }

    /// Human-readable rendering of a type: `List(Person)`, `Map(Text, Int32)`.
    pub fn type_name(&self, ty: &TypeRef) -> String {
        if let Some(name) = ty.builtin_name() {
            return name.to_string();
        }
        match ty {
            TypeRef::List(inner) => format!("List({})", self.type_name(inner)),
            TypeRef::Enum { id } => self.node_name(*id),
            TypeRef::Struct { id, brand } | TypeRef::Interface { id, brand } => {
                let mut out = self.node_name(*id);
                if let Some(BrandBinding::Bind(args)) = brand.binding(*id) {
                    out.push('(');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&self.type_name(arg));
                    }
                    out.push(')');
                }
                out
            }
            TypeRef::Param { scope_id, index } => self
                .get_node(*scope_id)
                .and_then(|n| n.parameters.get(usize::from(*index)))
                .cloned()
                .unwrap_or_else(|| format!("<param {index}>")),
            _ => String::new(),
        }
    }

    fn node_name(&self, id: u64) -> String {
        self.get_node(id)
            .map_or_else(|| format!("@0x{id:016x}"), |n| n.short_name().to_string())
    }
}

impl<'a> IntoIterator for &'a SchemaGraph {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Leading bytes of a precompiled schema.
#[cfg(feature = "cache")]
const MAGIC: [u8; 4] = *b"CPNG";

/// Bumped whenever the node layout changes.
#[cfg(feature = "cache")]
const FORMAT_VERSION: u32 = 1;

#[cfg(feature = "cache")]
#[derive(serde::Serialize, serde::Deserialize)]
struct Encoded {
    version: u32,
    nodes: Vec<Node>,
}

#[cfg(feature = "cache")]
impl SchemaGraph {
    /// Serialize into the precompiled representation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CompileError> {
        let encoded = Encoded {
            version: FORMAT_VERSION,
            nodes: self.nodes.clone(),
        };
        let body = bincode::serialize(&encoded).map_err(|e| CompileError::Precompiled {
            message: format!("encoding failed: {e}"),
        })?;
        let mut bytes = Vec::with_capacity(MAGIC.len() + body.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode a precompiled representation produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CompileError> {
        let precompiled = |message: String| CompileError::Precompiled { message };
        let body = bytes
            .strip_prefix(&MAGIC)
            .ok_or_else(|| precompiled("not a precompiled schema".to_string()))?;
        let encoded: Encoded = bincode::deserialize(body)
            .map_err(|e| precompiled(format!("decoding failed: {e}")))?;
        if encoded.version != FORMAT_VERSION {
            return Err(precompiled(format!(
                "format version {} is not supported (expected {FORMAT_VERSION})",
                encoded.version
            )));
        }
        SchemaGraph::from_nodes(encoded.nodes).map_err(precompiled)
    }
}

fn as_index(i: u32) -> Option<usize> {
    usize::try_from(i).ok()
}
