//! Name-based navigation over a compiled [`SchemaGraph`].
//!
//! Every handle owns an `Arc` of the graph, so handles can outlive the
//! call that produced them and be sent across threads.
//!
//! ```text
//! root ──children()──▶ ["Person", "Color"]
//!   └─resolve_child("Person")──▶ Node ──resolve_child("name")──▶ Field
//! ```

mod children;
mod error;
mod member;
mod node_ref;

pub use children::Children;
pub use error::ReflectError;
pub use member::{EnumerantRef, FieldRef, MethodRef};
pub use node_ref::NodeRef;

pub use capn_schema::SchemaGraph;

/// Uniform navigation over nodes and their members.
pub trait Reflect {
    /// Names of the reachable children, in declaration order. Each call
    /// starts over.
    fn children(&self) -> Children;

    /// The child called `name`.
    fn resolve_child(&self, name: &str) -> Result<Reflected, ReflectError>;

    /// `@0x0123456789abcdef` for nodes, `@N` for ordinal-bearing members.
    fn identifier_display(&self) -> String;

    /// One-line human-readable summary.
    fn describe(&self) -> String;
}

/// Result of resolving a child.
#[derive(Clone, Debug)]
pub enum Reflected {
    Node(NodeRef),
    Field(FieldRef),
    Enumerant(EnumerantRef),
    Method(MethodRef),
}

impl Reflected {
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Reflected::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldRef> {
        match self {
            Reflected::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_enumerant(&self) -> Option<&EnumerantRef> {
        match self {
            Reflected::Enumerant(en) => Some(en),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodRef> {
        match self {
            Reflected::Method(method) => Some(method),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Reflect {
        match self {
            Reflected::Node(r) => r,
            Reflected::Field(r) => r,
            Reflected::Enumerant(r) => r,
            Reflected::Method(r) => r,
        }
    }
}

impl Reflect for Reflected {
    fn children(&self) -> Children {
        self.inner().children()
    }

    fn resolve_child(&self, name: &str) -> Result<Reflected, ReflectError> {
        self.inner().resolve_child(name)
    }

    fn identifier_display(&self) -> String {
        self.inner().identifier_display()
    }

    fn describe(&self) -> String {
        self.inner().describe()
    }
}

#[cfg(test)]
mod tests;
