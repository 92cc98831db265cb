//! Name resolution, struct layout and the compiled schema graph.
//!
//! [`resolve`] turns a parsed root file, plus whatever it imports through
//! an [`ImportLoader`], into an immutable [`SchemaGraph`]. Everything runs
//! on one thread; the graph itself is plain data and can be shared freely.

mod error;
mod graph;
pub mod id;
mod node;
mod resolve;
mod ty;
mod value;

pub use error::{CompileError, LayoutProblem};
pub use graph::SchemaGraph;
pub use node::{
    AnnotationNode, AnnotationUse, Child, ChildRef, ConstNode, EnumNode, Enumerant, Field,
    FieldBody, FileNode, ImportEdge, InterfaceNode, Method, NestedNode, Node, NodeBody, NodeKind,
    Slot, SlotLocation, StructNode,
};
pub use resolve::{resolve, resolve_keyed, ImportLoader, LoadError};
pub use ty::{Brand, BrandBinding, BrandScope, FieldSize, TypeRef};
pub use value::Value;

pub use capn_ir::AnnotationTarget;
