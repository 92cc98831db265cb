//! Schema nodes and their members.

use std::fmt;

use capn_diagnostic::SourceLocation;
use capn_ir::AnnotationTarget;

use crate::{TypeRef, Value};

/// What a node declares.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    File,
    Struct,
    Group,
    Enum,
    Interface,
    Const,
    Annotation,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Struct => "struct",
            NodeKind::Group => "group",
            NodeKind::Enum => "enum",
            NodeKind::Interface => "interface",
            NodeKind::Const => "const",
            NodeKind::Annotation => "annotation",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compiled declaration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: u64,
    /// `file.capnp:Outer.Inner`
    pub display_name: String,
    /// Length of the part of `display_name` before the short name.
    pub display_name_prefix_length: u32,
    /// Enclosing node, 0 for files and generated parameter structs.
    pub scope_id: u64,
    /// Generic parameter names.
    pub parameters: Vec<String>,
    /// Nested declarations in declaration order.
    pub nested: Vec<NestedNode>,
    /// Everything reachable by name, in declaration order.
    pub children: Vec<Child>,
    pub annotations: Vec<AnnotationUse>,
    pub location: SourceLocation,
    pub body: NodeBody,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match &self.body {
            NodeBody::File(_) => NodeKind::File,
            NodeBody::Struct(s) if s.is_group => NodeKind::Group,
            NodeBody::Struct(_) => NodeKind::Struct,
            NodeBody::Enum(_) => NodeKind::Enum,
            NodeBody::Interface(_) => NodeKind::Interface,
            NodeBody::Const(_) => NodeKind::Const,
            NodeBody::Annotation(_) => NodeKind::Annotation,
        }
    }

    /// The unqualified name: `Inner` for `file.capnp:Outer.Inner`.
    pub fn short_name(&self) -> &str {
        let start = usize::try_from(self.display_name_prefix_length).unwrap_or(0);
        self.display_name.get(start..).unwrap_or(&self.display_name)
    }

    pub fn is_generic(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn as_struct(&self) -> Option<&StructNode> {
        match &self.body {
            NodeBody::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumNode> {
        match &self.body {
            NodeBody::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceNode> {
        match &self.body {
            NodeBody::Interface(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match &self.body {
            NodeBody::File(f) => Some(f),
            _ => None,
        }
    }

    /// Fields of a struct or group; empty otherwise.
    pub fn fields(&self) -> &[Field] {
        self.as_struct().map_or(&[], |s| s.fields.as_slice())
    }

    pub fn enumerants(&self) -> &[Enumerant] {
        self.as_enum().map_or(&[], |e| e.enumerants.as_slice())
    }

    pub fn methods(&self) -> &[Method] {
        self.as_interface().map_or(&[], |i| i.methods.as_slice())
    }

    pub fn child(&self, name: &str) -> Option<&Child> {
        self.children.iter().find(|c| c.name == name)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeBody {
    File(FileNode),
    /// Structs and groups.
    Struct(StructNode),
    Enum(EnumNode),
    Interface(InterfaceNode),
    Const(ConstNode),
    Annotation(AnnotationNode),
}

/// A named child of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Child {
    pub name: String,
    pub target: ChildRef,
}

/// Where a child lives. Indices point into the owning node's member lists.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ChildRef {
    Node(u64),
    Field(u32),
    Enumerant(u32),
    Method(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct NestedNode {
    pub name: String,
    pub id: u64,
}

/// An applied annotation with its evaluated value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnotationUse {
    /// Id of the annotation declaration.
    pub id: u64,
    pub name: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct FileNode {
    pub imports: Vec<ImportEdge>,
}

/// A file's dependency on another file.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportEdge {
    pub id: u64,
    /// The import string as written.
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct StructNode {
    /// Data section size in 64-bit words. Groups report their parent's.
    pub data_words: u32,
    /// Pointer section size. Groups report their parent's.
    pub pointer_count: u32,
    pub is_group: bool,
    /// Number of arms of this node's unnamed union, 0 if none.
    pub discriminant_count: u16,
    /// Offset of the union discriminant in 16-bit units.
    pub discriminant_offset: u32,
    /// Fields in code order.
    pub fields: Vec<Field>,
}

/// A struct or group member.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    pub name: String,
    pub code_order: u16,
    /// Explicit `@N`; `None` for groups and named unions.
    pub ordinal: Option<u16>,
    /// Set when the field is an arm of its node's union.
    pub discriminant_value: Option<u16>,
    pub annotations: Vec<AnnotationUse>,
    pub body: FieldBody,
}

impl Field {
    pub fn as_slot(&self) -> Option<&Slot> {
        match &self.body {
            FieldBody::Slot(slot) => Some(slot),
            FieldBody::Group { .. } => None,
        }
    }

    pub fn group_id(&self) -> Option<u64> {
        match &self.body {
            FieldBody::Group { type_id } => Some(*type_id),
            FieldBody::Slot(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldBody {
    Slot(Slot),
    /// Group or named union; the target is a group node.
    Group { type_id: u64 },
}

/// A regular field with storage.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Slot {
    pub ty: TypeRef,
    pub default: Value,
    pub had_explicit_default: bool,
    pub location: SlotLocation,
}

impl Slot {
    /// Byte offset into the data section; `None` for void and pointer slots.
    pub fn byte_offset(&self) -> Option<u32> {
        match self.location {
            SlotLocation::Data { bit_offset, .. } => Some(bit_offset / 8),
            SlotLocation::None | SlotLocation::Pointer { .. } => None,
        }
    }

    /// Offset in units of the field's own size, the way encoders index
    /// sections. Pointer slots report their pointer index.
    pub fn offset(&self) -> u32 {
        match self.location {
            SlotLocation::None => 0,
            SlotLocation::Data {
                bit_offset,
                bit_width,
            } => bit_offset / bit_width.max(1),
            SlotLocation::Pointer { index } => index,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotLocation {
    /// Void takes no space.
    None,
    Data { bit_offset: u32, bit_width: u32 },
    Pointer { index: u32 },
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumNode {
    pub enumerants: Vec<Enumerant>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Enumerant {
    pub name: String,
    pub ordinal: u16,
    pub code_order: u16,
    pub annotations: Vec<AnnotationUse>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct InterfaceNode {
    pub methods: Vec<Method>,
    pub superclasses: Vec<TypeRef>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Method {
    pub name: String,
    pub ordinal: u16,
    pub code_order: u16,
    /// Struct node holding the parameters.
    pub param_struct: u64,
    pub result_struct: u64,
    pub annotations: Vec<AnnotationUse>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstNode {
    pub ty: TypeRef,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnotationNode {
    pub ty: TypeRef,
    pub targets: Vec<AnnotationTarget>,
}

impl AnnotationNode {
    pub fn allows(&self, target: AnnotationTarget) -> bool {
        self.targets
            .iter()
            .any(|t| *t == target || *t == AnnotationTarget::All)
    }
}
