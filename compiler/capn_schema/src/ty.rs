//! Resolved type references.

/// A fully resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeRef {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Text,
    Data,
    List(Box<TypeRef>),
    Enum { id: u64 },
    Struct { id: u64, brand: Brand },
    Interface { id: u64, brand: Brand },
    AnyPointer,
    /// Generic parameter `index` of the declaration `scope_id`.
    Param { scope_id: u64, index: u16 },
}

/// Storage class of a type inside a struct.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldSize {
    /// Occupies no space.
    Void,
    /// `2^lg` bits in the data section.
    Data { lg: u8 },
    /// One pointer slot.
    Pointer,
}

impl TypeRef {
    /// Built-in types named by a single identifier. `List` is handled by
    /// the resolver since it takes an argument.
    pub fn primitive(name: &str) -> Option<TypeRef> {
        Some(match name {
            "Void" => TypeRef::Void,
            "Bool" => TypeRef::Bool,
            "Int8" => TypeRef::Int8,
            "Int16" => TypeRef::Int16,
            "Int32" => TypeRef::Int32,
            "Int64" => TypeRef::Int64,
            "UInt8" => TypeRef::UInt8,
            "UInt16" => TypeRef::UInt16,
            "UInt32" => TypeRef::UInt32,
            "UInt64" => TypeRef::UInt64,
            "Float32" => TypeRef::Float32,
            "Float64" => TypeRef::Float64,
            "Text" => TypeRef::Text,
            "Data" => TypeRef::Data,
            "AnyPointer" => TypeRef::AnyPointer,
            _ => return None,
        })
    }

    /// Name of a built-in type, `None` for user-defined ones.
    pub fn builtin_name(&self) -> Option<&'static str> {
        Some(match self {
            TypeRef::Void => "Void",
            TypeRef::Bool => "Bool",
            TypeRef::Int8 => "Int8",
            TypeRef::Int16 => "Int16",
            TypeRef::Int32 => "Int32",
            TypeRef::Int64 => "Int64",
            TypeRef::UInt8 => "UInt8",
            TypeRef::UInt16 => "UInt16",
            TypeRef::UInt32 => "UInt32",
            TypeRef::UInt64 => "UInt64",
            TypeRef::Float32 => "Float32",
            TypeRef::Float64 => "Float64",
            TypeRef::Text => "Text",
            TypeRef::Data => "Data",
            TypeRef::AnyPointer => "AnyPointer",
            TypeRef::List(_)
            | TypeRef::Enum { .. }
            | TypeRef::Struct { .. }
            | TypeRef::Interface { .. }
            | TypeRef::Param { .. } => return None,
        })
    }

    pub fn size(&self) -> FieldSize {
        match self {
            TypeRef::Void => FieldSize::Void,
            TypeRef::Bool => FieldSize::Data { lg: 0 },
            TypeRef::Int8 | TypeRef::UInt8 => FieldSize::Data { lg: 3 },
            TypeRef::Int16 | TypeRef::UInt16 | TypeRef::Enum { .. } => FieldSize::Data { lg: 4 },
            TypeRef::Int32 | TypeRef::UInt32 | TypeRef::Float32 => FieldSize::Data { lg: 5 },
            TypeRef::Int64 | TypeRef::UInt64 | TypeRef::Float64 => FieldSize::Data { lg: 6 },
            TypeRef::Text
            | TypeRef::Data
            | TypeRef::List(_)
            | TypeRef::Struct { .. }
            | TypeRef::Interface { .. }
            | TypeRef::AnyPointer
            | TypeRef::Param { .. } => FieldSize::Pointer,
        }
    }

    #[inline]
    pub fn is_pointer(&self) -> bool {
        self.size() == FieldSize::Pointer
    }

    pub fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            TypeRef::Int8 | TypeRef::Int16 | TypeRef::Int32 | TypeRef::Int64
        )
    }

    pub fn is_unsigned_integer(&self) -> bool {
        matches!(
            self,
            TypeRef::UInt8 | TypeRef::UInt16 | TypeRef::UInt32 | TypeRef::UInt64
        )
    }

    /// Inclusive range of a signed integer type.
    pub(crate) fn signed_range(&self) -> Option<(i64, i64)> {
        Some(match self {
            TypeRef::Int8 => (i64::from(i8::MIN), i64::from(i8::MAX)),
            TypeRef::Int16 => (i64::from(i16::MIN), i64::from(i16::MAX)),
            TypeRef::Int32 => (i64::from(i32::MIN), i64::from(i32::MAX)),
            TypeRef::Int64 => (i64::MIN, i64::MAX),
            _ => return None,
        })
    }

    /// Maximum of an unsigned integer type.
    pub(crate) fn unsigned_max(&self) -> Option<u64> {
        Some(match self {
            TypeRef::UInt8 => u64::from(u8::MAX),
            TypeRef::UInt16 => u64::from(u16::MAX),
            TypeRef::UInt32 => u64::from(u32::MAX),
            TypeRef::UInt64 => u64::MAX,
            _ => return None,
        })
    }
}

/// Generic bindings applied to a struct or interface reference.
///
/// One scope per generic declaration on the path, outermost first.
/// Unlisted parameters are unbound and read as `AnyPointer`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Brand {
    pub scopes: Vec<BrandScope>,
}

impl Brand {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Binding for the declaration `scope_id`, if any.
    pub fn binding(&self, scope_id: u64) -> Option<&BrandBinding> {
        self.scopes
            .iter()
            .find(|s| s.scope_id == scope_id)
            .map(|s| &s.binding)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct BrandScope {
    pub scope_id: u64,
    pub binding: BrandBinding,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum BrandBinding {
    /// Explicit arguments, one per parameter.
    Bind(Vec<TypeRef>),
    /// Parameters pass through from the enclosing generic scope.
    Inherit,
}
