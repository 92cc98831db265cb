//! Evaluated constant values.

use std::fmt;

use crate::TypeRef;

/// A value checked against its type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Void,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Data(Vec<u8>),
    List(Vec<Value>),
    /// Enumerant ordinal.
    Enum(u16),
    /// Fields in the order they were written.
    Struct(Vec<(String, Value)>),
    /// Pointer field without a default.
    Null,
}

impl Value {
    /// Value of a field with no explicit default.
    pub fn default_for(ty: &TypeRef) -> Value {
        match ty {
            TypeRef::Void => Value::Void,
            TypeRef::Bool => Value::Bool(false),
            TypeRef::Int8 | TypeRef::Int16 | TypeRef::Int32 | TypeRef::Int64 => Value::Int(0),
            TypeRef::UInt8 | TypeRef::UInt16 | TypeRef::UInt32 | TypeRef::UInt64 => {
                Value::UInt(0)
            }
            TypeRef::Float32 | TypeRef::Float64 => Value::Float(0.0),
            TypeRef::Enum { .. } => Value::Enum(0),
            TypeRef::Text
            | TypeRef::Data
            | TypeRef::List(_)
            | TypeRef::Struct { .. }
            | TypeRef::Interface { .. }
            | TypeRef::AnyPointer
            | TypeRef::Param { .. } => Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::UInt(n) => write!(f, "{n}"),
            Value::Float(x) if x.is_nan() => f.write_str("nan"),
            Value::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { "inf" } else { "-inf" })
            }
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Data(bytes) => {
                f.write_str("0x\"")?;
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{b:02x}")?;
                }
                f.write_str("\"")
            }
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Enum(ordinal) => write!(f, "#{ordinal}"),
            Value::Struct(fields) => {
                f.write_str("(")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name} = {value}")?;
                }
                f.write_str(")")
            }
            Value::Null => f.write_str("null"),
        }
    }
}
