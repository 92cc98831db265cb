//! Handles on fields, enumerants and methods.
//!
//! These are leaves: they have no children of their own. Method
//! parameter lists are reached through [`MethodRef::params`] and
//! [`MethodRef::results`].

use std::fmt::Write as _;

use capn_schema::{Enumerant, Field, Method, Slot};

use crate::{Children, NodeRef, Reflect, ReflectError, Reflected};

/// A slot field of a struct or group.
#[derive(Clone, Debug)]
pub struct FieldRef {
    owner: NodeRef,
    index: usize,
}

impl FieldRef {
    /// `None` unless `index` names one of `owner`'s fields.
    pub(crate) fn new(owner: NodeRef, index: usize) -> Option<Self> {
        owner.node().fields().get(index)?;
        Some(FieldRef { owner, index })
    }

    pub fn field(&self) -> &Field {
        &self.owner.node().fields()[self.index]
    }

    /// The struct or group declaring this field.
    pub fn owner(&self) -> &NodeRef {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.field().name
    }

    pub fn slot(&self) -> Option<&Slot> {
        self.field().as_slot()
    }

    /// Rendered type, e.g. `List(Text)`.
    pub fn type_name(&self) -> String {
        self.slot()
            .map(|slot| self.owner.graph().type_name(&slot.ty))
            .unwrap_or_default()
    }
}

impl Reflect for FieldRef {
    fn children(&self) -> Children {
        Children::empty()
    }

    fn resolve_child(&self, name: &str) -> Result<Reflected, ReflectError> {
        Err(ReflectError::NoSuchChild {
            name: name.to_string(),
            node: format!("{}.{}", self.owner.display_name(), self.name()),
        })
    }

    fn identifier_display(&self) -> String {
        self.field()
            .ordinal
            .map(|n| format!("@{n}"))
            .unwrap_or_default()
    }

    fn describe(&self) -> String {
        let mut out = format!("{} {} :{}", self.name(), self.identifier_display(), self.type_name());
        if let Some(slot) = self.slot().filter(|s| s.had_explicit_default) {
            let _ = write!(out, " = {}", slot.default);
        }
        out
    }
}

/// An enumerant of an enum.
#[derive(Clone, Debug)]
pub struct EnumerantRef {
    owner: NodeRef,
    index: usize,
}

impl EnumerantRef {
    /// `None` unless `index` names one of `owner`'s enumerants.
    pub(crate) fn new(owner: NodeRef, index: usize) -> Option<Self> {
        owner.node().enumerants().get(index)?;
        Some(EnumerantRef { owner, index })
    }

    pub fn enumerant(&self) -> &Enumerant {
        &self.owner.node().enumerants()[self.index]
    }

    pub fn owner(&self) -> &NodeRef {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.enumerant().name
    }
}

impl Reflect for EnumerantRef {
    fn children(&self) -> Children {
        Children::empty()
    }

    fn resolve_child(&self, name: &str) -> Result<Reflected, ReflectError> {
        Err(ReflectError::NoSuchChild {
            name: name.to_string(),
            node: format!("{}.{}", self.owner.display_name(), self.name()),
        })
    }

    fn identifier_display(&self) -> String {
        format!("@{}", self.enumerant().ordinal)
    }

    fn describe(&self) -> String {
        format!("{} {}", self.name(), self.identifier_display())
    }
}

/// A method of an interface.
#[derive(Clone, Debug)]
pub struct MethodRef {
    owner: NodeRef,
    index: usize,
}

impl MethodRef {
    /// `None` unless `index` names one of `owner`'s methods.
    pub(crate) fn new(owner: NodeRef, index: usize) -> Option<Self> {
        owner.node().methods().get(index)?;
        Some(MethodRef { owner, index })
    }

    pub fn method(&self) -> &Method {
        &self.owner.node().methods()[self.index]
    }

    pub fn owner(&self) -> &NodeRef {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.method().name
    }

    /// Struct holding the parameters.
    pub fn params(&self) -> Result<NodeRef, ReflectError> {
        self.owner.at(self.method().param_struct)
    }

    /// Struct holding the results.
    pub fn results(&self) -> Result<NodeRef, ReflectError> {
        self.owner.at(self.method().result_struct)
    }
}

/// `(a :Int32, b :Text)`, or the struct's name when the method uses an
/// existing struct.
fn param_list(node: &NodeRef) -> String {
    if node.parent().is_some() {
        return node.name().to_string();
    }
    let graph = node.graph();
    let params: Vec<String> = node
        .node()
        .fields()
        .iter()
        .map(|f| match f.as_slot() {
            Some(slot) => format!("{} :{}", f.name, graph.type_name(&slot.ty)),
            None => f.name.clone(),
        })
        .collect();
    format!("({})", params.join(", "))
}

impl Reflect for MethodRef {
    fn children(&self) -> Children {
        Children::empty()
    }

    fn resolve_child(&self, name: &str) -> Result<Reflected, ReflectError> {
        Err(ReflectError::NoSuchChild {
            name: name.to_string(),
            node: format!("{}.{}", self.owner.display_name(), self.name()),
        })
    }

    fn identifier_display(&self) -> String {
        format!("@{}", self.method().ordinal)
    }

    fn describe(&self) -> String {
        let mut out = format!("{} {}", self.name(), self.identifier_display());
        if let Ok(params) = self.params() {
            out.push(' ');
            out.push_str(&param_list(&params));
        }
        if let Ok(results) = self.results() {
            out.push_str(" -> ");
            out.push_str(&param_list(&results));
        }
        out
    }
}
