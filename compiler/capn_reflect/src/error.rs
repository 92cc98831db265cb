//! Navigation errors.

use capn_diagnostic::{Diagnostic, ErrorCode};

/// Why a child lookup failed. Scoped to a single call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReflectError {
    #[error("`{node}` has no child named `{name}`")]
    NoSuchChild { name: String, node: String },

    #[error("node @0x{id:016x} is not in the schema graph")]
    MissingNode { id: u64 },
}

impl ReflectError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ReflectError::NoSuchChild { .. } => ErrorCode::E5001,
            ReflectError::MissingNode { .. } => ErrorCode::E5002,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.code()).with_message(self.to_string());
        match self {
            ReflectError::NoSuchChild { node, .. } => {
                diagnostic.with_note(format!("list the children of `{node}` to see valid names"))
            }
            ReflectError::MissingNode { .. } => diagnostic,
        }
    }
}
