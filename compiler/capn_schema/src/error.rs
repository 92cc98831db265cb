//! Compile errors.

use std::fmt;

use capn_diagnostic::{Diagnostic, ErrorCode, SourceLocation};
use capn_parse::SyntaxError;

/// Which layout rule was broken.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayoutProblem {
    /// Ordinals skipped or repeated.
    Ordinals,
    /// A union with fewer than two members.
    UnionTooSmall,
    /// An unnamed union where one is not allowed.
    MisplacedUnion,
}

impl LayoutProblem {
    pub fn code(self) -> ErrorCode {
        match self {
            LayoutProblem::Ordinals => ErrorCode::E3001,
            LayoutProblem::UnionTooSmall => ErrorCode::E3002,
            LayoutProblem::MisplacedUnion => ErrorCode::E3003,
        }
    }
}

/// Why a compile failed. No partial graph is produced.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("{file}:{error}")]
    Syntax { file: String, error: SyntaxError },

    #[error("{location}: {message}")]
    UnresolvedReference {
        name: String,
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: duplicate id @0x{id:016x} for `{name}`, already used by `{first_name}` at {first}")]
    DuplicateId {
        id: u64,
        name: String,
        location: SourceLocation,
        first_name: String,
        first: SourceLocation,
    },

    #[error("{location}: cyclic import: {}", CycleDisplay(cycle))]
    CyclicImport {
        cycle: Vec<String>,
        location: SourceLocation,
    },

    #[error("{location}: {message}")]
    Layout {
        problem: LayoutProblem,
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: `{name}` is already defined at {first}")]
    DuplicateName {
        name: String,
        location: SourceLocation,
        first: SourceLocation,
    },

    #[error("{location}: {message}")]
    InvalidType {
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: {message}")]
    InvalidValue {
        message: String,
        location: SourceLocation,
    },

    #[error("{location}: {message}")]
    InvalidAnnotation {
        message: String,
        location: SourceLocation,
    },

    #[error("{}import \"{import}\" not found", LocationPrefix(location.as_ref()))]
    ImportNotFound {
        import: String,
        searched: Vec<String>,
        location: Option<SourceLocation>,
    },

    #[error("{path}: {message}")]
    Io { path: String, message: String },

    #[error("precompiled schema: {message}")]
    Precompiled { message: String },
}

struct CycleDisplay<'a>(&'a [String]);

impl fmt::Display for CycleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}

struct LocationPrefix<'a>(Option<&'a SourceLocation>);

impl fmt::Display for LocationPrefix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(location) => write!(f, "{location}: "),
            None => Ok(()),
        }
    }
}

impl CompileError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CompileError::Syntax { error, .. } => error.code,
            CompileError::UnresolvedReference { .. } => ErrorCode::E2001,
            CompileError::DuplicateId { .. } => ErrorCode::E2002,
            CompileError::DuplicateName { .. } => ErrorCode::E2003,
            CompileError::InvalidType { .. } => ErrorCode::E2004,
            CompileError::InvalidValue { .. } => ErrorCode::E2005,
            CompileError::InvalidAnnotation { .. } => ErrorCode::E2006,
            CompileError::Layout { problem, .. } => problem.code(),
            CompileError::CyclicImport { .. } => ErrorCode::E4001,
            CompileError::ImportNotFound { .. } => ErrorCode::E4002,
            CompileError::Io { .. } => ErrorCode::E4003,
            CompileError::Precompiled { .. } => ErrorCode::E4004,
        }
    }

    /// Primary location, when the error has one.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            CompileError::Syntax { file, error } => Some(error.location(file)),
            CompileError::UnresolvedReference { location, .. }
            | CompileError::DuplicateId { location, .. }
            | CompileError::CyclicImport { location, .. }
            | CompileError::Layout { location, .. }
            | CompileError::DuplicateName { location, .. }
            | CompileError::InvalidType { location, .. }
            | CompileError::InvalidValue { location, .. }
            | CompileError::InvalidAnnotation { location, .. } => Some(location.clone()),
            CompileError::ImportNotFound { location, .. } => location.clone(),
            CompileError::Io { path, .. } => Some(SourceLocation::file_only(path.clone())),
            CompileError::Precompiled { .. } => None,
        }
    }

    /// Convert to a renderable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = self.code();
        match self {
            CompileError::Syntax { file, error } => error.to_diagnostic(file),
            CompileError::UnresolvedReference {
                message, location, ..
            }
            | CompileError::Layout {
                message, location, ..
            }
            | CompileError::InvalidType { message, location }
            | CompileError::InvalidValue { message, location }
            | CompileError::InvalidAnnotation { message, location } => Diagnostic::error(code)
                .with_message(message.clone())
                .with_label(location.clone(), code.description()),
            CompileError::DuplicateId {
                id,
                name,
                location,
                first_name,
                first,
            } => Diagnostic::error(code)
                .with_message(format!("duplicate id @0x{id:016x}"))
                .with_label(location.clone(), format!("`{name}` declared here"))
                .with_secondary_label(first.clone(), format!("`{first_name}` already uses it")),
            CompileError::DuplicateName {
                name,
                location,
                first,
            } => Diagnostic::error(code)
                .with_message(format!("`{name}` is defined more than once"))
                .with_label(location.clone(), "redefined here")
                .with_secondary_label(first.clone(), "first defined here"),
            CompileError::CyclicImport { cycle, location } => Diagnostic::error(code)
                .with_message("cyclic import")
                .with_label(location.clone(), "this import closes the cycle")
                .with_note(CycleDisplay(cycle).to_string()),
            CompileError::ImportNotFound {
                import,
                searched,
                location,
            } => {
                let mut diag = Diagnostic::error(code)
                    .with_message(format!("import \"{import}\" not found"));
                if let Some(location) = location {
                    diag = diag.with_label(location.clone(), "imported here");
                }
                if !searched.is_empty() {
                    diag = diag.with_note(format!("searched: {}", searched.join(", ")));
                }
                diag
            }
            CompileError::Io { path, message } => Diagnostic::error(code)
                .with_message(message.clone())
                .with_label(SourceLocation::file_only(path.clone()), "while reading"),
            CompileError::Precompiled { message } => {
                Diagnostic::error(code).with_message(message.clone())
            }
        }
    }
}
