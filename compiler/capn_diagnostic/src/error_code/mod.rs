//! Error codes for all compiler diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E2001`) with the first digit
//! indicating the compiler phase.

use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E0xxx: Lexer errors
/// - E1xxx: Parser errors
/// - E2xxx: Resolution errors
/// - E3xxx: Layout errors
/// - E4xxx: Import and loading errors
/// - E5xxx: Reflection errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer Errors (E0xxx)
    /// Unterminated string literal
    E0001,
    /// Invalid character in source
    E0002,
    /// Invalid number literal
    E0003,
    /// Invalid escape sequence
    E0004,
    /// Malformed byte literal
    E0005,

    // Parser Errors (E1xxx)
    /// Unexpected token
    E1001,
    /// Expected identifier
    E1002,
    /// Expected type
    E1003,
    /// Expected value
    E1004,
    /// Explicit id without the high bit set
    E1005,
    /// Unknown annotation target
    E1006,
    /// Ordinal out of range
    E1007,

    // Resolution Errors (E2xxx)
    /// Unresolved reference
    E2001,
    /// Duplicate id
    E2002,
    /// Duplicate name in scope
    E2003,
    /// Invalid type usage
    E2004,
    /// Value does not match its type
    E2005,
    /// Annotation applied to the wrong target
    E2006,

    // Layout Errors (E3xxx)
    /// Ordinal skipped or duplicated
    E3001,
    /// Union with fewer than two members
    E3002,
    /// Misplaced unnamed union
    E3003,

    // Import Errors (E4xxx)
    /// Cyclic import
    E4001,
    /// Import not found
    E4002,
    /// I/O failure reading a schema file
    E4003,
    /// Precompiled schema could not be decoded
    E4004,

    // Reflection Errors (E5xxx)
    /// No such child
    E5001,
    /// Reference to a node the graph does not hold
    E5002,
}

impl ErrorCode {
    /// All error code variants, for exhaustive testing.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E0003,
        ErrorCode::E0004,
        ErrorCode::E0005,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E1006,
        ErrorCode::E1007,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E3003,
        ErrorCode::E4001,
        ErrorCode::E4002,
        ErrorCode::E4003,
        ErrorCode::E4004,
        ErrorCode::E5001,
        ErrorCode::E5002,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E0004 => "E0004",
            ErrorCode::E0005 => "E0005",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E1007 => "E1007",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E4002 => "E4002",
            ErrorCode::E4003 => "E4003",
            ErrorCode::E4004 => "E4004",
            ErrorCode::E5001 => "E5001",
            ErrorCode::E5002 => "E5002",
        }
    }

    /// One-line description, used by `capnc --explain`.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "unterminated string literal",
            ErrorCode::E0002 => "invalid character in source",
            ErrorCode::E0003 => "invalid number literal",
            ErrorCode::E0004 => "invalid escape sequence",
            ErrorCode::E0005 => "malformed byte literal",
            ErrorCode::E1001 => "unexpected token",
            ErrorCode::E1002 => "expected identifier",
            ErrorCode::E1003 => "expected type",
            ErrorCode::E1004 => "expected value",
            ErrorCode::E1005 => "explicit ids must have the high bit set",
            ErrorCode::E1006 => "unknown annotation target",
            ErrorCode::E1007 => "ordinal out of range",
            ErrorCode::E2001 => "unresolved reference",
            ErrorCode::E2002 => "duplicate id",
            ErrorCode::E2003 => "duplicate name in scope",
            ErrorCode::E2004 => "invalid type",
            ErrorCode::E2005 => "value does not match its type",
            ErrorCode::E2006 => "annotation not allowed here",
            ErrorCode::E3001 => "ordinals must be unique and sequential",
            ErrorCode::E3002 => "unions must have at least two members",
            ErrorCode::E3003 => "misplaced unnamed union",
            ErrorCode::E4001 => "cyclic import",
            ErrorCode::E4002 => "import not found",
            ErrorCode::E4003 => "failed to read schema file",
            ErrorCode::E4004 => "invalid precompiled schema",
            ErrorCode::E5001 => "no such child",
            ErrorCode::E5002 => "node missing from graph",
        }
    }

    /// Check if this is a lexer error (E0xxx range).
    pub fn is_lexer_error(&self) -> bool {
        self.as_str().starts_with("E0")
    }

    /// Check if this is a parser/syntax error (E1xxx range).
    pub fn is_parser_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    /// Check if this is a resolution error (E2xxx range).
    pub fn is_resolve_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    /// Check if this is a layout error (E3xxx range).
    pub fn is_layout_error(&self) -> bool {
        self.as_str().starts_with("E3")
    }

    /// Check if this is an import or loading error (E4xxx range).
    pub fn is_import_error(&self) -> bool {
        self.as_str().starts_with("E4")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E2001"`.
///
/// Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}
