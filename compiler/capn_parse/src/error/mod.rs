//! Parse error types.
//!
//! [`ParseError`] is what grammar productions return: a code, a message and
//! a span. [`SyntaxError`] is the public form, with line and column resolved
//! against the source text.

use capn_diagnostic::{Diagnostic, ErrorCode, LineOffsetTable, SourceLocation};
use capn_ir::{Span, TokenKind};
use capn_lexer::LexError;

/// Error produced inside the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
}

impl ParseError {
    #[cold]
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        ParseError {
            code,
            message: message.into(),
            span,
        }
    }

    /// `expected X, found Y`.
    #[cold]
    pub fn unexpected(expected: &str, found: &TokenKind, span: Span) -> Self {
        let code = match expected {
            "identifier" => ErrorCode::E1002,
            "type" => ErrorCode::E1003,
            "value" => ErrorCode::E1004,
            _ => ErrorCode::E1001,
        };
        ParseError::new(code, format!("expected {expected}, found {found}"), span)
    }

    /// Resolve the span to a line and column.
    pub fn into_syntax_error(self, source: &str, lines: &LineOffsetTable) -> SyntaxError {
        let (line, column) = lines.offset_to_line_col(source, self.span.start);
        SyntaxError {
            code: self.code,
            message: self.message,
            span: self.span,
            line,
            column,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(err.code(), err.kind.to_string(), err.span)
    }
}

/// Malformed schema source.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct SyntaxError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl SyntaxError {
    pub fn location(&self, file: &str) -> SourceLocation {
        SourceLocation::new(file, self.line, self.column)
    }

    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        Diagnostic::error(self.code)
            .with_message(self.message.clone())
            .with_label(self.location(file), self.code.description())
    }
}

#[cfg(test)]
mod tests;
