//! Lexer error types.

use capn_diagnostic::ErrorCode;
use capn_ir::Span;

/// A lexer error: where it happened and what went wrong.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct LexError {
    pub span: Span,
    pub kind: LexErrorKind,
}

impl LexError {
    pub fn new(span: Span, kind: LexErrorKind) -> Self {
        LexError { span, kind }
    }

    pub fn code(&self) -> ErrorCode {
        match self.kind {
            LexErrorKind::UnterminatedString => ErrorCode::E0001,
            LexErrorKind::InvalidCharacter(_) | LexErrorKind::SourceTooLarge => ErrorCode::E0002,
            LexErrorKind::InvalidNumber => ErrorCode::E0003,
            LexErrorKind::InvalidEscape(_) => ErrorCode::E0004,
            LexErrorKind::MalformedBytes => ErrorCode::E0005,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid character `{0}`")]
    InvalidCharacter(char),
    /// Integer out of `u64` range or malformed digits.
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),
    /// Odd digit count or stray characters in `0x"..."`.
    #[error("malformed byte literal")]
    MalformedBytes,
    #[error("source file exceeds 4 GiB")]
    SourceTooLarge,
}
