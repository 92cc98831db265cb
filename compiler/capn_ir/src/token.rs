//! Lexer output: tokens and token lists.

use std::fmt;

use crate::Span;

/// A token with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Token kinds of the schema language.
///
/// Declaration keywords are reserved at the lexer level; annotation target
/// names such as `struct` or `union` are recovered from them by the parser.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals
    Ident(String),
    /// Unsigned integer literal; a leading `-` is a separate token.
    Int(u64),
    Float(f64),
    /// String literal with escapes already processed.
    Str(String),
    /// Byte string literal `0x"de ad be ef"`.
    Bytes(Vec<u8>),

    // Declaration keywords
    Struct,
    Enum,
    Interface,
    Union,
    Group,
    Const,
    Annotation,
    Using,
    Import,
    Extends,

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Colon,
    Comma,
    Dot,
    Eq,
    At,
    Dollar,
    Minus,
    Arrow,
    /// Wildcard annotation target.
    Star,

    Eof,
}

impl TokenKind {
    /// Check whether two kinds are the same variant, ignoring payloads.
    pub fn same_kind(&self, other: &TokenKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Keyword text for keyword tokens.
    ///
    /// Used where the grammar accepts keywords as plain names
    /// (annotation targets, method and field names).
    pub fn keyword_text(&self) -> Option<&'static str> {
        match self {
            TokenKind::Struct => Some("struct"),
            TokenKind::Enum => Some("enum"),
            TokenKind::Interface => Some("interface"),
            TokenKind::Union => Some("union"),
            TokenKind::Group => Some("group"),
            TokenKind::Const => Some("const"),
            TokenKind::Annotation => Some("annotation"),
            TokenKind::Using => Some("using"),
            TokenKind::Import => Some("import"),
            TokenKind::Extends => Some("extends"),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kw) = self.keyword_text() {
            return write!(f, "`{kw}`");
        }
        match self {
            TokenKind::Ident(name) => write!(f, "identifier `{name}`"),
            TokenKind::Int(v) => write!(f, "integer `{v}`"),
            TokenKind::Float(v) => write!(f, "float `{v}`"),
            TokenKind::Str(_) => write!(f, "string literal"),
            TokenKind::Bytes(_) => write!(f, "byte literal"),
            TokenKind::LBrace => write!(f, "`{{`"),
            TokenKind::RBrace => write!(f, "`}}`"),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::LBracket => write!(f, "`[`"),
            TokenKind::RBracket => write!(f, "`]`"),
            TokenKind::Semicolon => write!(f, "`;`"),
            TokenKind::Colon => write!(f, "`:`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Dot => write!(f, "`.`"),
            TokenKind::Eq => write!(f, "`=`"),
            TokenKind::At => write!(f, "`@`"),
            TokenKind::Dollar => write!(f, "`$`"),
            TokenKind::Minus => write!(f, "`-`"),
            TokenKind::Arrow => write!(f, "`->`"),
            TokenKind::Star => write!(f, "`*`"),
            TokenKind::Eof => write!(f, "end of file"),
            _ => Ok(()),
        }
    }
}

/// Token stream produced by the lexer.
///
/// Invariant: non-empty, and the last token is always `Eof`.
#[derive(Clone, Debug)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    /// Build a token list, appending the trailing `Eof` at `end`.
    pub fn new(mut tokens: Vec<Token>, end: u32) -> Self {
        tokens.push(Token::new(TokenKind::Eof, Span::point(end)));
        TokenList { tokens }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when the stream holds nothing but `Eof`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// The trailing `Eof` token.
    #[inline]
    pub fn eof(&self) -> &Token {
        &self.tokens[self.tokens.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

impl std::ops::Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}
