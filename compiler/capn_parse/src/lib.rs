//! Recursive descent parser for schema files.
//!
//! Produces a [`SyntaxTree`] with every declaration in source order.

mod cursor;
mod error;
mod grammar;
mod stack;

use std::sync::Arc;

use capn_diagnostic::{LineOffsetTable, SourceLocation};
use capn_ir::{Ident, Span, SyntaxTree, Token, TokenKind, TokenList};

pub use cursor::Cursor;
pub use error::{ParseError, SyntaxError};
pub use stack::ensure_sufficient_stack;

/// Parser state.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a TokenList) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
        }
    }

    #[inline]
    fn current(&self) -> &'a Token {
        self.cursor.current()
    }

    #[inline]
    fn current_kind(&self) -> &'a TokenKind {
        self.cursor.current_kind()
    }

    #[inline]
    fn current_span(&self) -> Span {
        self.cursor.current_span()
    }

    #[inline]
    fn previous_span(&self) -> Span {
        self.cursor.previous_span()
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.cursor.is_at_end()
    }

    #[inline]
    fn check(&self, kind: &TokenKind) -> bool {
        self.cursor.check(kind)
    }

    #[inline]
    fn check_ident(&self) -> bool {
        self.cursor.check_ident()
    }

    #[inline]
    fn check_name(&self) -> bool {
        self.cursor.check_name()
    }

    #[inline]
    fn peek_next_kind(&self) -> &'a TokenKind {
        self.cursor.peek_next_kind()
    }

    #[inline]
    fn advance(&mut self) -> &'a Token {
        self.cursor.advance()
    }

    #[inline]
    fn eat(&mut self, kind: &TokenKind) -> bool {
        self.cursor.eat(kind)
    }

    #[inline]
    fn expect(&mut self, kind: &TokenKind) -> Result<&'a Token, ParseError> {
        self.cursor.expect(kind)
    }

    #[inline]
    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        self.cursor.expect_ident()
    }

    #[inline]
    fn expect_name(&mut self) -> Result<Ident, ParseError> {
        self.cursor.expect_name()
    }

    /// Error for the current token.
    #[cold]
    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::unexpected(expected, self.current_kind(), self.current_span())
    }
}

/// Parse schema source text into a syntax tree.
pub fn parse(source: &str) -> Result<SyntaxTree, SyntaxError> {
    let lines = LineOffsetTable::build(source);
    parse_tokens(source).map_err(|e| e.into_syntax_error(source, &lines))
}

fn parse_tokens(source: &str) -> Result<SyntaxTree, ParseError> {
    let tokens = capn_lexer::lex(source)?;
    tracing::trace!(tokens = tokens.len(), "lexed schema source");
    Parser::new(&tokens).parse_file()
}

/// A parsed file together with what is needed to locate spans in it.
#[derive(Clone, Debug)]
pub struct ParsedFile {
    /// Display name, e.g. `addressbook.capnp`.
    pub name: String,
    pub source: Arc<str>,
    pub lines: LineOffsetTable,
    pub tree: SyntaxTree,
}

impl ParsedFile {
    /// Lex and parse `source`, remembering it under `name`.
    pub fn parse(name: impl Into<String>, source: impl Into<Arc<str>>) -> Result<Self, SyntaxError> {
        let name = name.into();
        let source = source.into();
        let lines = LineOffsetTable::build(&source);
        let tree =
            parse_tokens(&source).map_err(|e| e.into_syntax_error(&source, &lines))?;
        tracing::debug!(file = %name, decls = tree.decls.len(), "parsed schema file");
        Ok(ParsedFile {
            name,
            source,
            lines,
            tree,
        })
    }

    /// File, line and column of a span's start.
    pub fn locate(&self, span: Span) -> SourceLocation {
        self.lines.locate(&self.name, &self.source, span)
    }
}

#[cfg(test)]
mod tests;
