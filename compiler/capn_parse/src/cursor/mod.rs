//! Token cursor for navigating the token stream.
//!
//! Provides low-level token access, lookahead, and consumption methods.

use capn_ir::{Ident, Span, Token, TokenKind, TokenList};

use crate::ParseError;

/// Cursor over a `TokenList`.
///
/// Invariant: `pos` is always in `0..tokens.len()`; the last token is `Eof`
/// and the cursor never advances past it.
pub struct Cursor<'a> {
    tokens: &'a TokenList,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a TokenList) -> Self {
        Cursor { tokens, pos: 0 }
    }

    /// Current position, for progress checks.
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn current(&self) -> &'a Token {
        let tokens: &'a TokenList = self.tokens;
        &tokens[self.pos]
    }

    #[inline]
    pub fn current_kind(&self) -> &'a TokenKind {
        &self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    /// Span of the most recently consumed token.
    #[inline]
    pub fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::DUMMY
        }
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Check the current token's kind, ignoring payloads.
    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind().same_kind(kind)
    }

    #[inline]
    pub fn check_ident(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Ident(_))
    }

    /// An identifier, or a keyword standing in as a plain name.
    #[inline]
    pub fn check_name(&self) -> bool {
        self.check_ident() || self.current_kind().keyword_text().is_some()
    }

    /// Kind of the token after the current one (`Eof` at the end).
    pub fn peek_next_kind(&self) -> &'a TokenKind {
        let tokens: &'a TokenList = self.tokens;
        tokens
            .get(self.pos + 1)
            .map_or(&tokens.eof().kind, |t| &t.kind)
    }

    /// Consume the current token and return it. `Eof` is never consumed.
    pub fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, kind: &TokenKind) -> Result<&'a Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(
                &kind.to_string(),
                self.current_kind(),
                self.current_span(),
            ))
        }
    }

    pub fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        let token = self.current();
        if let TokenKind::Ident(name) = &token.kind {
            self.advance();
            Ok(Ident::new(name.clone(), token.span))
        } else {
            Err(ParseError::unexpected(
                "identifier",
                &token.kind,
                token.span,
            ))
        }
    }

    /// Like [`expect_ident`](Self::expect_ident), but keywords are
    /// accepted as names too.
    pub fn expect_name(&mut self) -> Result<Ident, ParseError> {
        let token = self.current();
        match token.kind.keyword_text() {
            Some(word) => {
                self.advance();
                Ok(Ident::new(word, token.span))
            }
            None => self.expect_ident(),
        }
    }
}
