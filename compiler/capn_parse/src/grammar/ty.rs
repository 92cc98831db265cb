//! Paths and type expressions.
//!
//! ```capnp
//! List(Person)
//! Map(Text, .Outer.Inner)
//! import "other.capnp".Thing
//! ```

use capn_ir::{Path, PathBase, PathSegment, TokenKind, TypeExpr};

use crate::{ensure_sufficient_stack, ParseError, Parser};

impl Parser<'_> {
    pub(crate) fn at_path_start(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Ident(_) | TokenKind::Dot | TokenKind::Import
        )
    }

    pub(crate) fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        if !self.at_path_start() {
            return Err(self.unexpected("type"));
        }
        let path = self.parse_path(true)?;
        Ok(TypeExpr {
            span: path.span,
            path,
        })
    }

    /// Parse a path. Generic arguments are only accepted in type position;
    /// elsewhere a following `(` belongs to the enclosing construct.
    pub(crate) fn parse_path(&mut self, allow_args: bool) -> Result<Path, ParseError> {
        ensure_sufficient_stack(|| {
            let start = self.current_span();
            let absolute = self.eat(&TokenKind::Dot);
            let mut segments = Vec::new();

            let base = if self.eat(&TokenKind::Import) {
                let token = self.current();
                let TokenKind::Str(file) = &token.kind else {
                    return Err(self.unexpected("import path string"));
                };
                self.advance();
                PathBase::Import {
                    path: file.clone(),
                    span: token.span,
                }
            } else {
                segments.push(self.parse_path_segment(allow_args)?);
                PathBase::Name
            };

            while self.eat(&TokenKind::Dot) {
                segments.push(self.parse_path_segment(allow_args)?);
            }

            Ok(Path {
                absolute,
                base,
                segments,
                span: start.merge(self.previous_span()),
            })
        })
    }

    fn parse_path_segment(&mut self, allow_args: bool) -> Result<PathSegment, ParseError> {
        let name = self.expect_ident()?;
        let mut args = Vec::new();
        if allow_args && self.eat(&TokenKind::LParen) {
            args.push(self.parse_type()?);
            while self.eat(&TokenKind::Comma) {
                args.push(self.parse_type()?);
            }
            self.expect(&TokenKind::RParen)?;
        }
        Ok(PathSegment { name, args })
    }
}
