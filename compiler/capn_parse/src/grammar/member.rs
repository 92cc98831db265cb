//! Struct, group, union and interface bodies.

use capn_ir::{
    FieldDecl, GroupDecl, Member, MethodDecl, MethodParams, ParamDecl, TokenKind, UnionDecl,
};

use crate::{ensure_sufficient_stack, ParseError, Parser};

impl Parser<'_> {
    /// `{ member* }` of a struct, group or union.
    pub(crate) fn parse_member_block(&mut self) -> Result<Vec<Member>, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        ensure_sufficient_stack(|| {
            let mut members = Vec::new();
            while !self.eat(&TokenKind::RBrace) {
                if self.is_at_end() {
                    return Err(self.unexpected("`}`"));
                }
                members.push(self.parse_member()?);
            }
            Ok(members)
        })
    }

    /// A keyword followed by `@` or `:` names a member.
    fn at_keyword_name(&self) -> bool {
        self.current_kind().keyword_text().is_some()
            && matches!(self.peek_next_kind(), TokenKind::At | TokenKind::Colon)
    }

    fn parse_member(&mut self) -> Result<Member, ParseError> {
        let keyword_name = self.at_keyword_name();
        if self.at_decl_keyword() && !keyword_name {
            return self.parse_decl().map(Member::Nested);
        }

        let start = self.current_span();
        if !keyword_name && self.eat(&TokenKind::Union) {
            // Unnamed union.
            let annotations = self.parse_annotations()?;
            let members = self.parse_member_block()?;
            return Ok(Member::Union(UnionDecl {
                name: None,
                annotations,
                members,
                span: start.merge(self.previous_span()),
            }));
        }

        let name = self.expect_name()?;
        if self.check(&TokenKind::At) {
            let ordinal = self.parse_ordinal()?;
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_type()?;
            let default = if self.eat(&TokenKind::Eq) {
                Some(self.parse_value()?)
            } else {
                None
            };
            let annotations = self.parse_annotations()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Member::Field(FieldDecl {
                name,
                ordinal,
                ty,
                default,
                annotations,
                span: start.merge(self.previous_span()),
            }));
        }

        if !self.eat(&TokenKind::Colon) {
            return Err(self.unexpected("`@` ordinal"));
        }
        match self.current_kind() {
            TokenKind::Group => {
                self.advance();
                let annotations = self.parse_annotations()?;
                let members = self.parse_member_block()?;
                Ok(Member::Group(GroupDecl {
                    name,
                    annotations,
                    members,
                    span: start.merge(self.previous_span()),
                }))
            }
            TokenKind::Union => {
                self.advance();
                let annotations = self.parse_annotations()?;
                let members = self.parse_member_block()?;
                Ok(Member::Union(UnionDecl {
                    name: Some(name),
                    annotations,
                    members,
                    span: start.merge(self.previous_span()),
                }))
            }
            _ => Err(self.unexpected("`group` or `union` (fields need an `@` ordinal)")),
        }
    }

    /// `{ (method | decl)* }` of an interface.
    pub(crate) fn parse_interface_block(&mut self) -> Result<Vec<Member>, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        ensure_sufficient_stack(|| {
            let mut members = Vec::new();
            while !self.eat(&TokenKind::RBrace) {
                if self.is_at_end() {
                    return Err(self.unexpected("`}`"));
                }
                if self.at_decl_keyword() && !self.at_keyword_name() {
                    members.push(Member::Nested(self.parse_decl()?));
                } else {
                    members.push(Member::Method(self.parse_method()?));
                }
            }
            Ok(members)
        })
    }

    /// `name @N (params) -> (results) $annots;`
    fn parse_method(&mut self) -> Result<MethodDecl, ParseError> {
        let start = self.current_span();
        let name = self.expect_name()?;
        let ordinal = self.parse_ordinal()?;
        let params = self.parse_method_params()?;
        let results = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_method_params()?)
        } else {
            None
        };
        let annotations = self.parse_annotations()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(MethodDecl {
            name,
            ordinal,
            params,
            results,
            annotations,
            span: start.merge(self.previous_span()),
        })
    }

    /// Inline `(a :T, b :U = 1)` list, or a struct type used directly.
    fn parse_method_params(&mut self) -> Result<MethodParams, ParseError> {
        if !self.eat(&TokenKind::LParen) {
            return Ok(MethodParams::Struct(self.parse_type()?));
        }
        let mut params = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
        }
        Ok(MethodParams::Named(params))
    }

    fn parse_param(&mut self) -> Result<ParamDecl, ParseError> {
        let start = self.current_span();
        let name = self.expect_name()?;
        self.expect(&TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let default = if self.eat(&TokenKind::Eq) {
            Some(self.parse_value()?)
        } else {
            None
        };
        let annotations = self.parse_annotations()?;
        Ok(ParamDecl {
            name,
            ty,
            default,
            annotations,
            span: start.merge(self.previous_span()),
        })
    }
}
