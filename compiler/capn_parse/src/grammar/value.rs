//! Value expressions: defaults, constants and annotation arguments.

use capn_ir::{Ident, TokenKind, ValueExpr, ValueExprKind};

use crate::{ensure_sufficient_stack, ParseError, Parser};

impl Parser<'_> {
    pub(crate) fn parse_value(&mut self) -> Result<ValueExpr, ParseError> {
        ensure_sufficient_stack(|| {
            let start = self.current_span();
            let kind = match self.current_kind() {
                TokenKind::Minus => {
                    self.advance();
                    match self.current_kind() {
                        TokenKind::Int(n) => {
                            self.advance();
                            ValueExprKind::Int {
                                magnitude: *n,
                                negative: true,
                            }
                        }
                        TokenKind::Float(f) => {
                            self.advance();
                            ValueExprKind::Float(-*f)
                        }
                        TokenKind::Ident(name) if name == "inf" => {
                            self.advance();
                            ValueExprKind::Float(f64::NEG_INFINITY)
                        }
                        _ => return Err(self.unexpected("number")),
                    }
                }
                TokenKind::Int(n) => {
                    self.advance();
                    ValueExprKind::Int {
                        magnitude: *n,
                        negative: false,
                    }
                }
                TokenKind::Float(f) => {
                    self.advance();
                    ValueExprKind::Float(*f)
                }
                TokenKind::Str(s) => {
                    self.advance();
                    ValueExprKind::Str(s.clone())
                }
                TokenKind::Bytes(b) => {
                    self.advance();
                    ValueExprKind::Bytes(b.clone())
                }
                TokenKind::LBracket => {
                    self.advance();
                    ValueExprKind::List(self.parse_list_items()?)
                }
                TokenKind::LParen => {
                    self.advance();
                    ValueExprKind::Struct(self.parse_struct_fields()?)
                }
                _ if self.at_path_start() => ValueExprKind::Path(self.parse_path(false)?),
                _ => return Err(self.unexpected("value")),
            };
            Ok(ValueExpr {
                kind,
                span: start.merge(self.previous_span()),
            })
        })
    }

    /// Items after `[`, through the closing `]`.
    fn parse_list_items(&mut self) -> Result<Vec<ValueExpr>, ParseError> {
        let mut items = Vec::new();
        if self.eat(&TokenKind::RBracket) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_value()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(items)
    }

    /// `name = value, ...` after `(`, through the closing `)`.
    pub(crate) fn parse_struct_fields(&mut self) -> Result<Vec<(Ident, ValueExpr)>, ParseError> {
        let mut fields = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(fields);
        }
        loop {
            let name = self.expect_name()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_value()?;
            fields.push((name, value));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(fields)
    }
}
