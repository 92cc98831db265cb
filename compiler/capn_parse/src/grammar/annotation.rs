//! Annotation applications.

use capn_ir::{AnnotationApp, TokenKind, ValueExpr, ValueExprKind};

use crate::{ParseError, Parser};

impl Parser<'_> {
    /// Zero or more `$path(value)` applications.
    pub(crate) fn parse_annotations(&mut self) -> Result<Vec<AnnotationApp>, ParseError> {
        let mut apps = Vec::new();
        while self.check(&TokenKind::Dollar) {
            apps.push(self.parse_annotation_app()?);
        }
        Ok(apps)
    }

    /// `$name`, `$name(value)` or `$name(field = value, ...)`.
    pub(crate) fn parse_annotation_app(&mut self) -> Result<AnnotationApp, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Dollar)?;
        let path = self.parse_path(false)?;

        let value = if self.check(&TokenKind::LParen) {
            let open = self.advance().span;
            let bare_struct = self.check(&TokenKind::RParen)
                || (self.check_name() && matches!(self.peek_next_kind(), TokenKind::Eq));
            if bare_struct {
                let fields = self.parse_struct_fields()?;
                Some(ValueExpr {
                    kind: ValueExprKind::Struct(fields),
                    span: open.merge(self.previous_span()),
                })
            } else {
                let value = self.parse_value()?;
                self.expect(&TokenKind::RParen)?;
                Some(value)
            }
        } else {
            None
        };

        Ok(AnnotationApp {
            path,
            value,
            span: start.merge(self.previous_span()),
        })
    }
}
