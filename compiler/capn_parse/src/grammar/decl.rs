//! File and declaration parsing.

use capn_diagnostic::ErrorCode;
use capn_ir::{
    AnnotationDecl, AnnotationTarget, ConstDecl, Decl, DeclKind, EnumDecl, EnumerantDecl, Ident,
    IdLiteral, InterfaceDecl, Ordinal, StructDecl, SyntaxTree, TokenKind, UsingDecl,
};

use crate::{ParseError, Parser};

/// Bit that every explicit id must carry.
const ID_HIGH_BIT: u64 = 1 << 63;

impl Parser<'_> {
    /// Parse a whole file.
    ///
    /// ```capnp
    /// @0xdbb9ad1f14bf0b36;
    /// $Cxx.namespace("addressbook");
    /// struct Person { ... }
    /// ```
    pub(crate) fn parse_file(&mut self) -> Result<SyntaxTree, ParseError> {
        let start = self.current_span();
        let mut id: Option<IdLiteral> = None;
        let mut annotations = Vec::new();
        let mut decls = Vec::new();

        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::At => {
                    let lit = self.parse_id()?;
                    if id.is_some() {
                        return Err(ParseError::new(
                            ErrorCode::E1001,
                            "file id declared more than once",
                            lit.span,
                        ));
                    }
                    self.expect(&TokenKind::Semicolon)?;
                    id = Some(lit);
                }
                TokenKind::Dollar => {
                    annotations.push(self.parse_annotation_app()?);
                    self.expect(&TokenKind::Semicolon)?;
                }
                _ => decls.push(self.parse_decl()?),
            }
        }

        Ok(SyntaxTree {
            id,
            annotations,
            decls,
            span: start.merge(self.current_span()),
        })
    }

    pub(crate) fn at_decl_keyword(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::Interface
                | TokenKind::Const
                | TokenKind::Annotation
                | TokenKind::Using
        )
    }

    /// Parse one declaration, dispatching on its keyword.
    pub(crate) fn parse_decl(&mut self) -> Result<Decl, ParseError> {
        match self.current_kind() {
            TokenKind::Struct => self.parse_struct(),
            TokenKind::Enum => self.parse_enum(),
            TokenKind::Interface => self.parse_interface(),
            TokenKind::Const => self.parse_const(),
            TokenKind::Annotation => self.parse_annotation_decl(),
            TokenKind::Using => self.parse_using(),
            _ => Err(self.unexpected("declaration")),
        }
    }

    /// `@0x...` explicit id. The high bit must be set.
    pub(crate) fn parse_id(&mut self) -> Result<IdLiteral, ParseError> {
        let at = self.expect(&TokenKind::At)?.span;
        let token = self.current();
        let TokenKind::Int(value) = token.kind else {
            return Err(self.unexpected("id"));
        };
        self.advance();
        let span = at.merge(token.span);
        if value & ID_HIGH_BIT == 0 {
            return Err(ParseError::new(
                ErrorCode::E1005,
                format!("invalid id @0x{value:x}: ids must have the high bit set"),
                span,
            ));
        }
        Ok(IdLiteral { value, span })
    }

    /// `@N` ordinal of a field, enumerant or method.
    pub(crate) fn parse_ordinal(&mut self) -> Result<Ordinal, ParseError> {
        let at = self.expect(&TokenKind::At)?.span;
        let token = self.current();
        let TokenKind::Int(value) = token.kind else {
            return Err(self.unexpected("ordinal"));
        };
        self.advance();
        let span = at.merge(token.span);
        match u16::try_from(value) {
            Ok(v) if v < u16::MAX => Ok(Ordinal {
                value: u32::from(v),
                span,
            }),
            _ => Err(ParseError::new(
                ErrorCode::E1007,
                format!("ordinal @{value} is out of range"),
                span,
            )),
        }
    }

    /// Optional `@id` and `(Param, ...)` after a declaration name, in
    /// either order.
    fn parse_decl_header(&mut self) -> Result<(Option<IdLiteral>, Vec<Ident>), ParseError> {
        let mut id = None;
        let mut params = None;
        loop {
            if id.is_none() && self.check(&TokenKind::At) {
                id = Some(self.parse_id()?);
            } else if params.is_none() && self.check(&TokenKind::LParen) {
                params = Some(self.parse_generic_params()?);
            } else {
                break;
            }
        }
        Ok((id, params.unwrap_or_default()))
    }

    fn parse_generic_params(&mut self) -> Result<Vec<Ident>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut params = vec![self.expect_ident()?];
        while self.eat(&TokenKind::Comma) {
            params.push(self.expect_ident()?);
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    /// `struct Name @id (Params) $annots { members }`
    fn parse_struct(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Struct)?;
        let name = self.expect_ident()?;
        let (id, params) = self.parse_decl_header()?;
        let annotations = self.parse_annotations()?;
        let members = self.parse_member_block()?;
        Ok(Decl {
            name,
            id,
            params,
            annotations,
            kind: DeclKind::Struct(StructDecl { members }),
            span: start.merge(self.previous_span()),
        })
    }

    /// `enum Name @id $annots { name @N $annots; ... }`
    fn parse_enum(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Enum)?;
        let name = self.expect_ident()?;
        let id = if self.check(&TokenKind::At) {
            Some(self.parse_id()?)
        } else {
            None
        };
        let annotations = self.parse_annotations()?;

        self.expect(&TokenKind::LBrace)?;
        let mut enumerants = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            let en_start = self.current_span();
            let en_name = self.expect_name()?;
            let ordinal = self.parse_ordinal()?;
            let en_annotations = self.parse_annotations()?;
            self.expect(&TokenKind::Semicolon)?;
            enumerants.push(EnumerantDecl {
                name: en_name,
                ordinal,
                annotations: en_annotations,
                span: en_start.merge(self.previous_span()),
            });
        }

        Ok(Decl {
            name,
            id,
            params: Vec::new(),
            annotations,
            kind: DeclKind::Enum(EnumDecl { enumerants }),
            span: start.merge(self.previous_span()),
        })
    }

    /// `interface Name @id (Params) extends(Base, ...) $annots { methods }`
    fn parse_interface(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Interface)?;
        let name = self.expect_ident()?;
        let (id, params) = self.parse_decl_header()?;

        let mut superclasses = Vec::new();
        if self.eat(&TokenKind::Extends) {
            self.expect(&TokenKind::LParen)?;
            superclasses.push(self.parse_type()?);
            while self.eat(&TokenKind::Comma) {
                superclasses.push(self.parse_type()?);
            }
            self.expect(&TokenKind::RParen)?;
        }

        let annotations = self.parse_annotations()?;
        let members = self.parse_interface_block()?;
        Ok(Decl {
            name,
            id,
            params,
            annotations,
            kind: DeclKind::Interface(InterfaceDecl {
                superclasses,
                members,
            }),
            span: start.merge(self.previous_span()),
        })
    }

    /// `const Name @id :Type = value $annots;`
    fn parse_const(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Const)?;
        let name = self.expect_ident()?;
        let id = if self.check(&TokenKind::At) {
            Some(self.parse_id()?)
        } else {
            None
        };
        self.expect(&TokenKind::Colon)?;
        let ty = self.parse_type()?;
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_value()?;
        let annotations = self.parse_annotations()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(Decl {
            name,
            id,
            params: Vec::new(),
            annotations,
            kind: DeclKind::Const(ConstDecl { ty, value }),
            span: start.merge(self.previous_span()),
        })
    }

    /// `annotation Name @id (targets) :Type $annots;`
    fn parse_annotation_decl(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Annotation)?;
        let name = self.expect_ident()?;
        let id = if self.check(&TokenKind::At) {
            Some(self.parse_id()?)
        } else {
            None
        };

        self.expect(&TokenKind::LParen)?;
        let mut targets = vec![self.parse_annotation_target()?];
        while self.eat(&TokenKind::Comma) {
            targets.push(self.parse_annotation_target()?);
        }
        self.expect(&TokenKind::RParen)?;

        self.expect(&TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let annotations = self.parse_annotations()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(Decl {
            name,
            id,
            params: Vec::new(),
            annotations,
            kind: DeclKind::Annotation(AnnotationDecl { targets, ty }),
            span: start.merge(self.previous_span()),
        })
    }

    /// Targets are plain words, several of which lex as keywords.
    fn parse_annotation_target(&mut self) -> Result<AnnotationTarget, ParseError> {
        let token = self.current();
        let word = match &token.kind {
            TokenKind::Star => "*",
            TokenKind::Ident(name) => name.as_str(),
            other => other
                .keyword_text()
                .ok_or_else(|| self.unexpected("annotation target"))?,
        };
        let target = AnnotationTarget::from_name(word).ok_or_else(|| {
            ParseError::new(
                ErrorCode::E1006,
                format!("unknown annotation target `{word}`"),
                token.span,
            )
        })?;
        self.advance();
        Ok(target)
    }

    /// `using Name = path;` or `using path;`
    fn parse_using(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Using)?;

        let explicit_name = if self.check_ident() && matches!(self.peek_next_kind(), TokenKind::Eq)
        {
            let name = self.expect_ident()?;
            self.advance();
            Some(name)
        } else {
            None
        };

        let target = self.parse_type()?;
        let name = match explicit_name {
            Some(name) => name,
            None => target.path.last_name().cloned().ok_or_else(|| {
                ParseError::new(
                    ErrorCode::E1002,
                    "`using` without `Name =` must end in a member name",
                    target.span,
                )
            })?,
        };
        self.expect(&TokenKind::Semicolon)?;

        Ok(Decl {
            name,
            id: None,
            params: Vec::new(),
            annotations: Vec::new(),
            kind: DeclKind::Using(UsingDecl { target }),
            span: start.merge(self.previous_span()),
        })
    }
}
