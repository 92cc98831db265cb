//! Lexer for schema files using logos.
//!
//! `#` comments and whitespace are skipped. Integers keep no sign; the parser
//! applies a preceding `-`.

mod escape;
mod lex_error;

use logos::Logos;

use capn_ir::{Span, Token, TokenKind, TokenList};

pub use lex_error::{LexError, LexErrorKind};

/// Raw token from logos, before payload decoding.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+|#[^\n]*")]
enum RawToken {
    #[token("struct")]
    Struct,
    #[token("enum")]
    Enum,
    #[token("interface")]
    Interface,
    #[token("union")]
    Union,
    #[token("group")]
    Group,
    #[token("const")]
    Const,
    #[token("annotation")]
    Annotation,
    #[token("using")]
    Using,
    #[token("import")]
    Import,
    #[token("extends")]
    Extends,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Eq,
    #[token("@")]
    At,
    #[token("$")]
    Dollar,
    #[token("->")]
    Arrow,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,

    // Hex integer
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| u64::from_str_radix(&lex.slice()[2..], 16).ok())]
    HexInt(u64),

    // Octal integer
    #[regex(r"0[0-7]+", |lex| u64::from_str_radix(&lex.slice()[1..], 8).ok())]
    OctInt(u64),

    // Decimal integer
    #[regex(r"0|[1-9][0-9]*", |lex| lex.slice().parse::<u64>().ok())]
    Int(u64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // Byte literal `0x"de ad be ef"`
    #[regex(r#"0x"[^"\n]*""#)]
    Bytes,

    // String literal (no unescaped newlines allowed)
    #[regex(r#""([^"\\\n\r]|\\.)*""#)]
    String,

    // Opening quote with no closing quote on the same line
    #[regex(r#""([^"\\\n\r]|\\.)*"#)]
    UnterminatedString,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Lex source text into a `TokenList` ending in `Eof`.
///
/// Fails on the first malformed token.
pub fn lex(source: &str) -> Result<TokenList, LexError> {
    let end = u32::try_from(source.len())
        .map_err(|_| LexError::new(Span::DUMMY, LexErrorKind::SourceTooLarge))?;

    let mut tokens = Vec::new();
    let mut logos = RawToken::lexer(source);

    while let Some(result) = logos.next() {
        let span = Span::try_from(logos.span())
            .map_err(|_| LexError::new(Span::DUMMY, LexErrorKind::SourceTooLarge))?;
        let slice = logos.slice();

        let kind = match result {
            Ok(raw) => convert_token(raw, slice, span)?,
            Err(()) => return Err(classify_error(slice, span)),
        };
        tokens.push(Token::new(kind, span));
    }

    Ok(TokenList::new(tokens, end))
}

fn convert_token(raw: RawToken, slice: &str, span: Span) -> Result<TokenKind, LexError> {
    Ok(match raw {
        RawToken::Struct => TokenKind::Struct,
        RawToken::Enum => TokenKind::Enum,
        RawToken::Interface => TokenKind::Interface,
        RawToken::Union => TokenKind::Union,
        RawToken::Group => TokenKind::Group,
        RawToken::Const => TokenKind::Const,
        RawToken::Annotation => TokenKind::Annotation,
        RawToken::Using => TokenKind::Using,
        RawToken::Import => TokenKind::Import,
        RawToken::Extends => TokenKind::Extends,

        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Eq => TokenKind::Eq,
        RawToken::At => TokenKind::At,
        RawToken::Dollar => TokenKind::Dollar,
        RawToken::Arrow => TokenKind::Arrow,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,

        RawToken::Int(n) | RawToken::HexInt(n) | RawToken::OctInt(n) => TokenKind::Int(n),
        RawToken::Float(f) => TokenKind::Float(f),
        RawToken::Bytes => {
            let content = &slice[3..slice.len() - 1];
            let bytes = escape::decode_hex_bytes(content)
                .ok_or_else(|| LexError::new(span, LexErrorKind::MalformedBytes))?;
            TokenKind::Bytes(bytes)
        }
        RawToken::String => {
            let content = &slice[1..slice.len() - 1];
            let text = escape::unescape_string(content)
                .map_err(|c| LexError::new(span, LexErrorKind::InvalidEscape(c)))?;
            TokenKind::Str(text)
        }
        RawToken::UnterminatedString => {
            return Err(LexError::new(span, LexErrorKind::UnterminatedString));
        }
        RawToken::Ident => TokenKind::Ident(slice.to_string()),
    })
}

/// Explain a slice logos rejected. Numeric callbacks return `None` on
/// overflow, which also lands here.
fn classify_error(slice: &str, span: Span) -> LexError {
    let first = slice.chars().next().unwrap_or('\0');
    let kind = if first.is_ascii_digit() {
        LexErrorKind::InvalidNumber
    } else {
        LexErrorKind::InvalidCharacter(first)
    };
    LexError::new(span, kind)
}

#[cfg(test)]
mod tests;
