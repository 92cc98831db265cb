#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).unwrap().iter().map(|t| t.kind.clone()).collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Ident(name.to_string())
}

#[test]
fn test_struct_declaration() {
    assert_eq!(
        kinds("struct Point { x @0 :Int32; }"),
        vec![
            TokenKind::Struct,
            ident("Point"),
            TokenKind::LBrace,
            ident("x"),
            TokenKind::At,
            TokenKind::Int(0),
            TokenKind::Colon,
            ident("Int32"),
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_comments_and_whitespace_skipped() {
    let source = "# leading comment\nstruct A {} # trailing\n\t# indented\n";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Struct,
            ident("A"),
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_integer_radixes() {
    assert_eq!(
        kinds("0 42 0x1F 017"),
        vec![
            TokenKind::Int(0),
            TokenKind::Int(42),
            TokenKind::Int(31),
            TokenKind::Int(15),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_file_id_literal() {
    assert_eq!(
        kinds("@0xdbb9ad1f14bf0b36;"),
        vec![
            TokenKind::At,
            TokenKind::Int(0xdbb9_ad1f_14bf_0b36),
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_negative_is_separate_token() {
    assert_eq!(
        kinds("-5 -1.5"),
        vec![
            TokenKind::Minus,
            TokenKind::Int(5),
            TokenKind::Minus,
            TokenKind::Float(1.5),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_floats() {
    assert_eq!(
        kinds("3.25 1e3 2.5e-2"),
        vec![
            TokenKind::Float(3.25),
            TokenKind::Float(1000.0),
            TokenKind::Float(0.025),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_strings_and_bytes() {
    assert_eq!(
        kinds(r#""hi\n" 0x"de ad" """#),
        vec![
            TokenKind::Str("hi\n".to_string()),
            TokenKind::Bytes(vec![0xde, 0xad]),
            TokenKind::Str(String::new()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_import_path() {
    assert_eq!(
        kinds(r#"using import "/capnp/c++.capnp".Foo;"#),
        vec![
            TokenKind::Using,
            TokenKind::Import,
            TokenKind::Str("/capnp/c++.capnp".to_string()),
            TokenKind::Dot,
            ident("Foo"),
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_arrow_and_punctuation() {
    assert_eq!(
        kinds("-> $ [ ] ( ) = , *"),
        vec![
            TokenKind::Arrow,
            TokenKind::Dollar,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Eq,
            TokenKind::Comma,
            TokenKind::Star,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(
        kinds("structure unions"),
        vec![ident("structure"), ident("unions"), TokenKind::Eof]
    );
}

#[test]
fn test_spans() {
    let tokens = lex("struct Foo").unwrap();
    assert_eq!(tokens[0].span, Span::new(0, 6));
    assert_eq!(tokens[1].span, Span::new(7, 10));
    assert_eq!(tokens.eof().span, Span::point(10));
}

#[test]
fn test_unterminated_string() {
    let err = lex("const a :Text = \"abc\n;").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    assert_eq!(err.span.start, 16);
}

#[test]
fn test_invalid_character() {
    let err = lex("struct A % {}").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::InvalidCharacter('%'));
    assert_eq!(err.span, Span::new(9, 10));
}

#[test]
fn test_integer_overflow() {
    let err = lex("99999999999999999999999").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::InvalidNumber);
}

#[test]
fn test_bad_escape() {
    let err = lex(r#""\q""#).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::InvalidEscape('q'));
}

#[test]
fn test_odd_byte_literal() {
    let err = lex(r#"0x"abc""#).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::MalformedBytes);
}

#[test]
fn test_empty_source() {
    let tokens = lex("").unwrap();
    assert!(tokens.is_empty());
    assert_eq!(tokens.len(), 1);
}

proptest! {
    #[test]
    fn identifiers_round_trip(name in "[a-z][a-zA-Z0-9_]{0,12}") {
        let tokens = lex(&name).unwrap();
        let is_keyword = matches!(
            name.as_str(),
            "struct" | "enum" | "interface" | "union" | "group" | "const"
                | "annotation" | "using" | "import" | "extends"
        );
        prop_assume!(!is_keyword);
        prop_assert_eq!(&tokens[0].kind, &TokenKind::Ident(name));
    }

    #[test]
    fn decimal_integers_round_trip(n in 1u64..) {
        let tokens = lex(&n.to_string()).unwrap();
        prop_assert_eq!(&tokens[0].kind, &TokenKind::Int(n));
    }
}
