use super::*;

#[test]
fn test_unexpected_message_and_code() {
    let err = ParseError::unexpected("identifier", &TokenKind::LBrace, Span::new(7, 8));
    assert_eq!(err.code, ErrorCode::E1002);
    assert_eq!(err.message, "expected identifier, found `{`");

    let err = ParseError::unexpected("`;`", &TokenKind::Eof, Span::point(3));
    assert_eq!(err.code, ErrorCode::E1001);
    assert_eq!(err.message, "expected `;`, found end of file");
}

#[test]
fn test_syntax_error_location() {
    let source = "struct A {\n  x @0 Int32;\n}";
    let lines = LineOffsetTable::build(source);
    let err = ParseError::new(ErrorCode::E1001, "expected `:`", Span::new(18, 23))
        .into_syntax_error(source, &lines);
    assert_eq!((err.line, err.column), (2, 8));
    assert_eq!(err.to_string(), "2:8: expected `:`");

    let diag = err.to_diagnostic("a.capnp");
    assert_eq!(
        diag.primary_location(),
        Some(&SourceLocation::new("a.capnp", 2, 8))
    );
}
