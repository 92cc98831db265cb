//! Rejected input.

use capn_diagnostic::ErrorCode;
use pretty_assertions::assert_eq;

use crate::{parse, SyntaxError};

fn parse_err(source: &str) -> SyntaxError {
    match parse(source) {
        Ok(tree) => panic!("expected error, parsed {} decls", tree.decls.len()),
        Err(err) => err,
    }
}

#[test]
fn test_id_without_high_bit() {
    let err = parse_err("@0x1234;");
    assert_eq!(err.code, ErrorCode::E1005);
    assert_eq!((err.line, err.column), (1, 1));
}

#[test]
fn test_duplicate_file_id() {
    let err = parse_err("@0x8000000000000001;\n@0x8000000000000002;");
    assert_eq!(err.code, ErrorCode::E1001);
    assert_eq!(err.line, 2);
}

#[test]
fn test_error_position_points_at_bad_token() {
    let err = parse_err("struct S {\n  x @0 :Int32\n}");
    assert_eq!(err.code, ErrorCode::E1001);
    assert_eq!((err.line, err.column), (3, 1));
    assert!(err.message.contains("`;`"), "{}", err.message);
}

#[test]
fn test_field_without_ordinal() {
    let err = parse_err("struct S { x :Int32; }");
    assert_eq!(err.code, ErrorCode::E1001);
}

#[test]
fn test_missing_type() {
    let err = parse_err("struct S { x @0 :; }");
    assert_eq!(err.code, ErrorCode::E1003);
}

#[test]
fn test_missing_value() {
    let err = parse_err("const c :Int32 = ;");
    assert_eq!(err.code, ErrorCode::E1004);
}

#[test]
fn test_ordinal_out_of_range() {
    let err = parse_err("struct S { x @65535 :Int32; }");
    assert_eq!(err.code, ErrorCode::E1007);
}

#[test]
fn test_unknown_annotation_target() {
    let err = parse_err("annotation a(widget) :Void;");
    assert_eq!(err.code, ErrorCode::E1006);
}

#[test]
fn test_unterminated_block() {
    let err = parse_err("struct S { x @0 :Int32;");
    assert_eq!(err.code, ErrorCode::E1001);
}

#[test]
fn test_lex_errors_surface_with_codes() {
    assert_eq!(parse_err("const s :Text = \"open;").code, ErrorCode::E0001);
    assert_eq!(parse_err("struct S { x @0 :Int32; } %").code, ErrorCode::E0002);
}

#[test]
fn test_diagnostic_carries_location() {
    let err = parse_err("struct {}");
    assert_eq!(err.code, ErrorCode::E1002);
    let diag = err.to_diagnostic("bad.capnp");
    assert_eq!(
        diag.primary_location().map(ToString::to_string),
        Some("bad.capnp:1:8".to_string())
    );
}
