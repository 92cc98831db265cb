use capn_diagnostic::ErrorCode;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::{compile, compile_err, node, slot};
use crate::{id, FieldBody, SlotLocation};

fn bits(n: &crate::Node, field: &str) -> (u32, u32) {
    match slot(n, field).location {
        SlotLocation::Data {
            bit_offset,
            bit_width,
        } => (bit_offset, bit_width),
        other => panic!("{field} is not a data slot: {other:?}"),
    }
}

fn pointer(n: &crate::Node, field: &str) -> u32 {
    match slot(n, field).location {
        SlotLocation::Pointer { index } => index,
        other => panic!("{field} is not a pointer slot: {other:?}"),
    }
}

#[test]
fn test_point_layout() {
    let graph = compile("struct Point { x @0 :Float64; y @1 :Float64; }");
    let point = node(&graph, "Point");
    let s = point.as_struct().unwrap();
    assert_eq!((s.data_words, s.pointer_count), (2, 0));
    assert_eq!(bits(point, "x"), (0, 64));
    assert_eq!(bits(point, "y"), (64, 64));
    assert_eq!(slot(point, "y").byte_offset(), Some(8));
    assert_eq!(slot(point, "y").offset(), 1);
}

#[test]
fn test_small_fields_pack_into_holes() {
    let graph = compile(
        "struct S {\n\
           a @0 :Bool;\n\
           b @1 :Int32;\n\
           c @2 :Text;\n\
           d @3 :Bool;\n\
           e @4 :UInt8;\n\
         }",
    );
    let s = node(&graph, "S");
    assert_eq!(bits(s, "a"), (0, 1));
    assert_eq!(bits(s, "b"), (32, 32));
    assert_eq!(bits(s, "d"), (1, 1));
    assert_eq!(bits(s, "e"), (8, 8));
    assert_eq!(pointer(s, "c"), 0);
    let body = s.as_struct().unwrap();
    assert_eq!((body.data_words, body.pointer_count), (1, 1));
}

#[test]
fn test_layout_follows_ordinals_not_code_order() {
    let graph = compile("struct S { b @1 :Int32; a @0 :Int64; }");
    let s = node(&graph, "S");
    assert_eq!(bits(s, "a"), (0, 64));
    assert_eq!(bits(s, "b"), (64, 32));
    assert_eq!(s.fields()[0].name, "b");
    assert_eq!(s.fields()[0].code_order, 0);
}

#[test]
fn test_void_fields_take_no_space() {
    let graph = compile("struct S { v @0 :Void; }");
    let s = node(&graph, "S");
    assert_eq!(slot(s, "v").location, SlotLocation::None);
    assert_eq!(s.as_struct().unwrap().data_words, 0);
}

#[test]
fn test_unnamed_union() {
    let graph = compile(
        "struct Shape {\n\
           area @0 :Float64;\n\
           union {\n\
             circle @1 :Float64;\n\
             square @2 :Float64;\n\
           }\n\
         }",
    );
    let shape = node(&graph, "Shape");
    let body = shape.as_struct().unwrap();
    assert_eq!(bits(shape, "area"), (0, 64));
    assert_eq!(bits(shape, "circle"), (64, 64));
    assert_eq!(bits(shape, "square"), (64, 64));
    assert_eq!(body.discriminant_count, 2);
    assert_eq!(body.discriminant_offset, 8);
    assert_eq!(body.data_words, 3);

    let discriminants: Vec<Option<u16>> =
        shape.fields().iter().map(|f| f.discriminant_value).collect();
    assert_eq!(discriminants, vec![None, Some(0), Some(1)]);
}

#[test]
fn test_group_shares_parent_sections() {
    let graph = compile(
        "struct Person {\n\
           name @0 :Text;\n\
           address :group {\n\
             city @1 :Text;\n\
             zip @2 :UInt32;\n\
           }\n\
         }",
    );
    let person = node(&graph, "Person");
    let address = node(&graph, "Person.address");

    let group_id = person.fields()[1].group_id().unwrap();
    assert_eq!(group_id, address.id);
    assert_eq!(group_id, id::group_id(person.id, 1));
    assert_eq!(address.scope_id, person.id);
    assert_eq!(person.fields()[1].ordinal, None);

    let body = address.as_struct().unwrap();
    assert!(body.is_group);
    assert_eq!((body.data_words, body.pointer_count), (1, 2));
    assert_eq!(pointer(address, "city"), 1);
    assert_eq!(bits(address, "zip"), (0, 32));
}

#[test]
fn test_named_union_is_group_node() {
    let graph = compile(
        "struct Msg {\n\
           body :union {\n\
             text @0 :Text;\n\
             data @1 :Data;\n\
           }\n\
         }",
    );
    let body = node(&graph, "Msg.body");
    let s = body.as_struct().unwrap();
    assert!(s.is_group);
    assert_eq!(s.discriminant_count, 2);
    assert_eq!(pointer(body, "text"), 0);
    assert_eq!(pointer(body, "data"), 0);
    assert!(matches!(node(&graph, "Msg").fields()[0].body, FieldBody::Group { .. }));
}

#[test]
fn test_method_param_structs() {
    let graph = compile("interface Calc { add @0 (a :Int32, b :Int32) -> (sum :Int32); }");
    let calc = node(&graph, "Calc");
    let method = &calc.methods()[0];
    assert_eq!(method.param_struct, id::method_param_id(calc.id, 0, false));
    assert_eq!(method.result_struct, id::method_param_id(calc.id, 0, true));

    let params = graph.get_node(method.param_struct).unwrap();
    assert_eq!(params.display_name, "test.capnp:Calc.add$Params");
    assert_eq!(params.scope_id, 0);
    assert_eq!(bits(params, "a"), (0, 32));
    assert_eq!(bits(params, "b"), (32, 32));
    assert_eq!(params.fields()[1].ordinal, Some(1));

    let results = graph.get_node(method.result_struct).unwrap();
    assert_eq!(results.short_name(), "add$Results");
    assert_eq!(results.fields().len(), 1);
}

#[test]
fn test_method_without_results_gets_empty_struct() {
    let graph = compile("interface Log { write @0 (line :Text); }");
    let method = &node(&graph, "Log").methods()[0];
    let results = graph.get_node(method.result_struct).unwrap();
    assert!(results.fields().is_empty());
}

#[test]
fn test_union_arm_widens_shared_location() {
    let graph = compile("struct S { union { a @0 :UInt8; b @1 :UInt16; } }");
    let s = node(&graph, "S");
    let body = s.as_struct().unwrap();
    assert_eq!(bits(s, "a"), (0, 8));
    assert_eq!(bits(s, "b"), (0, 16));
    assert_eq!(body.discriminant_offset, 1);
    assert_eq!(body.data_words, 1);
}

#[test]
fn test_void_in_nested_union_orders_outer_discriminants() {
    let graph = compile(
        "struct S {\n\
           union {\n\
             g :group { union { x @0 :Void; y @2 :Void; } }\n\
             a @1 :Void;\n\
           }\n\
         }",
    );
    let s = node(&graph, "S");
    let discriminants: Vec<(&str, Option<u16>)> = s
        .fields()
        .iter()
        .map(|f| (f.name.as_str(), f.discriminant_value))
        .collect();
    assert_eq!(discriminants, vec![("g", Some(0)), ("a", Some(1))]);
    assert_eq!(s.as_struct().unwrap().discriminant_offset, 0);

    let g = node(&graph, "S.g");
    assert_eq!(g.as_struct().unwrap().discriminant_offset, 1);
}

#[test]
fn test_skipped_ordinal() {
    let err = compile_err("struct S { a @0 :Int32; b @2 :Int32; }");
    assert_eq!(err.code(), ErrorCode::E3001);
    assert!(err.to_string().contains("skipped ordinal @1"), "{err}");
}

#[test]
fn test_duplicate_ordinal() {
    let err = compile_err("struct S { a @0 :Int32; b @0 :Int32; }");
    assert_eq!(err.code(), ErrorCode::E3001);
}

#[test]
fn test_ordinals_span_groups() {
    let err = compile_err("struct S { a @0 :Int32; g :group { b @0 :Int32; } }");
    assert_eq!(err.code(), ErrorCode::E3001);
}

#[test]
fn test_union_needs_two_members() {
    let err = compile_err("struct S { union { a @0 :Int32; } }");
    assert_eq!(err.code(), ErrorCode::E3002);
}

#[test]
fn test_second_unnamed_union() {
    let err = compile_err(
        "struct S { union { a @0 :Int32; b @1 :Int32; } union { c @2 :Int32; d @3 :Int32; } }",
    );
    assert_eq!(err.code(), ErrorCode::E3003);
}

const FIELD_TYPES: [&str; 11] = [
    "Void", "Bool", "Int8", "Int16", "Int32", "Int64", "UInt16", "Float32", "Float64", "Text",
    "Data",
];

proptest! {
    #[test]
    fn prop_fields_never_overlap(types in prop::collection::vec(0..FIELD_TYPES.len(), 1..24)) {
        let mut source = String::from("struct S {\n");
        for (i, t) in types.iter().enumerate() {
            source.push_str(&format!("  f{i} @{i} :{};\n", FIELD_TYPES[*t]));
        }
        source.push('}');

        let graph = compile(&source);
        let s = node(&graph, "S");
        let body = s.as_struct().unwrap();

        let mut data: Vec<(u32, u32)> = Vec::new();
        let mut pointers: Vec<u32> = Vec::new();
        for field in s.fields() {
            match field.as_slot().unwrap().location {
                SlotLocation::Data { bit_offset, bit_width } => {
                    prop_assert_eq!(bit_offset % bit_width, 0);
                    prop_assert!(bit_offset + bit_width <= body.data_words * 64);
                    data.push((bit_offset, bit_offset + bit_width));
                }
                SlotLocation::Pointer { index } => {
                    prop_assert!(index < body.pointer_count);
                    pointers.push(index);
                }
                SlotLocation::None => {}
            }
        }
        data.sort_unstable();
        for pair in data.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
        pointers.sort_unstable();
        pointers.dedup();
        prop_assert_eq!(pointers.len() as u32, body.pointer_count);
    }

    #[test]
    fn prop_compiling_is_deterministic(types in prop::collection::vec(0..FIELD_TYPES.len(), 1..12)) {
        let mut source = String::from("struct A {\n");
        for (i, t) in types.iter().enumerate() {
            source.push_str(&format!("  f{i} @{i} :{};\n", FIELD_TYPES[*t]));
        }
        source.push_str("  struct B { x @0 :A; }\n}\nenum E { a @0; b @1; }\n");
        prop_assert_eq!(compile(&source), compile(&source));
    }
}
