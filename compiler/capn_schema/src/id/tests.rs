use proptest::prelude::*;

use super::*;

#[test]
fn test_derived_ids_have_high_bit() {
    assert_ne!(file_id("a.capnp") & ID_HIGH_BIT, 0);
    assert_ne!(child_id(0x8000_0000_0000_0001, "Point") & ID_HIGH_BIT, 0);
    assert_ne!(group_id(0x8000_0000_0000_0001, 3) & ID_HIGH_BIT, 0);
    assert_ne!(method_param_id(0x8000_0000_0000_0001, 0, true) & ID_HIGH_BIT, 0);
}

#[test]
fn test_param_and_result_ids_differ() {
    let iface = file_id("calc.capnp");
    assert_ne!(
        method_param_id(iface, 0, false),
        method_param_id(iface, 0, true)
    );
    assert_ne!(
        method_param_id(iface, 0, false),
        method_param_id(iface, 1, false)
    );
}

#[test]
fn test_child_id_depends_on_parent() {
    assert_ne!(child_id(file_id("a.capnp"), "X"), child_id(file_id("b.capnp"), "X"));
}

#[test]
fn test_two_byte_child_name_is_not_a_group_index() {
    let parent = 0x8000_0000_0000_0001;
    // "AB" is the little-endian encoding of index 0x4241.
    assert_ne!(child_id(parent, "AB"), group_id(parent, 0x4241));
    assert_ne!(child_id(parent, "\u{1}\0"), group_id(parent, 1));
}

#[test]
fn test_param_struct_is_not_a_child() {
    let iface = 0x8000_0000_0000_0001;
    // Ordinal 0x4241 then `false` spells the bytes of "AB\0".
    assert_ne!(method_param_id(iface, 0x4241, false), child_id(iface, "AB\0"));
}

proptest! {
    #[test]
    fn child_id_is_deterministic(parent in any::<u64>(), name in "[A-Za-z][A-Za-z0-9]{0,12}") {
        prop_assert_eq!(child_id(parent, &name), child_id(parent, &name));
    }

    #[test]
    fn distinct_names_get_distinct_ids(parent in any::<u64>(), a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        prop_assume!(a != b);
        prop_assert_ne!(child_id(parent, &a), child_id(parent, &b));
    }
}
