use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_bools_pack_into_one_byte() {
    let mut alloc = Allocator::default();
    let offsets: Vec<u32> = (0..8).map(|_| alloc.add_data(Region::Top, 0)).collect();
    assert_eq!(offsets, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(alloc.data_words, 1);
}

#[test]
fn test_small_field_fills_hole_before_new_word() {
    let mut alloc = Allocator::default();
    // 32 bits at word 0, then 16 bits in the upper half, then a new word.
    assert_eq!(alloc.add_data(Region::Top, 5), 0);
    assert_eq!(alloc.add_data(Region::Top, 4), 2);
    assert_eq!(alloc.add_data(Region::Top, 6), 1);
    assert_eq!(alloc.add_data(Region::Top, 4), 3);
    assert_eq!(alloc.data_words, 2);
}

#[test]
fn test_bool_after_int64_starts_second_word() {
    let mut alloc = Allocator::default();
    assert_eq!(alloc.add_data(Region::Top, 6), 0);
    assert_eq!(alloc.add_data(Region::Top, 0), 64);
    assert_eq!(alloc.add_data(Region::Top, 3), 9);
    assert_eq!(alloc.data_words, 2);
}

#[test]
fn test_pointers_count_up() {
    let mut alloc = Allocator::default();
    assert_eq!(alloc.add_pointer(Region::Top), 0);
    assert_eq!(alloc.add_pointer(Region::Top), 1);
    assert_eq!(alloc.pointer_count, 2);
}

#[test]
fn test_union_arms_share_storage() {
    let mut alloc = Allocator::default();
    let union = alloc.new_union(Region::Top);
    let a = alloc.new_arm(union);
    let b = alloc.new_arm(union);

    assert_eq!(alloc.add_data(Region::Arm(a), 5), 0);
    // Second arm triggers the discriminant, then reuses the first location.
    assert_eq!(alloc.add_data(Region::Arm(b), 5), 0);
    assert_eq!(alloc.unions[union].discriminant_offset, Some(2));
    assert_eq!(alloc.arms[a].discriminant, Some(0));
    assert_eq!(alloc.arms[b].discriminant, Some(1));
    assert_eq!(alloc.data_words, 1);
}

#[test]
fn test_union_pointer_arms_share_slot() {
    let mut alloc = Allocator::default();
    let union = alloc.new_union(Region::Top);
    let a = alloc.new_arm(union);
    let b = alloc.new_arm(union);

    assert_eq!(alloc.add_pointer(Region::Arm(a)), 0);
    assert_eq!(alloc.add_pointer(Region::Arm(b)), 0);
    assert_eq!(alloc.add_pointer(Region::Arm(b)), 1);
    assert_eq!(alloc.pointer_count, 2);
}

#[test]
fn test_arm_grows_within_location() {
    let mut alloc = Allocator::default();
    let union = alloc.new_union(Region::Top);
    let a = alloc.new_arm(union);
    let b = alloc.new_arm(union);

    // A 64-bit location, then the other arm packs two 16-bit fields into it.
    assert_eq!(alloc.add_data(Region::Arm(a), 6), 0);
    assert_eq!(alloc.add_data(Region::Arm(b), 4), 0);
    assert_eq!(alloc.add_data(Region::Arm(b), 4), 1);
    // Discriminant went into a new word since word 0 belongs to the union.
    assert_eq!(alloc.unions[union].discriminant_offset, Some(4));
    assert_eq!(alloc.data_words, 2);
}

#[test]
fn test_empty_arms_get_remaining_discriminants() {
    let mut alloc = Allocator::default();
    let union = alloc.new_union(Region::Top);
    let a = alloc.new_arm(union);
    let b = alloc.new_arm(union);
    let c = alloc.new_arm(union);

    alloc.add_void(Region::Arm(c));
    alloc.finish(&[a, b, c]);

    assert_eq!(alloc.arms[c].discriminant, Some(0));
    assert_eq!(alloc.arms[a].discriminant, Some(1));
    assert_eq!(alloc.arms[b].discriminant, Some(2));
    assert_eq!(alloc.unions[union].discriminant_offset, Some(0));
}

#[test]
fn test_hole_set_splits_larger_holes() {
    let mut holes = HoleSet::default();
    holes.add_holes_at_end(3, 1, 6);
    assert_eq!(holes.try_allocate(3), Some(1));
    assert_eq!(holes.try_allocate(3), Some(2));
    assert_eq!(holes.try_allocate(4), Some(2));
    assert_eq!(holes.smallest_at_least(0), Some(3));
}

#[test]
fn test_hole_set_expands_into_following_holes() {
    let mut holes = HoleSet::default();
    holes.add_holes_at_end(3, 1, 6);
    // An 8-bit field at 0 grows to 32 bits by absorbing the holes after it.
    assert!(holes.try_expand(3, 0, 2));
    assert_eq!(holes.holes[3], 0);
    assert_eq!(holes.holes[4], 0);
    assert_eq!(holes.holes[5], 1);
    // Nothing follows the second byte of a word.
    assert!(!holes.try_expand(3, 1, 1));
    assert!(holes.try_expand(5, 1, 0));
}

#[test]
fn test_union_location_widens_in_place() {
    let mut alloc = Allocator::default();
    let union = alloc.new_union(Region::Top);
    let a = alloc.new_arm(union);
    let b = alloc.new_arm(union);

    assert_eq!(alloc.add_data(Region::Arm(a), 3), 0);
    // The discriminant lands at 16-bit offset 1, then the byte
    // location grows to 16 bits over the hole that follows it.
    assert_eq!(alloc.add_data(Region::Arm(b), 4), 0);
    assert_eq!(alloc.unions[union].discriminant_offset, Some(1));
    assert_eq!(alloc.unions[union].data[0].lg, 4);
    assert_eq!(alloc.unions[union].data.len(), 1);
    assert_eq!(alloc.data_words, 1);
}

#[test]
fn test_nested_union_location_widens_through_outer_arm() {
    let mut alloc = Allocator::default();
    let outer = alloc.new_union(Region::Top);
    let p = alloc.new_arm(outer);
    let _q = alloc.new_arm(outer);
    let inner = alloc.new_union(Region::Arm(p));
    let x = alloc.new_arm(inner);
    let y = alloc.new_arm(inner);

    assert_eq!(alloc.add_data(Region::Arm(x), 3), 0);
    assert_eq!(alloc.add_data(Region::Arm(y), 4), 0);
    assert_eq!(alloc.unions[inner].discriminant_offset, Some(1));
    assert_eq!(alloc.unions[inner].data[0].lg, 4);
    assert_eq!(alloc.unions[outer].data[0].lg, 5);

    alloc.finish(&[p, x, y]);
    assert_eq!(alloc.unions[outer].discriminant_offset, Some(2));
    assert_eq!(alloc.data_words, 1);
}

#[test]
fn test_void_in_nested_union_claims_outer_arm() {
    let mut alloc = Allocator::default();
    let outer = alloc.new_union(Region::Top);
    let g = alloc.new_arm(outer);
    let a = alloc.new_arm(outer);
    let inner = alloc.new_union(Region::Arm(g));
    let x = alloc.new_arm(inner);
    let y = alloc.new_arm(inner);

    alloc.add_void(Region::Arm(x));
    alloc.add_void(Region::Arm(a));
    alloc.add_void(Region::Arm(y));

    assert_eq!(alloc.arms[g].discriminant, Some(0));
    assert_eq!(alloc.arms[a].discriminant, Some(1));
    assert_eq!(alloc.arms[x].discriminant, Some(0));
    assert_eq!(alloc.arms[y].discriminant, Some(1));
    assert_eq!(alloc.unions[outer].discriminant_offset, Some(0));
    assert_eq!(alloc.unions[inner].discriminant_offset, Some(1));
}
