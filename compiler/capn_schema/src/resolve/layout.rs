//! Struct layout.
//!
//! Fields are placed in ordinal order. Data fields fill the smallest
//! free hole that fits before a new word is added; union arms share
//! storage with each other, and a union gains its 16-bit discriminant
//! as soon as its second arm receives a member.

use rustc_hash::FxHashMap;

use super::scope::{DeclTable, MemberSource, ScopeIdx, ScopeKind};
use crate::{CompileError, FieldSize, SlotLocation, TypeRef};

/// log2 of the word size in bits.
const WORD_LG: u8 = 6;

/// Free space left behind by smaller allocations. `holes[lg]` is the
/// offset, in units of `1 << lg` bits, of a free hole of that size.
/// Offset 0 never denotes a hole since it is always taken first.
#[derive(Clone, Debug, Default)]
struct HoleSet {
    holes: [u32; WORD_LG as usize],
}

impl HoleSet {
    fn try_allocate(&mut self, lg: u8) -> Option<u32> {
        let index = usize::from(lg);
        if index >= self.holes.len() {
            return None;
        }
        if self.holes[index] != 0 {
            return Some(std::mem::take(&mut self.holes[index]));
        }
        let larger = self.try_allocate(lg + 1)?;
        let offset = larger * 2;
        self.holes[index] = offset + 1;
        Some(offset)
    }

    /// Record the space after a fresh allocation of size `lg` at
    /// `offset - 1`, for every size from `lg` up to `limit`.
    fn add_holes_at_end(&mut self, mut lg: u8, mut offset: u32, limit: u8) {
        while lg < limit {
            self.holes[usize::from(lg)] = offset;
            lg += 1;
            offset = (offset + 1) / 2;
        }
    }

    fn smallest_at_least(&self, lg: u8) -> Option<u8> {
        (lg..WORD_LG).find(|&size| self.holes[usize::from(size)] != 0)
    }

    /// Grow the allocation of size `lg` at `offset` to `lg + factor` by
    /// absorbing the holes that directly follow it.
    fn try_expand(&mut self, lg: u8, offset: u32, factor: u8) -> bool {
        if factor == 0 {
            return true;
        }
        let index = usize::from(lg);
        if index >= self.holes.len() || self.holes[index] != offset + 1 {
            return false;
        }
        if self.try_expand(lg + 1, offset >> 1, factor - 1) {
            self.holes[index] = 0;
            true
        } else {
            false
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Region {
    Top,
    Arm(usize),
}

/// Storage a union obtained from its parent.
#[derive(Copy, Clone, Debug)]
struct DataLocation {
    lg: u8,
    offset: u32,
}

/// How much of one union location an arm has used.
#[derive(Clone, Debug, Default)]
struct Usage {
    used: Option<u8>,
    holes: HoleSet,
}

impl Usage {
    fn best_fit(&self, location: DataLocation, lg: u8) -> Option<u8> {
        match self.used {
            None => (lg <= location.lg).then_some(location.lg),
            Some(used) if lg >= used => (lg < location.lg).then_some(lg),
            Some(used) => self
                .holes
                .smallest_at_least(lg)
                .or_else(|| (used < location.lg).then_some(used)),
        }
    }

    /// Allocate within `location`; `best_fit` must have succeeded.
    fn allocate(&mut self, location: DataLocation, lg: u8) -> u32 {
        let base = location.offset << (location.lg - lg);
        match self.used {
            None => {
                self.used = Some(lg);
                base
            }
            Some(used) if lg >= used => {
                self.holes.add_holes_at_end(used, 1, lg);
                self.used = Some(lg + 1);
                base + 1
            }
            Some(used) => {
                if let Some(offset) = self.holes.try_allocate(lg) {
                    return base + offset;
                }
                // Double the used space and take the start of the new half.
                let offset = 1 << (used - lg);
                self.holes.add_holes_at_end(lg, offset + 1, used);
                self.used = Some(used + 1);
                base + offset
            }
        }
    }
}

#[derive(Debug)]
struct UnionState {
    parent: Region,
    arms_with_members: u16,
    discriminant_offset: Option<u32>,
    data: Vec<DataLocation>,
    pointers: Vec<u32>,
}

#[derive(Debug)]
struct ArmState {
    union: usize,
    discriminant: Option<u16>,
    data_usage: Vec<Usage>,
    pointers_used: usize,
}

#[derive(Debug, Default)]
struct Allocator {
    data_words: u32,
    pointer_count: u32,
    holes: HoleSet,
    unions: Vec<UnionState>,
    arms: Vec<ArmState>,
}

impl Allocator {
    fn new_union(&mut self, parent: Region) -> usize {
        self.unions.push(UnionState {
            parent,
            arms_with_members: 0,
            discriminant_offset: None,
            data: Vec::new(),
            pointers: Vec::new(),
        });
        self.unions.len() - 1
    }

    fn new_arm(&mut self, union: usize) -> usize {
        self.arms.push(ArmState {
            union,
            discriminant: None,
            data_usage: Vec::new(),
            pointers_used: 0,
        });
        self.arms.len() - 1
    }

    /// Offset in units of `1 << lg` bits.
    fn add_data(&mut self, region: Region, lg: u8) -> u32 {
        match region {
            Region::Top => {
                if let Some(offset) = self.holes.try_allocate(lg) {
                    return offset;
                }
                let offset = self.data_words << (WORD_LG - lg);
                self.data_words += 1;
                self.holes.add_holes_at_end(lg, offset + 1, WORD_LG);
                offset
            }
            Region::Arm(arm) => self.add_arm_data(arm, lg),
        }
    }

    fn add_arm_data(&mut self, arm: usize, lg: u8) -> u32 {
        self.add_member(arm);
        let union = self.arms[arm].union;
        let locations = self.unions[union].data.len();
        self.arms[arm].data_usage.resize_with(locations, Usage::default);

        let mut best: Option<(u8, usize)> = None;
        for (index, usage) in self.arms[arm].data_usage.iter().enumerate() {
            let Some(size) = usage.best_fit(self.unions[union].data[index], lg) else {
                continue;
            };
            match best {
                Some((best_size, _)) if best_size <= size => {}
                _ => best = Some((size, index)),
            }
        }
        if let Some((_, index)) = best {
            let location = self.unions[union].data[index];
            return self.arms[arm].data_usage[index].allocate(location, lg);
        }

        // No hole fits, so try growing a location in place.
        for index in 0..locations {
            if let Some(offset) = self.allocate_by_expanding(arm, index, lg) {
                return offset;
            }
        }

        let parent = self.unions[union].parent;
        let offset = self.add_data(parent, lg);
        self.unions[union].data.push(DataLocation { lg, offset });
        self.arms[arm].data_usage.push(Usage {
            used: Some(lg),
            holes: HoleSet::default(),
        });
        offset
    }

    fn allocate_by_expanding(&mut self, arm: usize, index: usize, lg: u8) -> Option<u32> {
        let union = self.arms[arm].union;
        let offset = match self.arms[arm].data_usage[index].used {
            None => {
                if !self.expand_location(union, index, lg) {
                    return None;
                }
                self.arms[arm].data_usage[index].used = Some(lg);
                0
            }
            Some(used) => {
                if !self.expand_usage(arm, index, used.max(lg) + 1, true) {
                    return None;
                }
                self.arms[arm].data_usage[index].holes.try_allocate(lg)?
            }
        };
        let location = self.unions[union].data[index];
        Some((location.offset << (location.lg - lg)) + offset)
    }

    /// Widen a union location to `lg` by expanding it within its parent.
    fn expand_location(&mut self, union: usize, index: usize, lg: u8) -> bool {
        let location = self.unions[union].data[index];
        if lg <= location.lg {
            return true;
        }
        let factor = lg - location.lg;
        let parent = self.unions[union].parent;
        if !self.try_expand_data(parent, location.lg, location.offset, factor) {
            return false;
        }
        let location = &mut self.unions[union].data[index];
        location.offset >>= factor;
        location.lg = lg;
        true
    }

    /// Raise an arm's usage of a location to `lg`, widening the location
    /// first when it is smaller.
    fn expand_usage(&mut self, arm: usize, index: usize, lg: u8, new_holes: bool) -> bool {
        let union = self.arms[arm].union;
        if lg > self.unions[union].data[index].lg && !self.expand_location(union, index, lg) {
            return false;
        }
        let usage = &mut self.arms[arm].data_usage[index];
        if let (true, Some(used)) = (new_holes, usage.used) {
            usage.holes.add_holes_at_end(used, 1, lg);
        }
        usage.used = Some(lg);
        true
    }

    /// Grow the field of size `lg` at `offset` within `region` to
    /// `lg + factor` without moving it.
    fn try_expand_data(&mut self, region: Region, lg: u8, offset: u32, factor: u8) -> bool {
        let arm = match region {
            Region::Top => return self.holes.try_expand(lg, offset, factor),
            Region::Arm(arm) => arm,
        };
        let fits = lg + factor <= WORD_LG && offset & ((1 << factor) - 1) == 0;
        let union = self.arms[arm].union;
        for index in 0..self.arms[arm].data_usage.len() {
            let location = self.unions[union].data[index];
            if location.lg < lg || offset >> (location.lg - lg) != location.offset {
                continue;
            }
            if !fits {
                return false;
            }
            let local = offset - (location.offset << (location.lg - lg));
            let usage = &self.arms[arm].data_usage[index];
            return if local == 0 && usage.used == Some(lg) {
                self.expand_usage(arm, index, lg + factor, false)
            } else {
                self.arms[arm].data_usage[index]
                    .holes
                    .try_expand(lg, local, factor)
            };
        }
        false
    }

    fn add_pointer(&mut self, region: Region) -> u32 {
        match region {
            Region::Top => {
                self.pointer_count += 1;
                self.pointer_count - 1
            }
            Region::Arm(arm) => {
                self.add_member(arm);
                let union = self.arms[arm].union;
                let used = self.arms[arm].pointers_used;
                self.arms[arm].pointers_used += 1;
                if let Some(&index) = self.unions[union].pointers.get(used) {
                    return index;
                }
                let parent = self.unions[union].parent;
                let index = self.add_pointer(parent);
                self.unions[union].pointers.push(index);
                index
            }
        }
    }

    /// A void member still claims its arm, and every arm enclosing it.
    fn add_void(&mut self, region: Region) {
        if let Region::Arm(arm) = region {
            self.add_member(arm);
            let parent = self.unions[self.arms[arm].union].parent;
            self.add_void(parent);
        }
    }

    /// The first member of an arm fixes its discriminant value.
    fn add_member(&mut self, arm: usize) {
        if self.arms[arm].discriminant.is_some() {
            return;
        }
        let union = self.arms[arm].union;
        let value = self.unions[union].arms_with_members;
        self.unions[union].arms_with_members += 1;
        self.arms[arm].discriminant = Some(value);
        if value == 1 {
            self.add_discriminant(union);
        }
    }

    fn add_discriminant(&mut self, union: usize) {
        if self.unions[union].discriminant_offset.is_some() {
            return;
        }
        let parent = self.unions[union].parent;
        let offset = self.add_data(parent, 4);
        self.unions[union].discriminant_offset = Some(offset);
    }

    /// Arms that never received a member take the remaining
    /// discriminants in code order.
    fn finish(&mut self, arms_in_code_order: &[usize]) {
        for &arm in arms_in_code_order {
            self.add_member(arm);
        }
        for union in 0..self.unions.len() {
            self.add_discriminant(union);
        }
    }
}

/// Computed layouts, keyed by scope and member code order.
#[derive(Debug, Default)]
pub(crate) struct Layouts {
    /// Data words and pointer count; groups get their top struct's.
    pub sizes: FxHashMap<ScopeIdx, (u32, u32)>,
    pub slots: FxHashMap<(ScopeIdx, u16), SlotLocation>,
    pub discriminants: FxHashMap<(ScopeIdx, u16), u16>,
    /// Arm count and discriminant offset of a scope's union.
    pub unions: FxHashMap<ScopeIdx, (u16, u32)>,
}

pub(crate) fn compute(
    table: &DeclTable<'_>,
    types: &FxHashMap<(ScopeIdx, u16), TypeRef>,
) -> Result<Layouts, CompileError> {
    let mut layouts = Layouts::default();
    for (index, scope) in table.scopes.iter().enumerate() {
        if matches!(scope.kind, ScopeKind::Struct | ScopeKind::Params) {
            lay_out(table, types, index, &mut layouts)?;
        }
    }
    Ok(layouts)
}

struct Item<'a> {
    ordinal: u16,
    scope: ScopeIdx,
    member: u16,
    region: Region,
    name: &'a str,
    span: capn_ir::Span,
}

struct Collector<'t, 'a> {
    table: &'t DeclTable<'a>,
    alloc: Allocator,
    items: Vec<Item<'a>>,
    /// `(scope, member, arm)` in code order.
    arms: Vec<(ScopeIdx, u16, usize)>,
    unions: Vec<(ScopeIdx, usize)>,
    groups: Vec<ScopeIdx>,
}

impl<'a> Collector<'_, 'a> {
    fn collect(&mut self, scope: ScopeIdx, region: Region) -> Result<(), CompileError> {
        let table = self.table;
        let s = &table.scopes[scope];
        let union = if s.has_union() {
            let union = self.alloc.new_union(region);
            self.unions.push((scope, union));
            Some(union)
        } else {
            None
        };

        for (index, member) in s.members.iter().enumerate() {
            let code_order = u16::try_from(index).map_err(|_| self.overflow(scope))?;
            let member_region = match union {
                Some(union) if member.in_union => {
                    let arm = self.alloc.new_arm(union);
                    self.arms.push((scope, code_order, arm));
                    Region::Arm(arm)
                }
                _ => region,
            };
            match member.source {
                MemberSource::Group(group) => {
                    self.groups.push(group);
                    self.collect(group, member_region)?;
                }
                MemberSource::Slot(_) | MemberSource::Param { .. } => {
                    let ordinal = member.ordinal().ok_or_else(|| self.overflow(scope))?;
                    self.items.push(Item {
                        ordinal,
                        scope,
                        member: code_order,
                        region: member_region,
                        name: member.name,
                        span: member.span,
                    });
                }
            }
        }
        Ok(())
    }

    fn overflow(&self, scope: ScopeIdx) -> CompileError {
        CompileError::Layout {
            problem: crate::LayoutProblem::Ordinals,
            message: "too many members".to_string(),
            location: self.table.location_of(scope),
        }
    }
}

fn lay_out(
    table: &DeclTable<'_>,
    types: &FxHashMap<(ScopeIdx, u16), TypeRef>,
    root: ScopeIdx,
    layouts: &mut Layouts,
) -> Result<(), CompileError> {
    let mut collector = Collector {
        table,
        alloc: Allocator::default(),
        items: Vec::new(),
        arms: Vec::new(),
        unions: Vec::new(),
        groups: vec![root],
    };
    collector.collect(root, Region::Top)?;

    // Ordinals span the whole struct, groups included.
    let mut ordinals: Vec<(u32, &str, capn_ir::Span)> = collector
        .items
        .iter()
        .map(|item| (u32::from(item.ordinal), item.name, item.span))
        .collect();
    table.check_ordinals(root, &mut ordinals)?;

    let Collector {
        mut alloc,
        mut items,
        arms,
        unions,
        groups,
        ..
    } = collector;
    items.sort_by_key(|item| item.ordinal);

    for item in &items {
        let ty = types.get(&(item.scope, item.member)).ok_or_else(|| CompileError::InvalidType {
            message: format!("field `{}` has no type", item.name),
            location: table.locate(item.scope, item.span),
        })?;
        let location = match ty.size() {
            FieldSize::Void => {
                alloc.add_void(item.region);
                SlotLocation::None
            }
            FieldSize::Data { lg } => {
                let offset = alloc.add_data(item.region, lg);
                SlotLocation::Data {
                    bit_offset: offset << lg,
                    bit_width: 1 << lg,
                }
            }
            FieldSize::Pointer => SlotLocation::Pointer {
                index: alloc.add_pointer(item.region),
            },
        };
        layouts.slots.insert((item.scope, item.member), location);
    }

    let arm_order: Vec<usize> = arms.iter().map(|&(_, _, arm)| arm).collect();
    alloc.finish(&arm_order);

    for &(scope, member, arm) in &arms {
        let value = alloc.arms[arm].discriminant.unwrap_or_default();
        layouts.discriminants.insert((scope, member), value);
    }
    for &(scope, union) in &unions {
        let state = &alloc.unions[union];
        layouts.unions.insert(
            scope,
            (state.arms_with_members, state.discriminant_offset.unwrap_or_default()),
        );
    }
    for group in groups {
        layouts.sizes.insert(group, (alloc.data_words, alloc.pointer_count));
    }
    tracing::trace!(
        name = %table.scopes[root].display_name,
        data_words = alloc.data_words,
        pointers = alloc.pointer_count,
        "laid out"
    );
    Ok(())
}

#[cfg(test)]
mod tests;
