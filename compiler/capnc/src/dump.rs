//! Indented rendering of a whole schema tree.

use std::fmt::Write;

use capn_reflect::{Reflect, ReflectError};

/// One line per reachable child, indented by depth, each showing
/// [`describe`](Reflect::describe).
///
/// ```text
/// file shop.capnp @0x9eb32e19f86ee174
///   struct Order @0xd5b1a0c4e1a7c3f2
///     id @0 :UInt64
/// ```
pub fn dump(root: &dyn Reflect) -> Result<String, ReflectError> {
    let mut out = String::new();
    write_tree(root, 0, &mut out)?;
    Ok(out)
}

fn write_tree(item: &dyn Reflect, depth: usize, out: &mut String) -> Result<(), ReflectError> {
    let _ = writeln!(out, "{:indent$}{}", "", item.describe(), indent = depth * 2);
    for name in item.children() {
        let child = item.resolve_child(&name)?;
        write_tree(&child, depth + 1, out)?;
    }
    Ok(())
}
