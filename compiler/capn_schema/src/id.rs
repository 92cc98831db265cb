//! Derived node ids.
//!
//! Every derivation hashes with SHA-256, takes the first eight bytes as a
//! little-endian integer and sets bit 63 so derived ids can never collide
//! with the "no id" value and always pass the explicit-id check. The hash
//! input starts with a tag byte naming the derivation, so a child named
//! by two bytes never hashes like a group index.

use sha2::{Digest, Sha256};

/// Bit every valid id carries.
pub const ID_HIGH_BIT: u64 = 1 << 63;

const FILE_TAG: u8 = 0;
const CHILD_TAG: u8 = 1;
const GROUP_TAG: u8 = 2;
const PARAMS_TAG: u8 = 3;

fn start(tag: u8, parent: u64) -> Sha256 {
    let mut hasher = Sha256::new();
    hasher.update([tag]);
    hasher.update(parent.to_le_bytes());
    hasher
}

fn finish(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes) | ID_HIGH_BIT
}

/// Id of a file declared without `@0x...;`.
pub fn file_id(display_name: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update([FILE_TAG]);
    hasher.update(display_name.as_bytes());
    finish(hasher)
}

/// Id of a named declaration nested in `parent`.
pub fn child_id(parent: u64, name: &str) -> u64 {
    let mut hasher = start(CHILD_TAG, parent);
    hasher.update(name.as_bytes());
    finish(hasher)
}

/// Id of a group or named union, keyed by its code-order index in `parent`.
pub fn group_id(parent: u64, index: u16) -> u64 {
    let mut hasher = start(GROUP_TAG, parent);
    hasher.update(index.to_le_bytes());
    finish(hasher)
}

/// Id of the struct generated for a method's inline parameter or result list.
pub fn method_param_id(interface: u64, ordinal: u16, is_results: bool) -> u64 {
    let mut hasher = start(PARAMS_TAG, interface);
    hasher.update(ordinal.to_le_bytes());
    hasher.update([u8::from(is_results)]);
    finish(hasher)
}

#[cfg(test)]
mod tests;
