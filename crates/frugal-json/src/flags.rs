//! Bit-flag helpers shared by the document tree

use bitflags::Flags;

bitflags::bitflags! {
    /// Per-node and per-child-list properties
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[repr(transparent)]
    pub struct NodeFlags: u8 {
        /// Node carries a key (child of an object)
        const HAS_KEY = 0b0000_0010;
        /// Object children are ordered by key
        const SORTED  = 0b0000_0100;
    }
}

/// True when every bit of `mask` is present in `flags`
#[inline]
pub fn is_set<F: Flags + Copy>(flags: F, mask: F) -> bool {
    flags.contains(mask)
}

/// Set or clear `mask` in `flags`
#[inline]
pub fn set<F: Flags>(flags: &mut F, mask: F, on: bool) {
    flags.set(mask, on);
}
