//! Memory layer: pool allocator, cursor buffers, buffer chains and the arena
//!
//! Everything the document tree allocates flows through this module. A
//! [`PoolAllocator`] hands out fixed-size [`Chunk`]s, a [`SharedBuffer`]
//! pairs a chunk with [`CursorBuffer`] marks, a [`BufferChain`] strings
//! buffers together and an [`Arena`] uses a chain to store encoded values.

pub mod arena;
pub mod buffer;
pub mod chain;
pub mod pool;
pub mod shared;

pub use arena::{Arena, ArenaStats, SharedArena};
pub use buffer::CursorBuffer;
pub use chain::{BufferChain, ChainWriter};
pub use pool::{Chunk, PoolAllocator, PoolStats, default_pool};
pub use shared::{ArenaSlice, SharedBuffer};

/// Outcome of filling a memory region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// This many bytes were written at the start of the region
    Written(usize),
    /// The region is too small; the value needs this many bytes
    NeedsRoom(usize),
    /// The value cannot be written at all
    Invalid,
}

impl Fill {
    /// Bytes written, if any
    pub fn written(self) -> Option<usize> {
        match self {
            Fill::Written(n) => Some(n),
            _ => None,
        }
    }
}
