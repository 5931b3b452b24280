//! Configuration for the pool allocator, arena and parser
//!
//! All structs derive `serde` so a deployment can keep them in the same
//! document as the rest of its settings. Missing fields fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};

/// Default number of chunks pre-allocated by a pool
pub const DEFAULT_POOL_CHUNKS: usize = 100;

/// Default size in bytes of one pool chunk
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Default upper bound for a single oversized arena allocation
pub const DEFAULT_MAX_OVERSIZED: usize = 16 * 1024 * 1024; // 16MB

/// Pool allocator and arena growth settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of chunks carved out of the pool slab
    pub chunks: usize,
    /// Size of every chunk in bytes
    pub chunk_size: usize,
    /// Largest single value the arena will place in a standalone allocation
    pub max_oversized: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            chunks: DEFAULT_POOL_CHUNKS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_oversized: DEFAULT_MAX_OVERSIZED,
        }
    }
}

impl PoolConfig {
    /// Config with the given chunk layout and the default oversized limit
    pub fn new(chunks: usize, chunk_size: usize) -> Self {
        Self {
            chunks,
            chunk_size,
            ..Self::default()
        }
    }

    /// Total bytes reserved by the pool slab, if it does not overflow
    pub fn slab_size(&self) -> Option<usize> {
        self.chunks.checked_mul(self.chunk_size)
    }
}

/// Parser settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Maximum container nesting; `None` leaves nesting unbounded
    pub max_depth: Option<usize>,
}

impl ParseConfig {
    /// Config that rejects documents nested deeper than `max_depth`
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
        }
    }
}

/// Umbrella configuration for the whole engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pool and arena settings
    pub pool: PoolConfig,
    /// Parser settings
    pub parse: ParseConfig,
}
