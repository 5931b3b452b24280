//! Per-document value storage
//!
//! An arena owns a [`BufferChain`] of pool chunks and encodes values into
//! its back buffer. Values larger than a chunk get a dedicated heap buffer
//! so the chain keeps its fixed segment size. Written values are handed out
//! as [`ArenaSlice`]s which keep their chunk alive on their own.

use super::{ArenaSlice, BufferChain, Fill, PoolAllocator, SharedBuffer, default_pool};
use crate::{
    config::{DEFAULT_MAX_OVERSIZED, PoolConfig},
    document::Encode,
    error::{Error, Result},
};
use std::{cell::RefCell, rc::Rc, sync::Arc};
use tracing::{debug, trace, warn};

/// Arena shared by every node of one document tree
pub type SharedArena = Rc<RefCell<Arena>>;

/// Counters describing what an arena has stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Buffers currently in the chain
    pub segments: usize,
    /// Standalone buffers for values larger than a chunk
    pub oversized: usize,
    /// Encoded bytes handed out since creation
    pub bytes_written: usize,
}

/// Value storage backed by a pool
#[derive(Debug)]
pub struct Arena {
    pool: Option<Arc<PoolAllocator>>,
    max_oversized: usize,
    chain: BufferChain,
    oversized: Vec<SharedBuffer>,
    bytes_written: usize,
}

impl Default for Arena {
    /// Arena that resolves the process-wide default pool on first write
    fn default() -> Self {
        Self {
            pool: None,
            max_oversized: DEFAULT_MAX_OVERSIZED,
            chain: BufferChain::new(),
            oversized: Vec::new(),
            bytes_written: 0,
        }
    }
}

impl Arena {
    /// Arena drawing chunks from `pool`
    pub fn new(pool: Arc<PoolAllocator>) -> Self {
        Self {
            pool: Some(pool),
            ..Self::default()
        }
    }

    /// Arena over a private pool built from `config`
    pub fn with_config(config: &PoolConfig) -> Result<Self> {
        Ok(Self {
            pool: Some(PoolAllocator::with_config(config)?),
            max_oversized: config.max_oversized,
            ..Self::default()
        })
    }

    /// Wrap for sharing between the nodes of a tree
    pub fn shared(self) -> SharedArena {
        Rc::new(RefCell::new(self))
    }

    /// Shared arena over the default pool
    pub fn shared_default() -> SharedArena {
        Self::default().shared()
    }

    /// Pool backing this arena, resolving the default pool if needed
    pub fn pool(&mut self) -> Option<Arc<PoolAllocator>> {
        if self.pool.is_none() {
            match default_pool() {
                Ok(pool) => self.pool = Some(pool),
                Err(err) => warn!(%err, "default pool unavailable"),
            }
        }
        self.pool.clone()
    }

    pub fn chain(&self) -> &BufferChain {
        &self.chain
    }

    pub fn oversized(&self) -> &[SharedBuffer] {
        &self.oversized
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            segments: self.chain.len(),
            oversized: self.oversized.len(),
            bytes_written: self.bytes_written,
        }
    }

    /// Encode `value` into arena memory
    ///
    /// Returns `None` when the value cannot be encoded, no pool is available
    /// or the value exceeds the oversized limit.
    pub fn write(&mut self, value: &dyn Encode) -> Option<ArenaSlice> {
        match self.try_write(value) {
            Ok(slice) => Some(slice),
            Err(err) => {
                debug!(%err, "arena write refused");
                None
            }
        }
    }

    /// Encode `value` into arena memory, reporting why a write was refused
    ///
    /// Values with no JSON form (non-finite floats) fail with
    /// [`Error::Buffer`]. A missing pool or a value above the oversized
    /// limit fails with [`Error::Memory`].
    pub fn try_write(&mut self, value: &dyn Encode) -> Result<ArenaSlice> {
        let pool = self
            .pool()
            .ok_or_else(|| Error::memory("no pool available"))?;
        if self.chain.is_empty() {
            self.chain.push(SharedBuffer::from_chunk(pool.allocate(), 0));
        }

        let required = match self.back()?.write_value(value) {
            Ok(slice) => return Ok(self.record(slice)),
            Err(Fill::NeedsRoom(required)) => required,
            Err(_) => return Err(Error::buffer("value has no JSON encoding")),
        };

        let target = if required > pool.subsize() {
            if required > self.max_oversized {
                warn!(required, limit = self.max_oversized, "value exceeds oversized limit");
                return Err(Error::memory(format!(
                    "{required} bytes exceeds the oversized limit of {}",
                    self.max_oversized
                )));
            }
            debug!(required, "value larger than a chunk, allocating oversized buffer");
            self.oversized.push(SharedBuffer::heap(required));
            self.oversized
                .last_mut()
                .ok_or_else(|| Error::buffer("oversized buffer missing"))?
        } else {
            trace!(segments = self.chain.len(), "back buffer full, growing chain");
            self.chain.push(SharedBuffer::from_chunk(pool.allocate(), 0));
            self.back()?
        };

        match target.write_value(value) {
            Ok(slice) => Ok(self.record(slice)),
            Err(_) => Err(Error::buffer(format!(
                "{required} bytes did not fit a fresh buffer"
            ))),
        }
    }

    /// Release every chain buffer except the last
    ///
    /// Slices already handed out stay valid; their chunks go back to the
    /// pool once the slices are dropped.
    pub fn flush(&mut self) {
        self.chain.flush();
        self.oversized.clear();
    }

    fn back(&mut self) -> Result<&mut SharedBuffer> {
        self.chain
            .back_shared_buffer_mut()
            .ok_or_else(|| Error::buffer("chain has no back buffer"))
    }

    fn record(&mut self, slice: ArenaSlice) -> ArenaSlice {
        self.bytes_written += slice.len();
        slice
    }
}
