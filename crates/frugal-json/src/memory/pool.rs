//! Fixed-size chunk pool with heap fallback
//!
//! The pool carves one contiguous slab into `size` chunks of `subsize` bytes.
//! Free chunks live in a bounded lock-free ring, so concurrent `allocate`
//! calls never receive the same chunk and no caller ever blocks. When the
//! ring is empty the pool hands out a heap chunk of the same size instead;
//! such chunks are freed, not recycled, when they come back.

use super::Fill;
use crate::{
    config::PoolConfig,
    error::{Error, Result},
};
use crossbeam::queue::ArrayQueue;
use once_cell::sync::OnceCell;
use std::{
    alloc::{self, Layout},
    fmt,
    ops::Range,
    ptr::{self, NonNull},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering},
    },
};
use tracing::{debug, info, trace, warn};

/// Slab alignment, enough for cache-line aligned chunk starts
const SLAB_ALIGNMENT: usize = 64;

static DEFAULT_POOL: OnceCell<Arc<PoolAllocator>> = OnceCell::new();

/// Process-wide pool used by arenas created without an explicit pool
pub fn default_pool() -> Result<Arc<PoolAllocator>> {
    DEFAULT_POOL
        .get_or_try_init(|| PoolAllocator::with_config(&PoolConfig::default()))
        .cloned()
}

/// Pre-allocated pool of equally sized chunks
pub struct PoolAllocator {
    slab: NonNull<u8>,
    layout: Layout,
    size: usize,
    subsize: usize,
    free: ArrayQueue<usize>,
    available: AtomicI64,
    issued: AtomicU64,
    returned: AtomicU64,
    heap_allocations: AtomicU64,
    heap_frees: AtomicU64,
}

// SAFETY: the slab is only read or written through `Chunk`s, each owning a
// disjoint `subsize` region handed out by the lock-free ring. All other
// state is atomic.
unsafe impl Send for PoolAllocator {}
unsafe impl Sync for PoolAllocator {}

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of chunks in the slab
    pub size: usize,
    /// Bytes per chunk
    pub subsize: usize,
    /// Slab chunks currently free
    pub available: i64,
    /// Slab chunks handed out since creation
    pub issued: u64,
    /// Slab chunks returned since creation
    pub returned: u64,
    /// Heap chunks handed out because the slab was exhausted
    pub heap_allocations: u64,
    /// Heap chunks freed on return
    pub heap_frees: u64,
}

impl PoolAllocator {
    /// Pre-allocate `size` chunks of `subsize` bytes each
    pub fn new(size: usize, subsize: usize) -> Result<Arc<Self>> {
        if size == 0 || subsize == 0 {
            return Err(Error::memory(format!(
                "pool needs a non-zero layout, got {size} chunks of {subsize} bytes"
            )));
        }
        let total = size.checked_mul(subsize).ok_or_else(|| {
            Error::memory(format!("pool of {size} x {subsize} bytes overflows usize"))
        })?;
        let layout = Layout::from_size_align(total, SLAB_ALIGNMENT)
            .map_err(|e| Error::memory(e.to_string()))?;

        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let slab = NonNull::new(raw)
            .ok_or_else(|| Error::memory(format!("slab allocation of {total} bytes failed")))?;

        let free = ArrayQueue::new(size);
        for index in 0..size {
            // Capacity equals `size`, so every push fits.
            let _ = free.push(index * subsize);
        }

        info!(size, subsize, "pool allocator initialized");

        Ok(Arc::new(Self {
            slab,
            layout,
            size,
            subsize,
            free,
            available: AtomicI64::new(size as i64),
            issued: AtomicU64::new(0),
            returned: AtomicU64::new(0),
            heap_allocations: AtomicU64::new(0),
            heap_frees: AtomicU64::new(0),
        }))
    }

    /// Create a pool from configuration
    pub fn with_config(config: &PoolConfig) -> Result<Arc<Self>> {
        Self::new(config.chunks, config.chunk_size)
    }

    /// Take a chunk from the slab, or from the heap once the slab is exhausted
    pub fn allocate(self: &Arc<Self>) -> Chunk {
        if self.available.fetch_sub(1, Ordering::AcqRel) > 0 {
            if let Some(offset) = self.free.pop() {
                self.issued.fetch_add(1, Ordering::Relaxed);
                trace!(offset, "allocating from pool");
                // SAFETY: offsets in the ring are multiples of `subsize`
                // strictly below `size * subsize`, i.e. inside the slab.
                let ptr = unsafe { self.slab.add(offset) };
                return Chunk::from_raw(ptr, self.subsize, Some(Arc::clone(self)));
            }
        }
        self.available.fetch_add(1, Ordering::AcqRel);
        self.heap_allocations.fetch_add(1, Ordering::Relaxed);
        debug!(subsize = self.subsize, "pool exhausted, allocating chunk from heap");
        Chunk::boxed(
            vec![0u8; self.subsize].into_boxed_slice(),
            Some(Arc::clone(self)),
        )
    }

    /// Same as [`allocate`](Self::allocate) but ready for shared ownership
    pub fn allocate_shared(self: &Arc<Self>) -> Arc<Chunk> {
        Arc::new(self.allocate())
    }

    /// Give a chunk back; slab chunks are recycled, heap chunks are freed
    pub fn deallocate(&self, chunk: Chunk) {
        drop(chunk);
    }

    /// Whether `ptr` points into the slab
    pub fn contains(&self, ptr: *const u8) -> bool {
        let addr = ptr as usize;
        addr >= self.start() as usize && addr < self.end() as usize
    }

    /// First byte of the slab
    pub fn start(&self) -> *const u8 {
        self.slab.as_ptr()
    }

    /// One past the last byte of the slab
    pub fn end(&self) -> *const u8 {
        self.start().wrapping_add(self.layout.size())
    }

    /// Number of chunks in the slab
    pub fn size(&self) -> usize {
        self.size
    }

    /// Bytes per chunk
    pub fn subsize(&self) -> usize {
        self.subsize
    }

    /// Slab chunks currently free
    pub fn available(&self) -> i64 {
        self.available.load(Ordering::Acquire)
    }

    /// Counter snapshot
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.size,
            subsize: self.subsize,
            available: self.available(),
            issued: self.issued.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            heap_allocations: self.heap_allocations.load(Ordering::Relaxed),
            heap_frees: self.heap_frees.load(Ordering::Relaxed),
        }
    }

    fn release(&self, ptr: NonNull<u8>, len: usize) {
        if self.contains(ptr.as_ptr()) {
            let offset = ptr.as_ptr() as usize - self.start() as usize;
            trace!(offset, "deallocating to pool");
            if self.free.push(offset).is_err() {
                // Only reachable if a foreign pointer aliased the slab.
                warn!(offset, "free ring full, chunk leaked back to slab");
                return;
            }
            self.returned.fetch_add(1, Ordering::Relaxed);
            self.available.fetch_add(1, Ordering::AcqRel);
        } else {
            trace!(len, "deallocating from heap");
            self.heap_frees.fetch_add(1, Ordering::Relaxed);
            // SAFETY: chunks outside the slab were produced by `Chunk::boxed`.
            unsafe { free_boxed(ptr, len) };
        }
    }
}

impl Drop for PoolAllocator {
    fn drop(&mut self) {
        debug!(size = self.size, subsize = self.subsize, "releasing pool slab");
        // SAFETY: allocated in `new` with this exact layout; every chunk holds
        // an `Arc` to the pool, so none can outlive the slab.
        unsafe { alloc::dealloc(self.slab.as_ptr(), self.layout) };
    }
}

impl fmt::Debug for PoolAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("start", &self.start())
            .field("size", &self.size)
            .field("subsize", &self.subsize)
            .field("available", &self.available())
            .finish()
    }
}

/// One owned memory region, from a pool slab or the heap
///
/// A chunk tracks how many leading bytes have been committed. Committed bytes
/// are immutable: writes only ever land at or past the commit mark, and
/// [`read`](Self::read) never exposes bytes beyond it. Dropping a pool chunk
/// returns it to its pool.
pub struct Chunk {
    ptr: NonNull<u8>,
    len: usize,
    filled: AtomicUsize,
    writing: AtomicBool,
    pool: Option<Arc<PoolAllocator>>,
}

// SAFETY: the region is exclusively owned by the chunk. Mutation happens only
// inside `write_with`, serialized by `writing` and confined to bytes past the
// commit mark that no reader can observe.
unsafe impl Send for Chunk {}
unsafe impl Sync for Chunk {}

impl Chunk {
    fn from_raw(ptr: NonNull<u8>, len: usize, pool: Option<Arc<PoolAllocator>>) -> Self {
        Self {
            ptr,
            len,
            filled: AtomicUsize::new(0),
            writing: AtomicBool::new(false),
            pool,
        }
    }

    fn boxed(bytes: Box<[u8]>, pool: Option<Arc<PoolAllocator>>) -> Self {
        let len = bytes.len();
        let ptr = NonNull::from(Box::leak(bytes)).cast::<u8>();
        Self::from_raw(ptr, len, pool)
    }

    /// Standalone zeroed heap chunk, not associated with any pool
    pub fn heap(len: usize) -> Self {
        Self::boxed(vec![0u8; len].into_boxed_slice(), None)
    }

    /// Adopt an owned byte container; all of its bytes count as committed
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let chunk = Self::boxed(bytes.into_boxed_slice(), None);
        chunk.filled.store(chunk.len, Ordering::Release);
        chunk
    }

    /// Size of the region in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for zero-length regions
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of the first byte
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Number of leading bytes that have been committed
    pub fn filled(&self) -> usize {
        self.filled.load(Ordering::Acquire)
    }

    /// Whether this chunk lives inside its pool's slab
    pub fn is_pooled(&self) -> bool {
        self.pool
            .as_ref()
            .is_some_and(|pool| pool.contains(self.as_ptr()))
    }

    /// Committed bytes within `range`; the range is clamped to the commit mark
    pub fn read(&self, range: Range<usize>) -> &[u8] {
        let end = range.end.min(self.filled());
        let start = range.start.min(end);
        // SAFETY: `[start, end)` is inside the region and below the commit
        // mark, so no writer can hold a mutable view of it.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr().add(start), end - start) }
    }

    /// Fill `[at, limit)` through `fill` and commit what it reports written
    ///
    /// Refuses with [`Fill::Invalid`] when the range is out of bounds, starts
    /// below the commit mark, or another write is in flight.
    pub(crate) fn write_with<F>(&self, at: usize, limit: usize, fill: F) -> Fill
    where
        F: FnOnce(&mut [u8]) -> Fill,
    {
        if at > limit || limit > self.len {
            return Fill::Invalid;
        }
        if self
            .writing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Fill::Invalid;
        }
        if at < self.filled() {
            self.writing.store(false, Ordering::Release);
            return Fill::Invalid;
        }

        // SAFETY: `[at, limit)` is in bounds, at or past the commit mark (so
        // unreadable), and `writing` guarantees this is the only mutable view.
        let dst = unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr().add(at), limit - at) };
        let capacity = dst.len();
        let outcome = match fill(dst) {
            Fill::Written(n) if n > capacity => Fill::Invalid,
            other => other,
        };
        if let Fill::Written(n) = outcome {
            self.filled.store(at + n, Ordering::Release);
        }
        self.writing.store(false, Ordering::Release);
        outcome
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        match self.pool.take() {
            Some(pool) => pool.release(self.ptr, self.len),
            // SAFETY: chunks without a pool are always created by `boxed`.
            None => unsafe { free_boxed(self.ptr, self.len) },
        }
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("ptr", &self.as_ptr())
            .field("len", &self.len)
            .field("filled", &self.filled())
            .field("pooled", &self.is_pooled())
            .finish()
    }
}

/// Free a region produced by `Box::leak` in [`Chunk::boxed`]
///
/// # Safety
///
/// `ptr`/`len` must describe a leaked `Box<[u8]>` that has not been freed.
unsafe fn free_boxed(ptr: NonNull<u8>, len: usize) {
    let slice = ptr::slice_from_raw_parts_mut(ptr.as_ptr(), len);
    // SAFETY: guaranteed by the caller.
    drop(unsafe { Box::from_raw(slice) });
}
