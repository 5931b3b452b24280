//! Reference-counted buffers over pool or heap chunks

use super::{Chunk, CursorBuffer, Fill};
use crate::document::Encode;
use std::{
    fmt,
    ops::{Deref, Range},
    sync::Arc,
};

/// Cursor marks plus shared ownership of the memory they describe
///
/// Cloning shares the memory and copies the marks. The memory is released
/// once the last `SharedBuffer` and the last [`ArenaSlice`] into it are gone.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    buffer: CursorBuffer,
    memory: Option<Arc<Chunk>>,
}

impl SharedBuffer {
    /// Adopt a chunk whose first `amount_read` bytes already hold data
    pub fn from_chunk(chunk: Chunk, amount_read: usize) -> Self {
        Self::from_shared_chunk(Arc::new(chunk), amount_read)
    }

    /// Share an existing chunk; cursors cover the whole chunk
    pub fn from_shared_chunk(memory: Arc<Chunk>, amount_read: usize) -> Self {
        let len = memory.len();
        let read = amount_read.min(len);
        Self {
            buffer: CursorBuffer::with_cursors(len, 0, len, read, read),
            memory: Some(memory),
        }
    }

    /// Fresh zeroed heap memory of `len` bytes
    pub fn heap(len: usize) -> Self {
        Self::from_chunk(Chunk::heap(len), 0)
    }

    /// Adopt owned bytes; all of them count as scanned data
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self::from_chunk(Chunk::from_vec(bytes), len)
    }

    /// Share `other`'s memory under different marks
    pub fn with_cursor(other: &SharedBuffer, buffer: CursorBuffer) -> Self {
        Self {
            buffer,
            memory: other.memory.clone(),
        }
    }

    pub fn buffer(&self) -> &CursorBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut CursorBuffer {
        &mut self.buffer
    }

    /// Handle to the underlying memory
    pub fn underlying_memory(&self) -> Option<Arc<Chunk>> {
        self.memory.clone()
    }

    /// Drop this buffer's hold on its memory
    pub fn reset_underlying_memory(&mut self) {
        self.memory = None;
    }

    /// Number of owners of the underlying memory, 0 when detached
    pub fn ref_count(&self) -> usize {
        self.memory.as_ref().map_or(0, Arc::strong_count)
    }

    /// Committed bytes in `range`
    pub fn bytes(&self, range: Range<usize>) -> &[u8] {
        match &self.memory {
            Some(memory) => memory.read(range),
            None => &[],
        }
    }

    /// `[begin, get)`
    pub fn scanned(&self) -> &[u8] {
        self.bytes(self.buffer.scanned_range())
    }

    /// `[get, put)`
    pub fn not_scanned(&self) -> &[u8] {
        self.bytes(self.buffer.not_scanned_range())
    }

    /// `[data, get)`
    pub fn data(&self) -> &[u8] {
        self.bytes(self.buffer.data_range())
    }

    /// Copy the not-yet-scanned bytes into `dst` and collapse `put`/`end`
    /// onto `get`; returns the number of bytes copied
    pub fn relocate_not_scanned(&mut self, dst: &mut [u8]) -> usize {
        let copied = {
            let src = self.not_scanned();
            let n = src.len().min(dst.len());
            dst[..n].copy_from_slice(&src[..n]);
            n
        };
        self.buffer.collapse_to_get();
        copied
    }

    /// Encode `value` into `[put, end)`, then advance `put` and `get` past it
    ///
    /// On success the returned slice covers exactly the written bytes. On
    /// failure the marks are untouched and the reason is handed back.
    pub fn write_value(&mut self, value: &dyn Encode) -> Result<ArenaSlice, Fill> {
        let Some(memory) = &self.memory else {
            return Err(Fill::Invalid);
        };
        let at = self.buffer.put();
        match memory.write_with(at, self.buffer.end(), |dst| value.encode(dst)) {
            Fill::Written(n) => {
                let slice = ArenaSlice::new(Arc::clone(memory), at..at + n);
                self.buffer.putx(n);
                self.buffer.getx(n);
                Ok(slice)
            }
            other => Err(other),
        }
    }

    /// Append as much of `data` as fits; returns the number of bytes taken
    pub fn write_bytes(&mut self, data: &[u8]) -> usize {
        let Some(memory) = &self.memory else {
            return 0;
        };
        let outcome = memory.write_with(self.buffer.put(), self.buffer.end(), |dst| {
            let n = dst.len().min(data.len());
            dst[..n].copy_from_slice(&data[..n]);
            Fill::Written(n)
        });
        match outcome {
            Fill::Written(n) => {
                self.buffer.putx(n);
                self.buffer.getx(n);
                n
            }
            _ => 0,
        }
    }
}

impl fmt::Display for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "refs: {}", self.ref_count())?;
        write!(f, "{}", self.buffer)
    }
}

/// Immutable view of bytes written into shared memory
///
/// Holds the memory alive, so a slice stays valid after the buffer chain
/// that produced it has been flushed or dropped.
#[derive(Clone)]
pub struct ArenaSlice {
    memory: Arc<Chunk>,
    start: usize,
    end: usize,
}

impl ArenaSlice {
    pub(crate) fn new(memory: Arc<Chunk>, range: Range<usize>) -> Self {
        Self {
            memory,
            start: range.start,
            end: range.end,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.memory.read(self.start..self.end)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Memory this slice points into
    pub fn memory(&self) -> &Arc<Chunk> {
        &self.memory
    }
}

impl Deref for ArenaSlice {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for ArenaSlice {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for ArenaSlice {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ArenaSlice {}

impl fmt::Debug for ArenaSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArenaSlice")
            .field(&String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}
