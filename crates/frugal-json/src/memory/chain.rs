//! Ordered sequence of shared buffers
//!
//! A chain grows by appending buffers; it never moves bytes between them.
//! [`ChainWriter`] adapts a chain to [`std::io::Write`], pulling fresh pool
//! chunks as the back buffer fills up.

use super::{CursorBuffer, PoolAllocator, SharedBuffer};
use crate::error::Error;
use bytes::Bytes;
use std::{fmt, io, sync::Arc};
use tracing::trace;

/// Growable list of [`SharedBuffer`]s
#[derive(Debug, Clone, Default)]
pub struct BufferChain {
    buffers: Vec<SharedBuffer>,
}

impl BufferChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain starting with `beginning`
    pub fn from_shared(beginning: SharedBuffer) -> Self {
        Self {
            buffers: vec![beginning],
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn push(&mut self, buffer: SharedBuffer) {
        self.buffers.push(buffer);
    }

    pub fn shared_buffers(&self) -> &[SharedBuffer] {
        &self.buffers
    }

    pub fn shared_buffers_mut(&mut self) -> &mut Vec<SharedBuffer> {
        &mut self.buffers
    }

    pub fn back_shared_buffer(&self) -> Option<&SharedBuffer> {
        self.buffers.last()
    }

    pub fn back_shared_buffer_mut(&mut self) -> Option<&mut SharedBuffer> {
        self.buffers.last_mut()
    }

    pub fn back_buffer(&self) -> Option<&CursorBuffer> {
        self.buffers.last().map(SharedBuffer::buffer)
    }

    pub fn back_buffer_mut(&mut self) -> Option<&mut CursorBuffer> {
        self.buffers.last_mut().map(SharedBuffer::buffer_mut)
    }

    /// Capacity assuming every buffer has the first buffer's size
    pub fn size_with_fixed_buffer(&self) -> usize {
        self.buffers
            .first()
            .map_or(0, |first| self.buffers.len() * first.buffer().buffer_size())
    }

    /// Sum of every buffer's useable window
    pub fn size_with_variable_buffer(&self) -> usize {
        self.buffers.iter().map(|b| b.buffer().useable()).sum()
    }

    /// Sum of every buffer's data region
    pub fn data_only_size(&self) -> usize {
        self.buffers.iter().map(|b| b.buffer().data_size()).sum()
    }

    /// Keep only the last buffer and drop its scanned prefix
    pub fn flush(&mut self) {
        let Some(last) = self.buffers.pop() else {
            return;
        };
        trace!(dropped = self.buffers.len(), "flushing buffer chain");
        self.buffers.clear();
        self.buffers.push(last);
        if let Some(back) = self.back_buffer_mut() {
            back.rebase();
        }
    }

    /// Split the last buffer at its get cursor; the unscanned tail becomes a
    /// new last buffer sharing the same memory
    pub fn split_last_buffer(&mut self) {
        let Some(last) = self.buffers.last_mut() else {
            return;
        };
        let tail = last.buffer_mut().split();
        trace!(at = tail.begin(), "splitting last buffer");
        let shared = SharedBuffer::with_cursor(last, tail);
        self.buffers.push(shared);
    }

    /// Concatenate every buffer's data region into one contiguous block
    pub fn data_copy_one_piece(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.data_only_size());
        for buffer in &self.buffers {
            out.extend_from_slice(buffer.data());
        }
        Bytes::from(out)
    }
}

impl From<SharedBuffer> for BufferChain {
    fn from(buffer: SharedBuffer) -> Self {
        Self::from_shared(buffer)
    }
}

impl From<Vec<u8>> for BufferChain {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_shared(SharedBuffer::from_vec(bytes))
    }
}

impl From<String> for BufferChain {
    fn from(text: String) -> Self {
        Self::from(text.into_bytes())
    }
}

impl fmt::Display for BufferChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, buffer) in self.buffers.iter().enumerate() {
            writeln!(f, "buffer {index}")?;
            write!(f, "{buffer}")?;
        }
        Ok(())
    }
}

/// [`io::Write`] sink that appends to a chain, growing it from a pool
pub struct ChainWriter<'c> {
    chain: &'c mut BufferChain,
    pool: &'c Arc<PoolAllocator>,
}

impl<'c> ChainWriter<'c> {
    pub fn new(chain: &'c mut BufferChain, pool: &'c Arc<PoolAllocator>) -> Self {
        Self { chain, pool }
    }
}

impl io::Write for ChainWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(back) = self.chain.back_shared_buffer_mut() {
            let n = back.write_bytes(buf);
            if n > 0 {
                return Ok(n);
            }
        }
        self.chain
            .push(SharedBuffer::from_chunk(self.pool.allocate(), 0));
        match self.chain.back_shared_buffer_mut().map(|b| b.write_bytes(buf)) {
            Some(n) if n > 0 => Ok(n),
            _ => Err(io::Error::new(
                io::ErrorKind::WriteZero,
                Error::buffer("fresh chunk accepted no bytes"),
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_vec_copies_back() {
        let chain = BufferChain::from(b"payload".to_vec());
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.data_only_size(), 7);
        assert_eq!(&chain.data_copy_one_piece()[..], b"payload");
    }

    #[test]
    fn test_sizes() {
        let mut chain = BufferChain::new();
        assert_eq!(chain.size_with_fixed_buffer(), 0);
        chain.push(SharedBuffer::heap(10));
        chain.push(SharedBuffer::heap(30));
        assert_eq!(chain.size_with_fixed_buffer(), 20);
        assert_eq!(chain.size_with_variable_buffer(), 40);
    }

    #[test]
    fn test_flush_keeps_last() {
        let mut chain = BufferChain::from(String::from("first"));
        chain.push(SharedBuffer::from_vec(b"second".to_vec()));
        chain.flush();
        assert_eq!(chain.len(), 1);
        // rebased: nothing left in the data region
        assert_eq!(chain.data_only_size(), 0);
        assert_eq!(chain.back_buffer().map(|b| b.begin()), Some(6));
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut chain = BufferChain::new();
        chain.flush();
        chain.split_last_buffer();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_split_last_buffer() {
        let mut shared = SharedBuffer::heap(16);
        shared.write_bytes(b"abcdef");
        let marks = CursorBuffer::with_cursors(16, 0, 16, 4, 6);
        let mut chain = BufferChain::from(SharedBuffer::with_cursor(&shared, marks));

        chain.split_last_buffer();
        assert_eq!(chain.len(), 2);
        let head = chain.shared_buffers()[0].buffer();
        let tail = chain.shared_buffers()[1].buffer();
        assert_eq!((head.end(), head.put()), (4, 4));
        assert_eq!((tail.begin(), tail.get(), tail.put(), tail.end()), (4, 4, 6, 16));
        assert_eq!(chain.shared_buffers()[1].not_scanned(), b"ef");
        assert_eq!(shared.ref_count(), 3);
    }

    #[test]
    fn test_writer_grows_chain() {
        let pool = PoolAllocator::new(4, 8).unwrap();
        let mut chain = BufferChain::new();
        ChainWriter::new(&mut chain, &pool)
            .write_all(b"0123456789abcdefXYZ")
            .unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(&chain.data_copy_one_piece()[..], b"0123456789abcdefXYZ");
    }
}
