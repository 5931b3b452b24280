//! Cursor bookkeeping over one fixed memory region
//!
//! ```text
//! |--used-------|--useable-----------------------------------|--used----|
//!               |--buffered-----------------|--not_buffered--|
//!               |--scanned--|--not_scanned--|
//!                           |--remaining---------------------|
//! ^buffer       ^begin      ^get            ^put             ^end       ^ebuffer
//! ```
//!
//! Marks are byte offsets from the start of the region, so `buffer` is
//! always zero and `ebuffer` is the region size. A separate `data` mark splits
//! the buffered prefix into a header `[begin, data)` and data `[data, get)`.
//!
//! `putx`/`getx` do not bounds-check in release builds; keeping
//! `begin <= get <= put <= end` is the caller's contract.

use std::fmt;
use std::ops::Range;

/// Ordered cursor marks over one region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorBuffer {
    ebuffer: usize,
    begin: usize,
    end: usize,
    get: usize,
    put: usize,
    data: usize,
}

impl CursorBuffer {
    /// Whole region is useable, cursors at the start
    pub fn new(capacity: usize) -> Self {
        Self::with_useable(capacity, 0, capacity)
    }

    /// Useable window `[begin, end)`, cursors at `begin`
    pub fn with_useable(capacity: usize, begin: usize, end: usize) -> Self {
        Self::with_cursors(capacity, begin, end, begin, begin)
    }

    /// Fully explicit marks
    pub fn with_cursors(capacity: usize, begin: usize, end: usize, get: usize, put: usize) -> Self {
        let buffer = Self {
            ebuffer: capacity,
            begin,
            end,
            get,
            put,
            data: begin,
        };
        debug_assert!(buffer.is_consistent(), "inconsistent cursors: {buffer:?}");
        buffer
    }

    /// Cut at `get`: this buffer keeps its scanned prefix, the returned
    /// buffer covers `[get, old_end)` with the old `get`/`put`
    pub fn split(&mut self) -> CursorBuffer {
        let tail = Self::with_cursors(self.ebuffer, self.get, self.end, self.get, self.put);
        self.end = self.get;
        self.put = self.get;
        tail
    }

    /// Drop the scanned prefix from accounting; no memory moves
    pub fn rebase(&mut self) {
        self.begin = self.get;
        self.data = self.get;
    }

    /// Collapse `put` and `end` onto `get`
    pub fn collapse_to_get(&mut self) {
        self.put = self.get;
        self.end = self.get;
    }

    /// Move the header/data split
    pub fn set_header_data_split(&mut self, split: usize) {
        debug_assert!(split >= self.begin && split <= self.end);
        self.data = split;
    }

    /// Advance `put` by `num` bytes
    #[inline]
    pub fn putx(&mut self, num: usize) {
        self.put += num;
        debug_assert!(self.put <= self.end, "put overran end: {self:?}");
    }

    /// Advance `get` by `num` bytes
    #[inline]
    pub fn getx(&mut self, num: usize) {
        self.get += num;
        debug_assert!(self.get <= self.put, "get overran put: {self:?}");
    }

    /// `buffer <= begin <= get <= put <= end <= ebuffer`
    pub fn is_consistent(&self) -> bool {
        self.begin <= self.get
            && self.get <= self.put
            && self.put <= self.end
            && self.end <= self.ebuffer
            && self.begin <= self.data
    }

    /// `[begin, end)` length
    pub fn useable(&self) -> usize {
        self.end - self.begin
    }

    /// `[begin, put)` length
    pub fn buffered(&self) -> usize {
        self.put - self.begin
    }

    /// `[put, end)` length
    pub fn not_buffered(&self) -> usize {
        self.end - self.put
    }

    /// `[begin, get)` length
    pub fn scanned(&self) -> usize {
        self.get - self.begin
    }

    /// `[get, put)` length
    pub fn not_scanned(&self) -> usize {
        self.put - self.get
    }

    /// `[get, end)` length
    pub fn remaining(&self) -> usize {
        self.end - self.get
    }

    /// Size of the whole region
    pub fn buffer_size(&self) -> usize {
        self.ebuffer
    }

    /// `[begin, data)` length
    pub fn header_size(&self) -> usize {
        self.data - self.begin
    }

    /// `[data, get)` length
    pub fn data_size(&self) -> usize {
        self.get.saturating_sub(self.data)
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn get(&self) -> usize {
        self.get
    }

    pub fn put(&self) -> usize {
        self.put
    }

    pub fn data(&self) -> usize {
        self.data
    }

    pub fn ebuffer(&self) -> usize {
        self.ebuffer
    }

    pub fn scanned_range(&self) -> Range<usize> {
        self.begin..self.get
    }

    pub fn not_scanned_range(&self) -> Range<usize> {
        self.get..self.put
    }

    pub fn data_range(&self) -> Range<usize> {
        self.data..self.get.max(self.data)
    }

    pub fn header_range(&self) -> Range<usize> {
        self.begin..self.data
    }
}

impl fmt::Display for CursorBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "|--used-{}------|--useable{}--------------------------------------------|--used-{}---|",
            self.begin,
            self.useable(),
            self.ebuffer - self.end
        )?;
        writeln!(
            f,
            "                   |--buffered-{}---------------------|--not_buffered-{}-|",
            self.buffered(),
            self.not_buffered()
        )?;
        writeln!(
            f,
            "                   |--scanned-{}-|--not_scanned-{}-|",
            self.scanned(),
            self.not_scanned()
        )?;
        writeln!(
            f,
            "                                    |--remaining-{}-------------------------|",
            self.remaining()
        )?;
        writeln!(
            f,
            "^buffer            ^begin           ^get                 ^put                  ^end            ^ebuffer"
        )
    }
}
