// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parameter blackboard.
//!
//! A single contiguous byte buffer holding the live value of every parameter,
//! addressed by byte offset. Offsets come from the depth-first layout of the
//! element tree (see [`crate::element`]).
//!
//! # Layout
//!
//! ```text
//! offset 0                                               size
//! +---------+---------+-------------------+--------------+
//! | param A | param B | component C ...   | param D      |
//! +---------+---------+-------------------+--------------+
//! ```
//!
//! All accesses go through `(offset, size)` views with checked slicing.
//! Integers are stored little-endian, `size` bytes wide.

/// Blackboard access errors (offset/size outside the buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Blackboard access out of bounds: offset {offset} size {size} (blackboard size {len})")]
pub struct OutOfBounds {
    pub offset: usize,
    pub size: usize,
    pub len: usize,
}

/// Live parameter storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blackboard {
    bytes: Vec<u8>,
}

impl Blackboard {
    /// Create a zero-filled blackboard.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size],
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Zero every byte.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Borrow `size` bytes at `offset`.
    pub fn region(&self, offset: usize, size: usize) -> Result<&[u8], OutOfBounds> {
        let len = self.bytes.len();
        offset
            .checked_add(size)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(OutOfBounds { offset, size, len })
    }

    /// Mutably borrow `size` bytes at `offset`.
    pub fn region_mut(&mut self, offset: usize, size: usize) -> Result<&mut [u8], OutOfBounds> {
        let len = self.bytes.len();
        offset
            .checked_add(size)
            .and_then(|end| self.bytes.get_mut(offset..end))
            .ok_or(OutOfBounds { offset, size, len })
    }

    /// Copy `data` into the blackboard at `offset`.
    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) -> Result<(), OutOfBounds> {
        self.region_mut(offset, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Copy `out.len()` bytes at `offset` into `out`.
    pub fn read_bytes(&self, offset: usize, out: &mut [u8]) -> Result<(), OutOfBounds> {
        out.copy_from_slice(self.region(offset, out.len())?);
        Ok(())
    }

    /// Read a little-endian raw value of `size` bytes (1..=4).
    pub fn read_raw(&self, offset: usize, size: usize) -> Result<u32, OutOfBounds> {
        debug_assert!(size <= 4, "raw values are at most 32 bits");
        let region = self.region(offset, size)?;
        let mut buf = [0u8; 4];
        buf[..size].copy_from_slice(region);
        Ok(u32::from_le_bytes(buf))
    }

    /// Write the low `size` bytes of `raw` little-endian at `offset`.
    pub fn write_raw(&mut self, offset: usize, size: usize, raw: u32) -> Result<(), OutOfBounds> {
        debug_assert!(size <= 4, "raw values are at most 32 bits");
        let bytes = raw.to_le_bytes();
        self.region_mut(offset, size)?.copy_from_slice(&bytes[..size]);
        Ok(())
    }
}

/// Sequential blackboard view handed to hardware bindings during a sync.
///
/// Created with its cursor at zero for every synchronization. Reads take
/// bytes out of the blackboard (send direction), writes put hardware data
/// into it (receive direction).
///
/// # Panics
///
/// Accessing past the end of the element's data is a mismatch between the
/// declared footprint and the binding's access pattern. It panics.
pub struct BlackboardIo<'a> {
    location: &'a mut [u8],
    cursor: usize,
}

impl<'a> BlackboardIo<'a> {
    pub(crate) fn new(location: &'a mut [u8]) -> Self {
        Self {
            location,
            cursor: 0,
        }
    }

    /// Size of the element's data in bytes.
    pub fn data_size(&self) -> usize {
        self.location.len()
    }

    /// Current cursor position.
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Bytes left before the end of the element's data.
    pub fn remaining(&self) -> usize {
        self.location.len() - self.cursor
    }

    fn advance(&mut self, n: usize) -> std::ops::Range<usize> {
        let start = self.cursor;
        assert!(
            start + n <= self.location.len(),
            "blackboard access overrun: cursor {} + {} exceeds data size {}",
            start,
            n,
            self.location.len()
        );
        self.cursor += n;
        start..start + n
    }

    /// Copy the next `out.len()` bytes from the blackboard.
    pub fn read(&mut self, out: &mut [u8]) {
        let range = self.advance(out.len());
        out.copy_from_slice(&self.location[range]);
    }

    /// Copy `data` into the blackboard at the cursor.
    pub fn write(&mut self, data: &[u8]) {
        let range = self.advance(data.len());
        self.location[range].copy_from_slice(data);
    }

    /// Read the next `size` bytes as a little-endian integer.
    pub fn read_raw(&mut self, size: usize) -> u32 {
        let mut buf = [0u8; 4];
        self.read(&mut buf[..size]);
        u32::from_le_bytes(buf)
    }

    /// Write the low `size` bytes of `raw` little-endian.
    pub fn write_raw(&mut self, size: usize, raw: u32) {
        let bytes = raw.to_le_bytes();
        self.write(&bytes[..size]);
    }
}
