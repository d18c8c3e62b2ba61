//! Sparse byte image of a stopped process.
//!
//! The image is a set of non-overlapping mapped segments. Reads that touch a
//! byte outside every segment fail with `ReadFailed`, the same way a read from
//! an unmapped page fails against a live process.
//!
//! Allocation hands out addresses from a bump pointer starting at
//! [`HEAP_BASE`], leaving an unmapped guard gap after each allocation so that
//! an off-by-one read lands on unmapped memory instead of a neighbour.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::{Result, VisualizerError};
use crate::types::Address;

/// First address handed out by [`MemoryImage::alloc`].
pub const HEAP_BASE: u64 = 0x1000_0000;

/// Alignment of every allocation.
const ALLOC_ALIGN: u64 = 16;

/// Unmapped bytes left between consecutive allocations.
const GUARD_GAP: u64 = 16;

/// Mapped segments keyed by start address.
#[derive(Debug, Clone)]
pub struct MemoryImage
{
    segments: BTreeMap<u64, Vec<u8>>,
    next_alloc: u64,
}

impl MemoryImage
{
    /// Create an empty image.
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            segments: BTreeMap::new(),
            next_alloc: HEAP_BASE,
        }
    }

    /// Map `bytes` at a fixed address.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if the segment is empty, wraps the address space, or
    /// overlaps an existing segment.
    pub fn map(&mut self, address: Address, bytes: Vec<u8>) -> Result<()>
    {
        let start = address.value();
        let end = u64::try_from(bytes.len())
            .ok()
            .and_then(|len| start.checked_add(len))
            .filter(|&end| end > start)
            .ok_or_else(|| VisualizerError::InvalidArgument(format!("cannot map {} bytes at {address}", bytes.len())))?;

        let overlaps = self
            .segments
            .range(..end)
            .next_back()
            .is_some_and(|(&seg_start, seg)| seg_start + seg.len() as u64 > start);
        if overlaps {
            return Err(VisualizerError::InvalidArgument(format!(
                "segment at {address} overlaps an existing mapping"
            )));
        }

        trace!(%address, len = bytes.len(), "mapping segment");
        self.segments.insert(start, bytes);
        Ok(())
    }

    /// Map `bytes` at the next free heap address and return that address.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` for an empty allocation.
    pub fn alloc(&mut self, bytes: Vec<u8>) -> Result<Address>
    {
        let address = Address::new(self.next_alloc);
        let len = bytes.len() as u64;
        self.map(address, bytes)?;

        let end = self.next_alloc + len + GUARD_GAP;
        self.next_alloc = end.div_ceil(ALLOC_ALIGN) * ALLOC_ALIGN;
        Ok(address)
    }

    /// Allocate `len` zero bytes.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` for a zero length.
    pub fn alloc_zeroed(&mut self, len: usize) -> Result<Address>
    {
        self.alloc(vec![0; len])
    }

    /// Find the segment containing `[start, start + len)`.
    fn segment_for(&self, start: u64, len: usize) -> Option<(u64, &Vec<u8>)>
    {
        let (&seg_start, seg) = self.segments.range(..=start).next_back()?;
        let offset = start - seg_start;
        let end = offset.checked_add(len as u64)?;
        (end <= seg.len() as u64).then_some((offset, seg))
    }

    /// Read `len` bytes starting at `address`.
    ///
    /// A zero-length read always succeeds, even at an unmapped address.
    ///
    /// ## Errors
    ///
    /// `ReadFailed` if any byte of the range is unmapped. Ranges that span two
    /// adjacent segments are not stitched together.
    pub fn read(&self, address: Address, len: usize) -> Result<Vec<u8>>
    {
        if len == 0 {
            return Ok(Vec::new());
        }
        let failed = || VisualizerError::ReadFailed {
            address: address.value(),
            length: len,
        };
        let (offset, seg) = self.segment_for(address.value(), len).ok_or_else(failed)?;
        let offset = usize::try_from(offset).map_err(|_| failed())?;
        Ok(seg[offset..offset + len].to_vec())
    }

    /// Read a little-endian unsigned integer of `size` bytes (1 to 8).
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` for an unsupported size, `ReadFailed` for unmapped memory.
    pub fn read_uint(&self, address: Address, size: usize) -> Result<u64>
    {
        if !(1..=8).contains(&size) {
            return Err(VisualizerError::InvalidArgument(format!("cannot read a {size}-byte integer")));
        }
        let bytes = self.read(address, size)?;
        let mut raw = [0u8; 8];
        raw[..size].copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Overwrite bytes inside an existing mapping.
    ///
    /// ## Errors
    ///
    /// `ReadFailed` if the range is not fully mapped.
    pub fn write(&mut self, address: Address, bytes: &[u8]) -> Result<()>
    {
        let start = address.value();
        let (&seg_start, seg) = self
            .segments
            .range_mut(..=start)
            .next_back()
            .ok_or(VisualizerError::ReadFailed {
                address: start,
                length: bytes.len(),
            })?;
        let offset = (start - seg_start) as usize;
        let Some(target) = seg.get_mut(offset..offset + bytes.len()) else {
            return Err(VisualizerError::ReadFailed {
                address: start,
                length: bytes.len(),
            });
        };
        target.copy_from_slice(bytes);
        Ok(())
    }

    /// Write a little-endian unsigned integer of `size` bytes (1 to 8).
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` for an unsupported size or a value that does not fit,
    /// `ReadFailed` for unmapped memory.
    pub fn write_uint(&mut self, address: Address, size: usize, value: u64) -> Result<()>
    {
        if !(1..=8).contains(&size) || (size < 8 && value >> (size * 8) != 0) {
            return Err(VisualizerError::InvalidArgument(format!(
                "value {value:#x} does not fit in {size} bytes"
            )));
        }
        self.write(address, &value.to_le_bytes()[..size])
    }

    /// Write a pointer-sized (8 byte) value.
    ///
    /// ## Errors
    ///
    /// `ReadFailed` for unmapped memory.
    pub fn write_pointer(&mut self, address: Address, target: Address) -> Result<()>
    {
        self.write(address, &target.value().to_le_bytes())
    }

    /// Drop the mapping that starts at `address`, simulating freed or
    /// paged-out memory. Returns whether a segment was removed.
    pub fn unmap(&mut self, address: Address) -> bool
    {
        self.segments.remove(&address.value()).is_some()
    }

    /// Number of mapped segments.
    #[must_use]
    pub fn segment_count(&self) -> usize
    {
        self.segments.len()
    }
}

impl Default for MemoryImage
{
    fn default() -> Self
    {
        Self::new()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_alloc_is_aligned_and_guarded()
    {
        let mut image = MemoryImage::new();
        let a = image.alloc(vec![1; 3]).unwrap();
        let b = image.alloc(vec![2; 3]).unwrap();
        assert_eq!(a.value(), HEAP_BASE);
        assert_eq!(b.value() % ALLOC_ALIGN, 0);
        assert!(b.value() >= a.value() + 3 + GUARD_GAP);
        assert!(image.read(Address::new(a.value() + 3), 1).is_err());
    }

    #[test]
    fn test_read_within_and_past_segment()
    {
        let mut image = MemoryImage::new();
        let a = image.alloc(vec![10, 20, 30, 40]).unwrap();
        assert_eq!(image.read(Address::new(a.value() + 1), 2).unwrap(), vec![20, 30]);
        assert!(image.read(Address::new(a.value() + 2), 4).is_err());
        assert!(image.read(Address::new(0x10), 1).is_err());
    }

    #[test]
    fn test_zero_length_read_never_fails()
    {
        let image = MemoryImage::new();
        assert!(image.read(Address::NULL, 0).unwrap().is_empty());
    }

    #[test]
    fn test_uint_round_trip_little_endian()
    {
        let mut image = MemoryImage::new();
        let a = image.alloc_zeroed(8).unwrap();
        image.write_uint(a, 4, 0xdead_beef).unwrap();
        assert_eq!(image.read(a, 4).unwrap(), vec![0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(image.read_uint(a, 4).unwrap(), 0xdead_beef);
        assert!(image.write_uint(a, 1, 0x100).is_err());
    }

    #[test]
    fn test_map_rejects_overlap()
    {
        let mut image = MemoryImage::new();
        image.map(Address::new(0x100), vec![0; 16]).unwrap();
        assert!(image.map(Address::new(0x108), vec![0; 4]).is_err());
        assert!(image.map(Address::new(0xf8), vec![0; 16]).is_err());
        assert!(image.map(Address::new(0x110), vec![0; 4]).is_ok());
    }

    #[test]
    fn test_unmap_makes_reads_fail()
    {
        let mut image = MemoryImage::new();
        let a = image.alloc(vec![1, 2]).unwrap();
        assert!(image.unmap(a));
        assert!(image.read(a, 1).is_err());
        assert_eq!(image.segment_count(), 0);
    }
}
