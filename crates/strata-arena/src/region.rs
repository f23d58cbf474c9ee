//! Raw aligned regions with no owning structure.

use strata_core::{AccessError, LifecycleError};
use strata_layout::SharedBlock;

/// A bounds-checked byte region inside a stack's block.
///
/// Returned by [`MemoryStack::push_bytes`](crate::MemoryStack::push_bytes)
/// and [`MemoryStack::push_str`](crate::MemoryStack::push_str): scratch
/// space a foreign call reads or fills without any declared shape.
/// Like any pushed value, the region is invalidated by the matching pop.
#[derive(Clone, Debug)]
pub struct RawRegion {
    block: SharedBlock,
    offset: usize,
    len: usize,
}

impl RawRegion {
    pub(crate) fn new(block: SharedBlock, offset: usize, len: usize) -> Self {
        Self { block, offset, len }
    }

    /// Length of the region in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the region is zero-sized.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute address of the region's first byte.
    pub fn address(&self) -> Result<usize, LifecycleError> {
        self.block.check_live(self.offset, self.len)?;
        Ok(self.block.address() + self.offset)
    }

    /// Copy the region into a fresh vec.
    pub fn to_vec(&self) -> Result<Vec<u8>, AccessError> {
        self.block.check_live(self.offset, self.len)?;
        Ok(self.block.to_vec(self.offset, self.len)?)
    }

    /// Read `out.len()` bytes starting at region-relative `rel`.
    pub fn read_at(&self, rel: usize, out: &mut [u8]) -> Result<(), AccessError> {
        self.check_span(rel, out.len())?;
        self.block.read_into(self.offset + rel, out)?;
        Ok(())
    }

    /// Write `data` starting at region-relative `rel`.
    pub fn write_at(&self, rel: usize, data: &[u8]) -> Result<(), AccessError> {
        self.check_span(rel, data.len())?;
        self.block.write(self.offset + rel, data)?;
        Ok(())
    }

    fn check_span(&self, rel: usize, len: usize) -> Result<(), AccessError> {
        let end = rel.checked_add(len);
        match end {
            Some(end) if end <= self.len => {}
            _ => {
                return Err(strata_core::BoundsError::RegionOutOfRange {
                    offset: rel,
                    len,
                    capacity: self.len,
                }
                .into())
            }
        }
        self.block.check_live(self.offset + rel, len)?;
        Ok(())
    }
}
