//! The owned byte buffer backing a structure tree.
//!
//! A [`Block`] is one zero-initialised allocation whose usable region
//! starts at a [`MAX_ALIGNMENT`] boundary, so any offset that is a
//! multiple of a field's alignment yields a correctly aligned absolute
//! address. All access is bounds-checked slice arithmetic — raw address
//! values leave this type only as opaque `usize`s for foreign calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use strata_core::{BoundsError, LifecycleError, MAX_ALIGNMENT};

/// Shared handle to a block; every view in one structure tree holds one.
pub type SharedBlock = Arc<Block>;

/// One owned, aligned, zero-initialised byte buffer.
///
/// The byte storage sits behind a `Mutex` that serializes raw access
/// only — logical field writes are serialized by callers (one writer at
/// a time), the mutex merely keeps concurrent reader/drain byte copies
/// well-defined. The buffer is never resized, so its base address is
/// stable for the lifetime of the block.
pub struct Block {
    bytes: Mutex<Vec<u8>>,
    /// Offset of the aligned base within the over-allocated vec.
    base: usize,
    capacity: usize,
    /// Offsets at or beyond this floor are reclaimed. Blocks owned by a
    /// single structure never reclaim (floor == capacity); an arena
    /// lowers the floor on pop to invalidate stale views.
    reclaim_floor: AtomicUsize,
}

impl Block {
    /// Allocate a zeroed block of `capacity` usable bytes.
    pub fn new(capacity: usize) -> SharedBlock {
        // Over-allocate so the usable region can start on a
        // MAX_ALIGNMENT boundary regardless of where the vec lands.
        let raw = vec![0u8; capacity + MAX_ALIGNMENT];
        let misalign = raw.as_ptr() as usize % MAX_ALIGNMENT;
        let base = if misalign == 0 {
            0
        } else {
            MAX_ALIGNMENT - misalign
        };
        Arc::new(Self {
            bytes: Mutex::new(raw),
            base,
            capacity,
            reclaim_floor: AtomicUsize::new(capacity),
        })
    }

    /// Usable capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Absolute address of offset 0. Always a multiple of [`MAX_ALIGNMENT`].
    pub fn address(&self) -> usize {
        self.lock().as_ptr() as usize + self.base
    }

    /// Whether `address` falls inside `[base, base + capacity)`.
    pub fn contains_address(&self, address: usize) -> bool {
        let base = self.address();
        address >= base && address < base + self.capacity
    }

    /// Convert an absolute address back into a block offset.
    ///
    /// Validates that the address genuinely originates from this block,
    /// for pointers received from foreign code.
    pub fn offset_of(&self, address: usize) -> Result<usize, BoundsError> {
        if !self.contains_address(address) {
            return Err(BoundsError::AddressOutsideBlock { address });
        }
        Ok(address - self.address())
    }

    /// Current reclaim floor.
    pub fn reclaim_floor(&self) -> usize {
        self.reclaim_floor.load(Ordering::Acquire)
    }

    /// Move the reclaim floor. Called by the owning arena on push/pop.
    pub fn set_reclaim_floor(&self, floor: usize) {
        self.reclaim_floor.store(floor, Ordering::Release);
    }

    /// Validate that `[offset, offset + len)` is within the block.
    pub fn check_range(&self, offset: usize, len: usize) -> Result<(), BoundsError> {
        let end = offset.checked_add(len);
        match end {
            Some(end) if end <= self.capacity => Ok(()),
            _ => Err(BoundsError::RegionOutOfRange {
                offset,
                len,
                capacity: self.capacity,
            }),
        }
    }

    /// Validate that `[offset, offset + len)` has not been reclaimed.
    pub fn check_live(&self, offset: usize, len: usize) -> Result<(), LifecycleError> {
        let end = offset.saturating_add(len);
        let floor = self.reclaim_floor();
        if end > floor {
            return Err(LifecycleError::Reclaimed { end, floor });
        }
        Ok(())
    }

    /// Copy `out.len()` bytes starting at `offset` into `out`.
    pub fn read_into(&self, offset: usize, out: &mut [u8]) -> Result<(), BoundsError> {
        self.check_range(offset, out.len())?;
        let bytes = self.lock();
        let start = self.base + offset;
        out.copy_from_slice(&bytes[start..start + out.len()]);
        Ok(())
    }

    /// Copy `data` into the block starting at `offset`.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<(), BoundsError> {
        self.check_range(offset, data.len())?;
        let mut bytes = self.lock();
        let start = self.base + offset;
        bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Fill `[offset, offset + len)` with `value`.
    pub fn fill(&self, offset: usize, len: usize, value: u8) -> Result<(), BoundsError> {
        self.check_range(offset, len)?;
        let mut bytes = self.lock();
        let start = self.base + offset;
        bytes[start..start + len].fill(value);
        Ok(())
    }

    /// Snapshot `[offset, offset + len)` into a fresh vec.
    pub fn to_vec(&self, offset: usize, len: usize) -> Result<Vec<u8>, BoundsError> {
        self.check_range(offset, len)?;
        let bytes = self.lock();
        let start = self.base + offset;
        Ok(bytes[start..start + len].to_vec())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        // A panicked writer cannot leave the byte vec structurally
        // inconsistent (plain copies only), so poisoning is ignored.
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("capacity", &self.capacity)
            .field("reclaim_floor", &self.reclaim_floor())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_address_is_max_aligned() {
        for _ in 0..8 {
            let block = Block::new(64);
            assert_eq!(block.address() % MAX_ALIGNMENT, 0);
        }
    }

    #[test]
    fn new_block_is_zeroed() {
        let block = Block::new(32);
        assert_eq!(block.to_vec(0, 32).unwrap(), vec![0u8; 32]);
    }

    #[test]
    fn write_read_round_trip() {
        let block = Block::new(16);
        block.write(4, &[1, 2, 3, 4]).unwrap();
        let mut out = [0u8; 4];
        block.read_into(4, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
        // Neighbouring bytes untouched.
        let all = block.to_vec(0, 16).unwrap();
        assert_eq!(&all[..4], &[0, 0, 0, 0]);
        assert_eq!(&all[8..], &[0u8; 8]);
    }

    #[test]
    fn out_of_range_write_rejected_without_mutation() {
        let block = Block::new(8);
        let err = block.write(6, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, BoundsError::RegionOutOfRange { .. }));
        assert_eq!(block.to_vec(0, 8).unwrap(), vec![0u8; 8]);
    }

    #[test]
    fn range_overflow_rejected() {
        let block = Block::new(8);
        assert!(block.check_range(usize::MAX, 2).is_err());
    }

    #[test]
    fn contains_address_covers_exact_bounds() {
        let block = Block::new(32);
        let base = block.address();
        assert!(block.contains_address(base));
        assert!(block.contains_address(base + 31));
        assert!(!block.contains_address(base + 32));
        assert!(!block.contains_address(base.wrapping_sub(1)));
    }

    #[test]
    fn offset_of_rejects_foreign_addresses() {
        let block = Block::new(32);
        let base = block.address();
        assert_eq!(block.offset_of(base + 12).unwrap(), 12);
        assert!(matches!(
            block.offset_of(base + 32),
            Err(BoundsError::AddressOutsideBlock { .. })
        ));
    }

    #[test]
    fn reclaim_floor_invalidates_tail() {
        let block = Block::new(64);
        assert!(block.check_live(0, 64).is_ok());
        block.set_reclaim_floor(16);
        assert!(block.check_live(0, 16).is_ok());
        let err = block.check_live(8, 16).unwrap_err();
        assert!(matches!(err, LifecycleError::Reclaimed { end: 24, floor: 16 }));
    }

    #[test]
    fn fill_covers_exact_region() {
        let block = Block::new(8);
        block.fill(2, 4, 0xAB).unwrap();
        assert_eq!(block.to_vec(0, 8).unwrap(), vec![0, 0, 0xAB, 0xAB, 0xAB, 0xAB, 0, 0]);
    }
}
