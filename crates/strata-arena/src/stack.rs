//! The LIFO bump allocator.

use std::sync::Arc;

use strata_core::{round_up, AccessError, BoundsError, MemSize, SafePointError};
use strata_layout::{
    Block, Pointer64, Shape, SharedBlock, Structure, StructureArray, TypedPointer64, View,
};

use crate::point::{PopPoint, SafePoint};
use crate::region::RawRegion;

/// A bump-pointer arena handing out block regions with LIFO discipline.
///
/// Every push aligns the cursor for the pushed value, records the
/// pre-push cursor in a frame, and claims the value at the aligned
/// offset; the matching pop restores the cursor exactly, including any
/// alignment padding consumed before the value. All validation happens
/// before any state mutation, so a failed push leaves the stack intact.
pub struct MemoryStack {
    block: SharedBlock,
    /// Bump pointer: offset of the next free byte.
    cursor: usize,
    /// Pre-push cursor per live structure, in push order.
    frames: Vec<usize>,
}

impl MemoryStack {
    /// Allocate a stack with `capacity` usable bytes.
    pub fn new(capacity: usize) -> Self {
        let block = Block::new(capacity);
        // Nothing is live yet; the floor tracks the cursor from here on.
        block.set_reclaim_floor(0);
        Self {
            block,
            cursor: 0,
            frames: Vec::new(),
        }
    }

    /// Absolute address of the block's first byte.
    pub fn base_address(&self) -> usize {
        self.block.address()
    }

    /// Absolute address of the next free byte.
    pub fn stack_pointer(&self) -> usize {
        self.block.address() + self.cursor
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    /// Bytes consumed so far (values plus alignment padding).
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.block.capacity() - self.cursor
    }

    /// Number of live pushed values.
    pub fn struct_count(&self) -> usize {
        self.frames.len()
    }

    /// Whether `address` originates from this stack's block.
    ///
    /// Used to validate that a pointer received from foreign code
    /// genuinely refers into this arena.
    pub fn contains_address(&self, address: usize) -> bool {
        self.block.contains_address(address)
    }

    /// Convert an address received from foreign code into a stack offset,
    /// failing with [`BoundsError::AddressOutsideBlock`] for addresses
    /// that do not originate from this stack.
    pub fn offset_of(&self, address: usize) -> Result<usize, BoundsError> {
        self.block.offset_of(address)
    }

    /// Push an untracked structure of the given shape.
    pub fn push_struct(&mut self, shape: &Arc<Shape>) -> Result<Structure, AccessError> {
        let offset = self.reserve(shape.size(), shape.alignment())?;
        let mut s = Structure::new(Arc::clone(shape));
        s.claim(&self.block, offset)?;
        Ok(s)
    }

    /// Push a structure that records per-range dirty data.
    pub fn push_struct_tracked(&mut self, shape: &Arc<Shape>) -> Result<Structure, AccessError> {
        let offset = self.reserve(shape.size(), shape.alignment())?;
        let mut s = Structure::new_tracked(Arc::clone(shape));
        s.claim(&self.block, offset)?;
        Ok(s)
    }

    /// Push a fixed-length array of `len` copies of `element`.
    pub fn push_array(
        &mut self,
        element: &Arc<Shape>,
        len: usize,
    ) -> Result<StructureArray, AccessError> {
        let mut arr = StructureArray::new(Arc::clone(element), len)?;
        let shape = View::shape(&arr);
        let (size, alignment) = (shape.size(), shape.alignment());
        let offset = self.reserve(size, alignment)?;
        arr.claim(&self.block, offset)?;
        Ok(arr)
    }

    /// Push an 8-byte pointer view.
    pub fn push_pointer(&mut self) -> Result<Pointer64, AccessError> {
        let mut p = Pointer64::new();
        let offset = self.reserve(View::required_size(&p), View::alignment(&p))?;
        p.claim(&self.block, offset)?;
        Ok(p)
    }

    /// Push a typed 8-byte pointer view.
    pub fn push_typed_pointer<T: View>(&mut self) -> Result<TypedPointer64<T>, AccessError> {
        let mut p = TypedPointer64::new();
        let offset = self.reserve(View::required_size(&p), View::alignment(&p))?;
        p.claim(&self.block, offset)?;
        Ok(p)
    }

    /// Push a null-terminated UTF-8 copy of `text`.
    ///
    /// Size is the byte length plus one for the terminator; alignment 1.
    /// The bytes are copied verbatim: an interior NUL is preserved in the
    /// region, and a C consumer reading up to the first NUL sees the
    /// shorter prefix.
    pub fn push_str(&mut self, text: &str) -> Result<RawRegion, BoundsError> {
        let len = text.len() + 1;
        let offset = self.reserve(len, 1)?;
        self.block.write(offset, text.as_bytes())?;
        // The block may hold stale bytes from a popped value.
        self.block.write(offset + text.len(), &[0])?;
        Ok(RawRegion::new(Arc::clone(&self.block), offset, len))
    }

    /// Push a raw aligned region with no owning structure.
    pub fn push_bytes(&mut self, mem: MemSize) -> Result<RawRegion, BoundsError> {
        let offset = self.reserve(mem.size(), mem.alignment())?;
        // Zero the region: it may alias a previously popped value.
        self.block.fill(offset, mem.size(), 0)?;
        Ok(RawRegion::new(Arc::clone(&self.block), offset, mem.size()))
    }

    /// Pop the most recently pushed value.
    ///
    /// Restores the cursor to its pre-push value (including alignment
    /// padding) and invalidates every view of the popped region.
    pub fn pop(&mut self) -> Result<(), SafePointError> {
        let saved = self.frames.pop().ok_or(SafePointError::PopOnEmpty)?;
        self.cursor = saved;
        self.block.set_reclaim_floor(saved);
        Ok(())
    }

    /// Open a balanced-use checkpoint; see [`SafePoint`].
    pub fn safe_point(&mut self) -> SafePoint<'_> {
        SafePoint::open(self)
    }

    /// Open an auto-popping checkpoint; see [`PopPoint`].
    pub fn pop_point(&mut self) -> PopPoint<'_> {
        PopPoint::open(self)
    }

    /// Bump-reserve `size` bytes at `alignment`. Validates everything
    /// before mutating; on success records a frame and advances the
    /// cursor and reclaim floor.
    fn reserve(&mut self, size: usize, alignment: usize) -> Result<usize, BoundsError> {
        let offset = round_up(self.cursor, alignment);
        let end = match offset.checked_add(size) {
            Some(end) if end <= self.block.capacity() => end,
            _ => {
                return Err(BoundsError::CapacityExceeded {
                    requested: size,
                    remaining: self.block.capacity() - self.cursor,
                })
            }
        };
        self.frames.push(self.cursor);
        self.cursor = end;
        self.block.set_reclaim_floor(end);
        Ok(offset)
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    /// Build the checkpoint mismatch error for a `{cursor, count}`
    /// snapshot, with absolute pointers for the report.
    pub(crate) fn checkpoint_error(
        &self,
        saved_cursor: usize,
        saved_count: usize,
    ) -> SafePointError {
        SafePointError::Mismatch {
            expected_pointer: self.base_address() + saved_cursor,
            actual_pointer: self.stack_pointer(),
            expected_count: saved_count,
            actual_count: self.struct_count(),
        }
    }
}

impl std::fmt::Debug for MemoryStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStack")
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .field("struct_count", &self.struct_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{Abi, LifecycleError, NativeType};
    use strata_layout::ShapeBuilder;

    fn u32_shape() -> Arc<Shape> {
        Shape::primitive(NativeType::U32, Abi::Lp64)
    }

    fn i32_shape() -> Arc<Shape> {
        Shape::primitive(NativeType::I32, Abi::Lp64)
    }

    #[test]
    fn push_pop_restores_pointer() {
        let mut stack = MemoryStack::new(1024);
        let base = stack.stack_pointer();
        let s = stack.push_struct(&u32_shape()).unwrap();
        s.set_u32("", 7).unwrap();
        assert_eq!(stack.struct_count(), 1);
        assert_eq!(stack.used(), 4);
        stack.pop().unwrap();
        assert_eq!(stack.stack_pointer(), base);
        assert_eq!(stack.struct_count(), 0);
    }

    #[test]
    fn native_call_scratch_scenario() {
        // 10,000-byte arena: u32 + i32 + 19-char string + 1000-element
        // u32 array. 4 + 4 + 20 + 4000 with no padding required between
        // them (the string ends on a 4-byte boundary).
        let mut stack = MemoryStack::new(10_000);
        let base = stack.stack_pointer();

        let a = stack.push_struct(&u32_shape()).unwrap();
        let b = stack.push_struct(&i32_shape()).unwrap();
        let text = "stack scratch value";
        assert_eq!(text.len(), 19);
        let s = stack.push_str(text).unwrap();
        let arr = stack.push_array(&u32_shape(), 1000).unwrap();

        assert_eq!(stack.used(), 4 + 4 + 20 + 4000);
        assert_eq!(stack.struct_count(), 4);

        a.set_u32("", u32::MAX).unwrap();
        b.set_i32("", -1).unwrap();
        arr.get(999).unwrap().set_u32("", 0xAA55).unwrap();
        let bytes = s.to_vec().unwrap();
        assert_eq!(&bytes[..19], text.as_bytes());
        assert_eq!(bytes[19], 0);

        stack.pop().unwrap();
        stack.pop().unwrap();
        stack.pop().unwrap();
        stack.pop().unwrap();
        assert_eq!(stack.stack_pointer(), base);
        assert_eq!(stack.used(), 0);
    }

    #[test]
    fn pop_restores_alignment_padding() {
        let mut stack = MemoryStack::new(256);
        let _byte = stack.push_struct(&Shape::primitive(NativeType::U8, Abi::Lp64)).unwrap();
        assert_eq!(stack.used(), 1);
        // u64 needs 7 bytes of padding.
        let _wide = stack.push_struct(&Shape::primitive(NativeType::U64, Abi::Lp64)).unwrap();
        assert_eq!(stack.used(), 16);
        stack.pop().unwrap();
        // Padding came back with the pop.
        assert_eq!(stack.used(), 1);
        stack.pop().unwrap();
        assert_eq!(stack.used(), 0);
    }

    #[test]
    fn capacity_exceeded_before_mutation() {
        let mut stack = MemoryStack::new(8);
        let err = stack.push_array(&u32_shape(), 3).unwrap_err();
        assert!(matches!(
            err,
            AccessError::Bounds(BoundsError::CapacityExceeded { requested: 12, .. })
        ));
        assert_eq!(stack.used(), 0);
        assert_eq!(stack.struct_count(), 0);
        // The stack still works.
        stack.push_struct(&u32_shape()).unwrap();
    }

    #[test]
    fn pop_on_empty_is_error() {
        let mut stack = MemoryStack::new(64);
        assert!(matches!(stack.pop(), Err(SafePointError::PopOnEmpty)));
    }

    #[test]
    fn popped_view_is_invalidated() {
        let mut stack = MemoryStack::new(64);
        let s = stack.push_struct(&u32_shape()).unwrap();
        s.set_u32("", 5).unwrap();
        stack.pop().unwrap();
        assert!(matches!(
            s.get_u32(""),
            Err(AccessError::Lifecycle(LifecycleError::Reclaimed { .. }))
        ));
        assert!(matches!(s.address(), Err(LifecycleError::Reclaimed { .. })));
    }

    #[test]
    fn views_below_the_pop_stay_valid() {
        let mut stack = MemoryStack::new(64);
        let keep = stack.push_struct(&u32_shape()).unwrap();
        keep.set_u32("", 11).unwrap();
        let drop_me = stack.push_struct(&u32_shape()).unwrap();
        drop_me.set_u32("", 22).unwrap();
        stack.pop().unwrap();
        assert_eq!(keep.get_u32("").unwrap(), 11);
    }

    #[test]
    fn contains_address_tracks_block() {
        let mut stack = MemoryStack::new(64);
        let s = stack.push_struct(&u32_shape()).unwrap();
        assert!(stack.contains_address(s.address().unwrap()));
        assert!(!stack.contains_address(stack.base_address() + 64));
        assert_eq!(stack.offset_of(s.address().unwrap()).unwrap(), 0);
        assert!(matches!(
            stack.offset_of(stack.base_address() + 64),
            Err(BoundsError::AddressOutsideBlock { .. })
        ));
    }

    #[test]
    fn push_str_copies_interior_nul_verbatim() {
        let mut stack = MemoryStack::new(64);
        let region = stack.push_str("ab\0cd").unwrap();
        assert_eq!(region.len(), 6);
        assert_eq!(region.to_vec().unwrap(), b"ab\0cd\0");
    }

    #[test]
    fn push_str_reuses_popped_space_with_fresh_terminator() {
        let mut stack = MemoryStack::new(64);
        let long = stack.push_str("a-long-string").unwrap();
        assert_eq!(long.len(), 14);
        stack.pop().unwrap();
        let short = stack.push_str("ab").unwrap();
        let bytes = short.to_vec().unwrap();
        assert_eq!(bytes, vec![b'a', b'b', 0]);
    }

    #[test]
    fn push_bytes_is_zeroed_and_aligned() {
        let mut stack = MemoryStack::new(128);
        let _pad = stack.push_str("x").unwrap();
        let region = stack
            .push_bytes(MemSize::new(24, 16).unwrap())
            .unwrap();
        assert_eq!(region.address().unwrap() % 16, 0);
        assert_eq!(region.to_vec().unwrap(), vec![0u8; 24]);
        region.write_at(8, &[1, 2, 3]).unwrap();
        let mut out = [0u8; 3];
        region.read_at(8, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3]);
    }

    #[test]
    fn pushed_structure_fields_work() {
        let mut stack = MemoryStack::new(256);
        let s = stack.push_struct(&strata_test_utils::header_shape()).unwrap();
        s.set_i32("a", 99).unwrap();
        s.set_i8("b", 1).unwrap();
        assert_eq!(s.get_i32("a").unwrap(), 99);
        assert_eq!(s.get_i8("b").unwrap(), 1);
        assert_eq!(stack.used(), 12);
    }

    #[test]
    fn pushed_union_members_alias() {
        let mut stack = MemoryStack::new(256);
        let u = stack
            .push_struct(&strata_test_utils::value_union_shape())
            .unwrap();
        u.set_f64("as_f64", 2.0).unwrap();
        assert_eq!(u.get_u64("as_u64").unwrap(), 2.0f64.to_bits());
    }

    #[test]
    fn tracked_push_reports_dirty_ranges() {
        let mut stack = MemoryStack::new(256);
        let shape = ShapeBuilder::sequential(Abi::Lp64)
            .primitive("a", NativeType::U64)
            .primitive("b", NativeType::U64)
            .build()
            .unwrap();
        let s = stack.push_struct_tracked(&shape).unwrap();
        s.set_u64("b", 1).unwrap();
        let mut ranges = Vec::new();
        assert!(s.handle_modifications(|r| ranges.push(r)).unwrap());
        assert_eq!(ranges.len(), 1);
        assert_eq!((ranges[0].start, ranges[0].end), (8, 16));
    }

    #[test]
    fn typed_pointer_push_round_trip() {
        let mut stack = MemoryStack::new(256);
        let target = stack.push_struct(&u32_shape()).unwrap();
        let tp = stack.push_typed_pointer::<Structure>().unwrap();
        tp.set_target(Some(&target)).unwrap();
        assert_eq!(tp.get().unwrap(), target.address().unwrap());
        assert!(stack.contains_address(tp.get().unwrap()));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn lifo_sequences_restore_the_pointer(
                ops in proptest::collection::vec(0u8..4, 1..64)
            ) {
                let mut stack = MemoryStack::new(1 << 16);
                let base = stack.stack_pointer();
                let mut checkpoints = vec![(base, 0usize)];

                for op in ops {
                    match op {
                        // Push something of varying size/alignment.
                        0 => {
                            checkpoints.push((stack.stack_pointer(), stack.struct_count()));
                            stack.push_struct(&Shape::primitive(NativeType::U8, Abi::Lp64)).unwrap();
                        }
                        1 => {
                            checkpoints.push((stack.stack_pointer(), stack.struct_count()));
                            stack.push_struct(&Shape::primitive(NativeType::U64, Abi::Lp64)).unwrap();
                        }
                        2 => {
                            checkpoints.push((stack.stack_pointer(), stack.struct_count()));
                            stack.push_str("proptest").unwrap();
                        }
                        _ => {
                            if checkpoints.len() > 1 {
                                let (ptr, count) = checkpoints.pop().unwrap();
                                stack.pop().unwrap();
                                prop_assert_eq!(stack.stack_pointer(), ptr);
                                prop_assert_eq!(stack.struct_count(), count);
                            }
                        }
                    }
                }

                while stack.struct_count() > 0 {
                    stack.pop().unwrap();
                }
                prop_assert_eq!(stack.stack_pointer(), base);
            }
        }
    }
}
