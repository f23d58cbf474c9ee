//! Checkpoint guards verifying LIFO discipline.
//!
//! Forgetting a `pop` in a long call sequence corrupts every later
//! allocation silently; these guards turn that into an immediate,
//! localized failure. [`SafePoint`] verifies that pushes and pops
//! balanced out when it closes. [`PopPoint`] goes further and pops
//! everything pushed through it.

use std::ops::{Deref, DerefMut};

use strata_core::SafePointError;

use crate::stack::MemoryStack;

/// A checkpoint requiring balanced push/pop before it closes.
///
/// Snapshots the stack pointer and live count on open. `close` (or
/// drop) verifies both still match; a mismatch means some caller broke
/// LIFO discipline. Dropping an unbalanced safe point panics, because
/// continuing would hand later allocations a corrupted cursor.
pub struct SafePoint<'a> {
    stack: &'a mut MemoryStack,
    saved_cursor: usize,
    saved_count: usize,
    closed: bool,
}

impl<'a> SafePoint<'a> {
    pub(crate) fn open(stack: &'a mut MemoryStack) -> Self {
        let saved_cursor = stack.cursor();
        let saved_count = stack.struct_count();
        Self {
            stack,
            saved_cursor,
            saved_count,
            closed: false,
        }
    }

    /// Verify the stack is back where this point opened it.
    pub fn close(mut self) -> Result<(), SafePointError> {
        self.closed = true;
        self.check()
    }

    fn check(&self) -> Result<(), SafePointError> {
        if self.stack.cursor() == self.saved_cursor
            && self.stack.struct_count() == self.saved_count
        {
            return Ok(());
        }
        Err(self.stack.checkpoint_error(self.saved_cursor, self.saved_count))
    }
}

impl Deref for SafePoint<'_> {
    type Target = MemoryStack;

    fn deref(&self) -> &MemoryStack {
        self.stack
    }
}

impl DerefMut for SafePoint<'_> {
    fn deref_mut(&mut self) -> &mut MemoryStack {
        self.stack
    }
}

impl Drop for SafePoint<'_> {
    fn drop(&mut self) {
        if self.closed || std::thread::panicking() {
            return;
        }
        if let Err(err) = self.check() {
            panic!("safe point dropped unbalanced: {err}");
        }
    }
}

/// A checkpoint that pops everything pushed through it.
///
/// On close (or drop) every value pushed after the point opened is
/// popped, restoring the snapshot. Popping *below* the snapshot is
/// still a discipline violation and fails the close.
pub struct PopPoint<'a> {
    stack: &'a mut MemoryStack,
    saved_cursor: usize,
    saved_count: usize,
    closed: bool,
}

impl<'a> PopPoint<'a> {
    pub(crate) fn open(stack: &'a mut MemoryStack) -> Self {
        let saved_cursor = stack.cursor();
        let saved_count = stack.struct_count();
        Self {
            stack,
            saved_cursor,
            saved_count,
            closed: false,
        }
    }

    /// Pop back to the snapshot and verify the result.
    pub fn close(mut self) -> Result<(), SafePointError> {
        self.closed = true;
        self.unwind()
    }

    fn unwind(&mut self) -> Result<(), SafePointError> {
        if self.stack.struct_count() < self.saved_count {
            return Err(self.stack.checkpoint_error(self.saved_cursor, self.saved_count));
        }
        while self.stack.struct_count() > self.saved_count {
            self.stack.pop()?;
        }
        // The count alone cannot prove balance: a pop below the snapshot
        // followed by a fresh push restores the count while the cursor
        // is wrong and an old view aliases the re-pushed bytes.
        if self.stack.cursor() != self.saved_cursor {
            return Err(self.stack.checkpoint_error(self.saved_cursor, self.saved_count));
        }
        Ok(())
    }
}

impl Deref for PopPoint<'_> {
    type Target = MemoryStack;

    fn deref(&self) -> &MemoryStack {
        self.stack
    }
}

impl DerefMut for PopPoint<'_> {
    fn deref_mut(&mut self) -> &mut MemoryStack {
        self.stack
    }
}

impl Drop for PopPoint<'_> {
    fn drop(&mut self) {
        if self.closed || std::thread::panicking() {
            return;
        }
        if let Err(err) = self.unwind() {
            panic!("pop point dropped unbalanced: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_core::{Abi, NativeType};
    use strata_layout::Shape;

    fn u32_shape() -> Arc<Shape> {
        Shape::primitive(NativeType::U32, Abi::Lp64)
    }

    #[test]
    fn balanced_safe_point_closes_clean() {
        let mut stack = MemoryStack::new(256);
        let mut point = stack.safe_point();
        let s = point.push_struct(&u32_shape()).unwrap();
        s.set_u32("", 3).unwrap();
        point.pop().unwrap();
        point.close().unwrap();
        assert_eq!(stack.used(), 0);
    }

    #[test]
    fn unbalanced_safe_point_close_reports_mismatch() {
        let mut stack = MemoryStack::new(256);
        let mut point = stack.safe_point();
        point.push_struct(&u32_shape()).unwrap();
        let err = point.close().unwrap_err();
        match err {
            SafePointError::Mismatch {
                expected_count,
                actual_count,
                expected_pointer,
                actual_pointer,
            } => {
                assert_eq!(expected_count, 0);
                assert_eq!(actual_count, 1);
                assert_eq!(actual_pointer, expected_pointer + 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    #[should_panic(expected = "safe point dropped unbalanced")]
    fn unbalanced_safe_point_drop_panics() {
        let mut stack = MemoryStack::new(256);
        let mut point = stack.safe_point();
        point.push_struct(&u32_shape()).unwrap();
        // Dropped without close or pop.
    }

    #[test]
    fn pop_point_restores_all_pushes() {
        let mut stack = MemoryStack::new(1024);
        let outer = stack.push_struct(&u32_shape()).unwrap();
        outer.set_u32("", 7).unwrap();
        let base = stack.stack_pointer();
        {
            let mut point = stack.pop_point();
            for _ in 0..5 {
                point.push_struct(&u32_shape()).unwrap();
            }
            point.close().unwrap();
        }
        assert_eq!(stack.stack_pointer(), base);
        assert_eq!(stack.struct_count(), 1);
        assert_eq!(outer.get_u32("").unwrap(), 7);
    }

    #[test]
    fn pop_point_drop_restores_without_close() {
        let mut stack = MemoryStack::new(1024);
        {
            let mut point = stack.pop_point();
            point.push_struct(&u32_shape()).unwrap();
            point.push_str("scratch").unwrap();
        }
        assert_eq!(stack.used(), 0);
        assert_eq!(stack.struct_count(), 0);
    }

    #[test]
    fn pop_point_detects_pop_below_snapshot() {
        let mut stack = MemoryStack::new(256);
        stack.push_struct(&u32_shape()).unwrap();
        let mut point = stack.pop_point();
        point.pop().unwrap();
        let err = point.close().unwrap_err();
        assert!(matches!(err, SafePointError::Mismatch { .. }));
    }

    #[test]
    fn pop_point_detects_pop_below_masked_by_repush() {
        // A pop below the snapshot followed by a fresh push restores the
        // count but not the cursor; the close must still fail.
        let mut stack = MemoryStack::new(256);
        stack.push_struct(&u32_shape()).unwrap();
        let mut point = stack.pop_point();
        point.pop().unwrap();
        point
            .push_struct(&Shape::primitive(NativeType::U64, Abi::Lp64))
            .unwrap();
        let err = point.close().unwrap_err();
        match err {
            SafePointError::Mismatch {
                expected_count,
                actual_count,
                expected_pointer,
                actual_pointer,
            } => {
                assert_eq!(expected_count, 1);
                assert_eq!(actual_count, 1);
                // u32 snapshot ends at 4, the u64 replacement at 8.
                assert_eq!(actual_pointer, expected_pointer + 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn points_nest() {
        let mut stack = MemoryStack::new(1024);
        let mut outer = stack.safe_point();
        outer.push_struct(&u32_shape()).unwrap();
        {
            let mut inner = outer.pop_point();
            inner.push_struct(&u32_shape()).unwrap();
            inner.push_struct(&u32_shape()).unwrap();
            inner.close().unwrap();
        }
        outer.pop().unwrap();
        outer.close().unwrap();
    }
}
