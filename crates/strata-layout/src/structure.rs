//! The runtime structure view: a shape bound to a region of a block.
//!
//! A [`Structure`] starts unallocated. `allocate()` makes it the
//! most-parent of a fresh, correctly sized and aligned [`Block`];
//! `claim()` binds it as a non-owning view into an ancestor's block at a
//! fixed absolute offset. Either transition happens exactly once; the
//! shape (size, offsets) is immutable afterwards, only field *values*
//! change.
//!
//! Child views derived via [`Structure::child`] share the root's block
//! and its [`ModTracker`], so a write through any descendant is recorded
//! against the root and drained by one `handle_modifications` call.

use std::sync::Arc;

use strata_core::{AccessError, BoundsError, LifecycleError, NativeType, OverflowError};

use crate::block::{Block, SharedBlock};
use crate::shape::Shape;
use crate::track::{DirtyRange, ModTracker};
use crate::view::View;

/// The bound half of a structure's lifecycle: block, offset, tracker.
#[derive(Clone, Debug)]
pub(crate) struct Binding {
    pub(crate) block: SharedBlock,
    /// Absolute offset of this view within the block.
    pub(crate) offset: usize,
    /// Dirty-range tracker, shared across the whole tree.
    pub(crate) tracker: Arc<ModTracker>,
    /// Absolute offset of the tracking root (ranges are root-relative).
    pub(crate) track_base: usize,
    /// Size of the tracking root (whole-structure fallback length).
    pub(crate) track_len: usize,
}

/// A composite value backed directly by a byte buffer.
#[derive(Clone, Debug)]
pub struct Structure {
    shape: Arc<Shape>,
    /// Fixed at construction; applied when this instance becomes a root.
    track_writes: bool,
    binding: Option<Binding>,
}

impl Structure {
    /// Create an unallocated structure with per-range tracking disabled.
    pub fn new(shape: Arc<Shape>) -> Self {
        Self {
            shape,
            track_writes: false,
            binding: None,
        }
    }

    /// Create an unallocated structure that records per-range dirty data
    /// once it is bound as a root.
    pub fn new_tracked(shape: Arc<Shape>) -> Self {
        Self {
            shape,
            track_writes: true,
            binding: None,
        }
    }

    /// Whether `allocate`/`claim` has happened.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Allocate a fresh owned block sized and aligned for this shape.
    ///
    /// The structure becomes the most-parent: the buffer lives as long
    /// as any view derived from it.
    pub fn allocate(&mut self) -> Result<(), LifecycleError> {
        if self.binding.is_some() {
            return Err(LifecycleError::AlreadyBound);
        }
        let block = Block::new(self.shape.size());
        self.binding = Some(Binding {
            block,
            offset: 0,
            tracker: Arc::new(ModTracker::new(self.track_writes)),
            track_base: 0,
            track_len: self.shape.size(),
        });
        Ok(())
    }

    /// Bind this structure as a view into `block` at an absolute offset,
    /// recorded permanently.
    ///
    /// The offset must satisfy the shape's alignment and the region must
    /// fit the block. This instance becomes a tracking root for its
    /// subtree.
    pub fn claim(&mut self, block: &SharedBlock, offset: usize) -> Result<(), AccessError> {
        if self.binding.is_some() {
            return Err(LifecycleError::AlreadyBound.into());
        }
        if offset % self.shape.alignment() != 0 {
            return Err(BoundsError::MisalignedOffset {
                offset,
                alignment: self.shape.alignment(),
            }
            .into());
        }
        block.check_range(offset, self.shape.size())?;
        self.binding = Some(Binding {
            block: Arc::clone(block),
            offset,
            tracker: Arc::new(ModTracker::new(self.track_writes)),
            track_base: offset,
            track_len: self.shape.size(),
        });
        Ok(())
    }

    /// The immutable layout tree.
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Bytes required to embed this structure in a parent.
    pub fn required_size(&self) -> usize {
        self.shape.size()
    }

    /// Required alignment.
    pub fn alignment(&self) -> usize {
        self.shape.alignment()
    }

    /// Absolute address of the structure's first byte (for foreign calls).
    pub fn address(&self) -> Result<usize, LifecycleError> {
        let b = self.bound()?;
        b.block.check_live(b.offset, self.shape.size())?;
        Ok(b.block.address() + b.offset)
    }

    /// Derive the claimed view of a declared child field.
    ///
    /// O(1): the child's absolute offset is the parent offset plus the
    /// offset computed at shape build. The child shares the root's block
    /// and tracker.
    pub fn child(&self, name: &str) -> Result<Structure, AccessError> {
        let b = self.bound()?;
        let field = self
            .shape
            .field(name)
            .ok_or_else(|| AccessError::UnknownField {
                name: name.to_string(),
            })?;
        Ok(Structure {
            shape: Arc::clone(&field.shape),
            track_writes: self.track_writes,
            binding: Some(Binding {
                block: Arc::clone(&b.block),
                offset: b.offset + field.offset,
                tracker: Arc::clone(&b.tracker),
                track_base: b.track_base,
                track_len: b.track_len,
            }),
        })
    }

    /// Snapshot the structure's bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AccessError> {
        let b = self.bound()?;
        b.block.check_live(b.offset, self.shape.size())?;
        Ok(b.block.to_vec(b.offset, self.shape.size())?)
    }

    /// Overwrite the whole structure from `src` (must be exactly sized).
    pub fn copy_from_slice(&self, src: &[u8]) -> Result<(), AccessError> {
        if src.len() != self.shape.size() {
            return Err(BoundsError::RegionOutOfRange {
                offset: 0,
                len: src.len(),
                capacity: self.shape.size(),
            }
            .into());
        }
        let start = self.bound()?.offset;
        self.write_raw(start, src)
    }

    /// Whether any byte changed since the last drain.
    pub fn is_modified(&self) -> Result<bool, LifecycleError> {
        Ok(self.bound()?.tracker.is_modified())
    }

    /// Drain dirty ranges (root-relative, ascending) through `handler`.
    ///
    /// Returns `false` without invoking the handler when nothing is
    /// dirty. Must not be called concurrently with itself on views of
    /// the same root.
    pub fn handle_modifications<F: FnMut(DirtyRange)>(
        &self,
        handler: F,
    ) -> Result<bool, LifecycleError> {
        let b = self.bound()?;
        Ok(b.tracker.drain(b.track_len, handler))
    }

    // ---- typed field access -------------------------------------------

    /// Read an unsigned 8-bit field.
    pub fn get_u8(&self, name: &str) -> Result<u8, AccessError> {
        Ok(u8::from_ne_bytes(self.read_field(name, NativeType::U8)?))
    }

    /// Write an unsigned 8-bit field.
    pub fn set_u8(&self, name: &str, value: u8) -> Result<(), AccessError> {
        self.write_field(name, NativeType::U8, &value.to_ne_bytes())
    }

    /// Read a signed 8-bit field.
    pub fn get_i8(&self, name: &str) -> Result<i8, AccessError> {
        Ok(i8::from_ne_bytes(self.read_field(name, NativeType::I8)?))
    }

    /// Write a signed 8-bit field.
    pub fn set_i8(&self, name: &str, value: i8) -> Result<(), AccessError> {
        self.write_field(name, NativeType::I8, &value.to_ne_bytes())
    }

    /// Read an unsigned 16-bit field.
    pub fn get_u16(&self, name: &str) -> Result<u16, AccessError> {
        Ok(u16::from_ne_bytes(self.read_field(name, NativeType::U16)?))
    }

    /// Write an unsigned 16-bit field.
    pub fn set_u16(&self, name: &str, value: u16) -> Result<(), AccessError> {
        self.write_field(name, NativeType::U16, &value.to_ne_bytes())
    }

    /// Read a signed 16-bit field.
    pub fn get_i16(&self, name: &str) -> Result<i16, AccessError> {
        Ok(i16::from_ne_bytes(self.read_field(name, NativeType::I16)?))
    }

    /// Write a signed 16-bit field.
    pub fn set_i16(&self, name: &str, value: i16) -> Result<(), AccessError> {
        self.write_field(name, NativeType::I16, &value.to_ne_bytes())
    }

    /// Read an unsigned 32-bit field.
    pub fn get_u32(&self, name: &str) -> Result<u32, AccessError> {
        Ok(u32::from_ne_bytes(self.read_field(name, NativeType::U32)?))
    }

    /// Write an unsigned 32-bit field.
    pub fn set_u32(&self, name: &str, value: u32) -> Result<(), AccessError> {
        self.write_field(name, NativeType::U32, &value.to_ne_bytes())
    }

    /// Read a signed 32-bit field.
    pub fn get_i32(&self, name: &str) -> Result<i32, AccessError> {
        Ok(i32::from_ne_bytes(self.read_field(name, NativeType::I32)?))
    }

    /// Write a signed 32-bit field.
    pub fn set_i32(&self, name: &str, value: i32) -> Result<(), AccessError> {
        self.write_field(name, NativeType::I32, &value.to_ne_bytes())
    }

    /// Read an unsigned 64-bit field.
    pub fn get_u64(&self, name: &str) -> Result<u64, AccessError> {
        Ok(u64::from_ne_bytes(self.read_field(name, NativeType::U64)?))
    }

    /// Write an unsigned 64-bit field.
    pub fn set_u64(&self, name: &str, value: u64) -> Result<(), AccessError> {
        self.write_field(name, NativeType::U64, &value.to_ne_bytes())
    }

    /// Read a signed 64-bit field.
    pub fn get_i64(&self, name: &str) -> Result<i64, AccessError> {
        Ok(i64::from_ne_bytes(self.read_field(name, NativeType::I64)?))
    }

    /// Write a signed 64-bit field.
    pub fn set_i64(&self, name: &str, value: i64) -> Result<(), AccessError> {
        self.write_field(name, NativeType::I64, &value.to_ne_bytes())
    }

    /// Read a single-precision float field.
    pub fn get_f32(&self, name: &str) -> Result<f32, AccessError> {
        Ok(f32::from_ne_bytes(self.read_field(name, NativeType::F32)?))
    }

    /// Write a single-precision float field.
    pub fn set_f32(&self, name: &str, value: f32) -> Result<(), AccessError> {
        self.write_field(name, NativeType::F32, &value.to_ne_bytes())
    }

    /// Read a double-precision float field.
    pub fn get_f64(&self, name: &str) -> Result<f64, AccessError> {
        Ok(f64::from_ne_bytes(self.read_field(name, NativeType::F64)?))
    }

    /// Write a double-precision float field.
    pub fn set_f64(&self, name: &str, value: f64) -> Result<(), AccessError> {
        self.write_field(name, NativeType::F64, &value.to_ne_bytes())
    }

    /// Read a `Pointer`-typed field as an address.
    pub fn get_address(&self, name: &str) -> Result<usize, AccessError> {
        let (ty, abs, m) = self.prim_field(name)?;
        if ty != NativeType::Pointer {
            return Err(AccessError::TypeMismatch {
                field: name.to_string(),
                expected: Some(NativeType::Pointer),
            });
        }
        match m {
            4 => {
                let mut raw = [0u8; 4];
                self.read_raw(abs, &mut raw)?;
                Ok(u32::from_ne_bytes(raw) as usize)
            }
            _ => {
                let mut raw = [0u8; 8];
                self.read_raw(abs, &mut raw)?;
                Ok(u64::from_ne_bytes(raw) as usize)
            }
        }
    }

    /// Write a `Pointer`-typed field from an address.
    pub fn set_address(&self, name: &str, address: usize) -> Result<(), AccessError> {
        let (ty, abs, m) = self.prim_field(name)?;
        if ty != NativeType::Pointer {
            return Err(AccessError::TypeMismatch {
                field: name.to_string(),
                expected: Some(NativeType::Pointer),
            });
        }
        match m {
            4 => {
                let narrow = u32::try_from(address).map_err(|_| {
                    OverflowError::ValueOutOfRange {
                        value: address as i128,
                        ty: NativeType::Pointer,
                    }
                })?;
                self.write_raw(abs, &narrow.to_ne_bytes())
            }
            _ => self.write_raw(abs, &(address as u64).to_ne_bytes()),
        }
    }

    /// Write any integer field with checked narrowing.
    ///
    /// A value too wide for the target type (e.g. a 64-bit value into an
    /// `i16` field) fails with [`OverflowError::ValueOutOfRange`] before
    /// any byte is written.
    pub fn set_int(&self, name: &str, value: i64) -> Result<(), AccessError> {
        self.set_int_wide(name, value as i128)
    }

    /// Write any integer field from an unsigned value, checked.
    pub fn set_uint(&self, name: &str, value: u64) -> Result<(), AccessError> {
        self.set_int_wide(name, value as i128)
    }

    /// Read any integer field, sign- or zero-extended to `i64`.
    ///
    /// `u64` fields above `i64::MAX` fail with an overflow error; use
    /// [`Structure::get_u64`] for those.
    pub fn get_int(&self, name: &str) -> Result<i64, AccessError> {
        let (ty, abs, m) = self.prim_field(name)?;
        if !ty.is_integer() {
            return Err(AccessError::TypeMismatch {
                field: name.to_string(),
                expected: None,
            });
        }
        let wide: i128 = match (ty, m) {
            (NativeType::I8, _) => {
                let mut b = [0u8; 1];
                self.read_raw(abs, &mut b)?;
                i8::from_ne_bytes(b) as i128
            }
            (NativeType::I16, _) => {
                let mut b = [0u8; 2];
                self.read_raw(abs, &mut b)?;
                i16::from_ne_bytes(b) as i128
            }
            (NativeType::I32, _) => {
                let mut b = [0u8; 4];
                self.read_raw(abs, &mut b)?;
                i32::from_ne_bytes(b) as i128
            }
            (NativeType::I64, _) => {
                let mut b = [0u8; 8];
                self.read_raw(abs, &mut b)?;
                i64::from_ne_bytes(b) as i128
            }
            (NativeType::U8, _) => {
                let mut b = [0u8; 1];
                self.read_raw(abs, &mut b)?;
                b[0] as i128
            }
            (NativeType::U16, _) => {
                let mut b = [0u8; 2];
                self.read_raw(abs, &mut b)?;
                u16::from_ne_bytes(b) as i128
            }
            (NativeType::U32, _) => {
                let mut b = [0u8; 4];
                self.read_raw(abs, &mut b)?;
                u32::from_ne_bytes(b) as i128
            }
            (_, 4) => {
                let mut b = [0u8; 4];
                self.read_raw(abs, &mut b)?;
                u32::from_ne_bytes(b) as i128
            }
            _ => {
                let mut b = [0u8; 8];
                self.read_raw(abs, &mut b)?;
                u64::from_ne_bytes(b) as i128
            }
        };
        i64::try_from(wide).map_err(|_| {
            OverflowError::ValueOutOfRange { value: wide, ty }.into()
        })
    }

    // ---- internals ----------------------------------------------------

    fn set_int_wide(&self, name: &str, value: i128) -> Result<(), AccessError> {
        let (ty, abs, m) = self.prim_field(name)?;
        let (lo, hi) = ty
            .int_range(self.shape.abi())
            .ok_or_else(|| AccessError::TypeMismatch {
                field: name.to_string(),
                expected: None,
            })?;
        if value < lo || value > hi {
            return Err(OverflowError::ValueOutOfRange { value, ty }.into());
        }
        // Range-checked, so truncating two's-complement casts are exact.
        match m {
            1 => self.write_raw(abs, &(value as u8).to_ne_bytes()),
            2 => self.write_raw(abs, &(value as u16).to_ne_bytes()),
            4 => self.write_raw(abs, &(value as u32).to_ne_bytes()),
            _ => self.write_raw(abs, &(value as u64).to_ne_bytes()),
        }
    }

    /// Resolve a primitive field: its type, absolute offset, and width.
    fn prim_field(&self, name: &str) -> Result<(NativeType, usize, usize), AccessError> {
        let b = self.bound()?;
        // A primitive shape exposes itself as the pseudo-field "" so the
        // pointer views can reuse the typed accessors.
        if name.is_empty() {
            if let Some(ty) = self.shape.as_primitive() {
                return Ok((ty, b.offset, self.shape.size()));
            }
        }
        let field = self
            .shape
            .field(name)
            .ok_or_else(|| AccessError::UnknownField {
                name: name.to_string(),
            })?;
        let ty = field
            .shape
            .as_primitive()
            .ok_or_else(|| AccessError::TypeMismatch {
                field: name.to_string(),
                expected: None,
            })?;
        Ok((ty, b.offset + field.offset, field.shape.size()))
    }

    fn read_field<const N: usize>(
        &self,
        name: &str,
        expected: NativeType,
    ) -> Result<[u8; N], AccessError> {
        let (ty, abs, _) = self.prim_field(name)?;
        if ty != expected {
            return Err(AccessError::TypeMismatch {
                field: name.to_string(),
                expected: Some(expected),
            });
        }
        let mut out = [0u8; N];
        self.read_raw(abs, &mut out)?;
        Ok(out)
    }

    fn write_field(
        &self,
        name: &str,
        expected: NativeType,
        bytes: &[u8],
    ) -> Result<(), AccessError> {
        let (ty, abs, _) = self.prim_field(name)?;
        if ty != expected {
            return Err(AccessError::TypeMismatch {
                field: name.to_string(),
                expected: Some(expected),
            });
        }
        self.write_raw(abs, bytes)
    }

    /// Bounds- and liveness-checked read at an absolute block offset.
    fn read_raw(&self, abs: usize, out: &mut [u8]) -> Result<(), AccessError> {
        let b = self.bound()?;
        b.block.check_live(abs, out.len())?;
        b.block.read_into(abs, out)?;
        Ok(())
    }

    /// Bounds- and liveness-checked write at an absolute block offset;
    /// records the dirty range root-relative.
    fn write_raw(&self, abs: usize, data: &[u8]) -> Result<(), AccessError> {
        let b = self.bound()?;
        b.block.check_live(abs, data.len())?;
        b.block.write(abs, data)?;
        b.tracker.record(abs - b.track_base, data.len());
        Ok(())
    }

    pub(crate) fn bound(&self) -> Result<&Binding, LifecycleError> {
        self.binding.as_ref().ok_or(LifecycleError::NotBound)
    }

    /// Internal constructor for derived views (arrays, children).
    pub(crate) fn from_binding(
        shape: Arc<Shape>,
        track_writes: bool,
        binding: Binding,
    ) -> Self {
        Self {
            shape,
            track_writes,
            binding: Some(binding),
        }
    }

    pub(crate) fn track_writes(&self) -> bool {
        self.track_writes
    }
}

impl View for Structure {
    fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    fn address(&self) -> Result<usize, LifecycleError> {
        Structure::address(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeBuilder;
    use strata_core::Abi;

    fn header_shape() -> Arc<Shape> {
        ShapeBuilder::sequential(Abi::Lp64)
            .primitive("a", NativeType::I32)
            .primitive("b", NativeType::I8)
            .primitive("c", NativeType::I32)
            .build()
            .unwrap()
    }

    #[test]
    fn access_before_bind_fails() {
        let s = Structure::new(header_shape());
        assert!(matches!(
            s.get_i32("a"),
            Err(AccessError::Lifecycle(LifecycleError::NotBound))
        ));
        assert!(matches!(s.address(), Err(LifecycleError::NotBound)));
    }

    #[test]
    fn double_allocate_fails() {
        let mut s = Structure::new(header_shape());
        s.allocate().unwrap();
        assert!(matches!(s.allocate(), Err(LifecycleError::AlreadyBound)));
    }

    #[test]
    fn claim_after_allocate_fails() {
        let mut s = Structure::new(header_shape());
        s.allocate().unwrap();
        let block = Block::new(64);
        assert!(matches!(
            s.claim(&block, 0),
            Err(AccessError::Lifecycle(LifecycleError::AlreadyBound))
        ));
    }

    #[test]
    fn field_round_trip() {
        let mut s = Structure::new(header_shape());
        s.allocate().unwrap();
        s.set_i32("a", -7).unwrap();
        s.set_i8("b", 42).unwrap();
        s.set_i32("c", 123_456).unwrap();
        assert_eq!(s.get_i32("a").unwrap(), -7);
        assert_eq!(s.get_i8("b").unwrap(), 42);
        assert_eq!(s.get_i32("c").unwrap(), 123_456);
    }

    #[test]
    fn unknown_field_and_type_mismatch() {
        let mut s = Structure::new(header_shape());
        s.allocate().unwrap();
        assert!(matches!(
            s.get_i32("nope"),
            Err(AccessError::UnknownField { .. })
        ));
        assert!(matches!(
            s.get_u64("a"),
            Err(AccessError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn set_int_checks_width() {
        let shape = ShapeBuilder::sequential(Abi::Lp64)
            .primitive("narrow", NativeType::I16)
            .build()
            .unwrap();
        let mut s = Structure::new(shape);
        s.allocate().unwrap();
        s.set_int("narrow", 32_000).unwrap();
        assert_eq!(s.get_int("narrow").unwrap(), 32_000);
        let err = s.set_int("narrow", 70_000).unwrap_err();
        assert!(matches!(
            err,
            AccessError::Overflow(OverflowError::ValueOutOfRange { .. })
        ));
        // Failed write mutated nothing.
        assert_eq!(s.get_int("narrow").unwrap(), 32_000);
    }

    #[test]
    fn set_int_rejects_negative_for_unsigned() {
        let shape = ShapeBuilder::sequential(Abi::Lp64)
            .primitive("n", NativeType::U32)
            .build()
            .unwrap();
        let mut s = Structure::new(shape);
        s.allocate().unwrap();
        assert!(s.set_int("n", -1).is_err());
        s.set_uint("n", u32::MAX as u64).unwrap();
        assert_eq!(s.get_u32("n").unwrap(), u32::MAX);
    }

    #[test]
    fn child_view_shares_buffer() {
        let inner = ShapeBuilder::sequential(Abi::Lp64)
            .primitive("x", NativeType::F32)
            .primitive("y", NativeType::F32)
            .build()
            .unwrap();
        let outer = ShapeBuilder::sequential(Abi::Lp64)
            .primitive("tag", NativeType::U8)
            .nested("point", inner)
            .build()
            .unwrap();
        let mut s = Structure::new(outer);
        s.allocate().unwrap();
        let point = s.child("point").unwrap();
        point.set_f32("x", 1.5).unwrap();
        point.set_f32("y", -2.5).unwrap();
        // Same bytes visible through a second derived view.
        let again = s.child("point").unwrap();
        assert_eq!(again.get_f32("x").unwrap(), 1.5);
        assert_eq!(again.get_f32("y").unwrap(), -2.5);
        // Child offset: tag at 0, point aligned to 4.
        assert_eq!(
            again.address().unwrap(),
            s.address().unwrap() + 4
        );
    }

    #[test]
    fn union_members_alias() {
        let shape = ShapeBuilder::overlapping(Abi::Lp64)
            .primitive("as_u32", NativeType::U32)
            .primitive("as_f32", NativeType::F32)
            .build()
            .unwrap();
        let mut s = Structure::new(shape);
        s.allocate().unwrap();
        s.set_f32("as_f32", 1.0).unwrap();
        assert_eq!(s.get_u32("as_u32").unwrap(), 1.0f32.to_bits());
    }

    #[test]
    fn child_writes_drain_through_root() {
        let inner = ShapeBuilder::sequential(Abi::Lp64)
            .primitive("v", NativeType::U64)
            .build()
            .unwrap();
        let outer = ShapeBuilder::sequential(Abi::Lp64)
            .primitive("head", NativeType::U64)
            .nested("body", inner)
            .build()
            .unwrap();
        let mut s = Structure::new_tracked(outer);
        s.allocate().unwrap();
        s.child("body").unwrap().set_u64("v", 9).unwrap();
        let mut ranges = Vec::new();
        assert!(s.handle_modifications(|r| ranges.push(r)).unwrap());
        assert_eq!(ranges, vec![DirtyRange { start: 8, end: 16 }]);
        assert!(!s.is_modified().unwrap());
    }

    #[test]
    fn untracked_root_reports_whole_structure() {
        let mut s = Structure::new(header_shape());
        s.allocate().unwrap();
        s.set_i8("b", 1).unwrap();
        let mut ranges = Vec::new();
        assert!(s.handle_modifications(|r| ranges.push(r)).unwrap());
        assert_eq!(ranges, vec![DirtyRange { start: 0, end: 12 }]);
    }

    #[test]
    fn to_bytes_and_copy_round_trip() {
        let mut s = Structure::new(header_shape());
        s.allocate().unwrap();
        s.set_i32("a", 0x0102_0304).unwrap();
        let bytes = s.to_bytes().unwrap();
        assert_eq!(bytes.len(), 12);

        let mut t = Structure::new(header_shape());
        t.allocate().unwrap();
        t.copy_from_slice(&bytes).unwrap();
        assert_eq!(t.get_i32("a").unwrap(), 0x0102_0304);

        assert!(t.copy_from_slice(&bytes[..4]).is_err());
    }

    #[test]
    fn claim_validates_alignment_and_bounds() {
        let block = Block::new(64);
        let mut s = Structure::new(header_shape());
        let err = s.claim(&block, 2).unwrap_err();
        assert!(matches!(
            err,
            AccessError::Bounds(BoundsError::MisalignedOffset { offset: 2, alignment: 4 })
        ));
        let err = s.claim(&block, 56).unwrap_err();
        assert!(matches!(
            err,
            AccessError::Bounds(BoundsError::RegionOutOfRange { .. })
        ));
        s.claim(&block, 8).unwrap();
        assert_eq!(s.address().unwrap(), block.address() + 8);
    }

    #[test]
    fn pointer_field_stores_address() {
        let shape = ShapeBuilder::sequential(Abi::Lp64)
            .primitive("next", NativeType::Pointer)
            .build()
            .unwrap();
        let mut s = Structure::new(shape);
        s.allocate().unwrap();
        assert_eq!(s.get_address("next").unwrap(), 0);
        s.set_address("next", 0xDEAD_BEE0).unwrap();
        assert_eq!(s.get_address("next").unwrap(), 0xDEAD_BEE0);
    }
}
