//! Fixed-size pointer views: raw addresses stored in a structure.
//!
//! [`Pointer64`] and [`Pointer32`] are 8- and 4-byte structures whose
//! stored bits are a raw address; `0` denotes null. [`TypedPointer64`]
//! is bit-identical to `Pointer64` and adds only a compile-time tag —
//! there is no extra runtime state.

use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use strata_core::{AccessError, Abi, LifecycleError, NativeType, OverflowError};

use crate::block::SharedBlock;
use crate::shape::Shape;
use crate::structure::Structure;
use crate::view::View;

fn u64_shape() -> Arc<Shape> {
    static SHAPE: OnceLock<Arc<Shape>> = OnceLock::new();
    // Always 8 bytes regardless of the active ABI.
    Arc::clone(SHAPE.get_or_init(|| Shape::primitive(NativeType::U64, Abi::Lp64)))
}

fn u32_shape() -> Arc<Shape> {
    static SHAPE: OnceLock<Arc<Shape>> = OnceLock::new();
    Arc::clone(SHAPE.get_or_init(|| Shape::primitive(NativeType::U32, Abi::Lp64)))
}

/// An 8-byte structure holding a raw 64-bit address.
#[derive(Clone, Debug)]
pub struct Pointer64 {
    inner: Structure,
}

impl Pointer64 {
    /// Create an unallocated pointer view.
    pub fn new() -> Self {
        Self {
            inner: Structure::new(u64_shape()),
        }
    }

    /// Allocate a fresh 8-byte block for this pointer.
    pub fn allocate(&mut self) -> Result<(), LifecycleError> {
        self.inner.allocate()
    }

    /// Bind this pointer into `block` at `offset` (8-aligned).
    pub fn claim(&mut self, block: &SharedBlock, offset: usize) -> Result<(), AccessError> {
        self.inner.claim(block, offset)
    }

    /// The stored address.
    pub fn get(&self) -> Result<usize, AccessError> {
        Ok(self.inner.get_u64("")? as usize)
    }

    /// Store an address.
    pub fn set(&self, address: usize) -> Result<(), AccessError> {
        self.inner.set_u64("", address as u64)
    }

    /// Whether the stored address is 0.
    pub fn is_null(&self) -> Result<bool, AccessError> {
        Ok(self.inner.get_u64("")? == 0)
    }
}

impl Default for Pointer64 {
    fn default() -> Self {
        Self::new()
    }
}

impl View for Pointer64 {
    fn shape(&self) -> &Arc<Shape> {
        self.inner.shape()
    }

    fn address(&self) -> Result<usize, LifecycleError> {
        View::address(&self.inner)
    }
}

/// A 4-byte structure holding a raw 32-bit address.
#[derive(Clone, Debug)]
pub struct Pointer32 {
    inner: Structure,
}

impl Pointer32 {
    /// Create an unallocated pointer view.
    pub fn new() -> Self {
        Self {
            inner: Structure::new(u32_shape()),
        }
    }

    /// Allocate a fresh 4-byte block for this pointer.
    pub fn allocate(&mut self) -> Result<(), LifecycleError> {
        self.inner.allocate()
    }

    /// Bind this pointer into `block` at `offset` (4-aligned).
    pub fn claim(&mut self, block: &SharedBlock, offset: usize) -> Result<(), AccessError> {
        self.inner.claim(block, offset)
    }

    /// The stored address, zero-extended.
    pub fn get(&self) -> Result<usize, AccessError> {
        Ok(self.inner.get_u32("")? as usize)
    }

    /// Store an address. Addresses above `u32::MAX` fail with an
    /// overflow error before any byte is written.
    pub fn set(&self, address: usize) -> Result<(), AccessError> {
        let narrow = u32::try_from(address).map_err(|_| OverflowError::ValueOutOfRange {
            value: address as i128,
            ty: NativeType::U32,
        })?;
        self.inner.set_u32("", narrow)
    }

    /// Whether the stored address is 0.
    pub fn is_null(&self) -> Result<bool, AccessError> {
        Ok(self.inner.get_u32("")? == 0)
    }
}

impl Default for Pointer32 {
    fn default() -> Self {
        Self::new()
    }
}

impl View for Pointer32 {
    fn shape(&self) -> &Arc<Shape> {
        self.inner.shape()
    }

    fn address(&self) -> Result<usize, LifecycleError> {
        View::address(&self.inner)
    }
}

/// A [`Pointer64`] carrying a phantom target type.
///
/// `set_target` stores the target view's address, or 0 when the target
/// is absent or not yet bound. Purely a compile-time aid: the stored
/// bits are identical to an untyped `Pointer64`.
#[derive(Clone, Debug)]
pub struct TypedPointer64<T: View> {
    ptr: Pointer64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: View> TypedPointer64<T> {
    /// Create an unallocated typed pointer.
    pub fn new() -> Self {
        Self {
            ptr: Pointer64::new(),
            _marker: PhantomData,
        }
    }

    /// Allocate a fresh 8-byte block for this pointer.
    pub fn allocate(&mut self) -> Result<(), LifecycleError> {
        self.ptr.allocate()
    }

    /// Bind this pointer into `block` at `offset` (8-aligned).
    pub fn claim(&mut self, block: &SharedBlock, offset: usize) -> Result<(), AccessError> {
        self.ptr.claim(block, offset)
    }

    /// The stored address.
    pub fn get(&self) -> Result<usize, AccessError> {
        self.ptr.get()
    }

    /// Whether the stored address is 0.
    pub fn is_null(&self) -> Result<bool, AccessError> {
        self.ptr.is_null()
    }

    /// Store the target's address, or 0 when the target is `None` or
    /// has no address yet (unbound).
    pub fn set_target(&self, target: Option<&T>) -> Result<(), AccessError> {
        let address = match target {
            Some(t) => t.address().unwrap_or(0),
            None => 0,
        };
        self.ptr.set(address)
    }
}

impl<T: View> Default for TypedPointer64<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: View> View for TypedPointer64<T> {
    fn shape(&self) -> &Arc<Shape> {
        View::shape(&self.ptr)
    }

    fn address(&self) -> Result<usize, LifecycleError> {
        View::address(&self.ptr)
    }
}
