//! Fixed-length contiguous repetition of one element shape.

use std::sync::Arc;

use strata_core::{AccessError, BoundsError, LayoutError, LifecycleError};

use crate::block::SharedBlock;
use crate::shape::Shape;
use crate::structure::Structure;
use crate::view::View;

/// `len` elements of one shape, laid out back to back.
///
/// `element[i].offset = i * element_size`; array alignment equals the
/// element alignment; there is no inter-element padding. The array is a
/// [`Structure`] over an array shape plus typed element access.
#[derive(Clone, Debug)]
pub struct StructureArray {
    inner: Structure,
    element: Arc<Shape>,
    len: usize,
}

impl StructureArray {
    /// Declare an unallocated array of `len` copies of `element`.
    pub fn new(element: Arc<Shape>, len: usize) -> Result<Self, LayoutError> {
        Ok(Self {
            inner: Structure::new(Shape::array(Arc::clone(&element), len)?),
            element,
            len,
        })
    }

    /// Tracked variant: element writes record dirty ranges once the
    /// array is bound as a root.
    pub fn new_tracked(element: Arc<Shape>, len: usize) -> Result<Self, LayoutError> {
        Ok(Self {
            inner: Structure::new_tracked(Shape::array(Arc::clone(&element), len)?),
            element,
            len,
        })
    }

    /// Reinterpret an already-shaped structure as an array view.
    ///
    /// Fails with [`AccessError::TypeMismatch`] unless the structure's
    /// shape is an array.
    pub fn from_structure(inner: Structure) -> Result<Self, AccessError> {
        let (element, len) = match inner.shape().as_array() {
            Some((e, len)) => (Arc::clone(e), len),
            None => {
                return Err(AccessError::TypeMismatch {
                    field: String::new(),
                    expected: None,
                })
            }
        };
        Ok(Self {
            inner,
            element,
            len,
        })
    }

    /// Allocate a fresh owned block for the whole array.
    pub fn allocate(&mut self) -> Result<(), LifecycleError> {
        self.inner.allocate()
    }

    /// Bind the array as a view into `block` at `offset`.
    pub fn claim(&mut self, block: &SharedBlock, offset: usize) -> Result<(), AccessError> {
        self.inner.claim(block, offset)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has no elements (never true — zero-length
    /// arrays are rejected at declaration).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The repeated element shape.
    pub fn element_shape(&self) -> &Arc<Shape> {
        &self.element
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.element.size()
    }

    /// The claimed view of element `i`.
    ///
    /// O(1) — the element offset is a single multiply against the layout
    /// computed at declaration; no per-access recomputation.
    pub fn get(&self, i: usize) -> Result<Structure, AccessError> {
        if i >= self.len {
            return Err(BoundsError::IndexOutOfRange {
                index: i,
                len: self.len,
            }
            .into());
        }
        let b = self.inner.bound()?.clone();
        let mut binding = b;
        binding.offset += i * self.element.size();
        Ok(Structure::from_binding(
            Arc::clone(&self.element),
            self.inner.track_writes(),
            binding,
        ))
    }

    /// Whether any byte changed since the last drain.
    pub fn is_modified(&self) -> Result<bool, LifecycleError> {
        self.inner.is_modified()
    }

    /// Drain dirty ranges; see [`Structure::handle_modifications`].
    pub fn handle_modifications<F: FnMut(crate::track::DirtyRange)>(
        &self,
        handler: F,
    ) -> Result<bool, LifecycleError> {
        self.inner.handle_modifications(handler)
    }

    /// Snapshot the array's bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AccessError> {
        self.inner.to_bytes()
    }
}

impl View for StructureArray {
    fn shape(&self) -> &Arc<Shape> {
        self.inner.shape()
    }

    fn address(&self) -> Result<usize, LifecycleError> {
        View::address(&self.inner)
    }
}
