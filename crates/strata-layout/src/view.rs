//! The seam between buffer-backed views and their consumers.

use std::sync::Arc;

use strata_core::LifecycleError;

use crate::shape::Shape;

/// A buffer-backed view with a declared shape.
///
/// Implemented by [`Structure`](crate::Structure),
/// [`StructureArray`](crate::StructureArray), and the pointer views.
/// This is the interface the arena and [`TypedPointer64`](crate::TypedPointer64)
/// consume: storage requirements for embedding, and the raw address for
/// a foreign call.
pub trait View {
    /// The immutable layout tree backing this view.
    fn shape(&self) -> &Arc<Shape>;

    /// Absolute address of the view's first byte.
    ///
    /// Fails with [`LifecycleError::NotBound`] before `allocate`/`claim`,
    /// or [`LifecycleError::Reclaimed`] after the backing region was
    /// popped off its arena.
    fn address(&self) -> Result<usize, LifecycleError>;

    /// Bytes required to embed this view in a larger structure.
    fn required_size(&self) -> usize {
        self.shape().size()
    }

    /// Alignment required by this view.
    fn alignment(&self) -> usize {
        self.shape().alignment()
    }
}
