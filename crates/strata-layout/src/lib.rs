//! Layout engine for the Strata memory subsystem.
//!
//! Turns ordered field-descriptor lists into deterministic, ABI-consistent
//! byte layouts and provides the runtime views that read and write those
//! layouts in place.
//!
//! # Architecture
//!
//! ```text
//! Shape (immutable layout tree, one per declared shape)
//! ├── StructureInfo (alignment, padded size, compressed flag)
//! └── Field[] (name → Arc<Shape> + relative offset)
//!
//! Structure (runtime view)
//! ├── Arc<Shape> (shared layout facts)
//! ├── Binding → SharedBlock + absolute offset   (set once: allocate/claim)
//! └── Arc<ModTracker> (dirty ranges, shared with every child view)
//! ```
//!
//! A structure is created unallocated and transitions exactly once:
//! `allocate()` makes it the most-parent, owning a fresh aligned block;
//! `claim()` makes it a non-owning view into an ancestor's block at a
//! fixed absolute offset. One physical buffer backs the whole tree.
//!
//! All buffer access is bounds-checked slice arithmetic inside [`Block`] —
//! there is no unchecked address math anywhere in this crate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod block;
pub mod pointer;
pub mod shape;
pub mod structure;
pub mod track;
pub mod view;

pub use array::StructureArray;
pub use block::{Block, SharedBlock};
pub use pointer::{Pointer32, Pointer64, TypedPointer64};
pub use shape::{Field, LayoutKind, Shape, ShapeBuilder, ShapeKind};
pub use structure::Structure;
pub use track::{DirtyRange, ModTracker, SPLIT_THRESHOLD};
pub use view::View;
