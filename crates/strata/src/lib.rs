//! Strata: byte-exact native memory layouts and LIFO arena allocation.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Strata sub-crates. For most users, adding `strata` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! // Describe a C struct: { uint32_t id; uint8_t flags; uint32_t count; }.
//! let shape = ShapeBuilder::sequential(Abi::Lp64)
//!     .primitive("id", NativeType::U32)
//!     .primitive("flags", NativeType::U8)
//!     .primitive("count", NativeType::U32)
//!     .build()
//!     .unwrap();
//! assert_eq!(shape.size(), 12); // 4 + 1 + 3 padding + 4
//!
//! // Push an instance onto a scratch arena, fill it, pop it back off.
//! let mut stack = MemoryStack::new(4096);
//! let base = stack.stack_pointer();
//!
//! let s = stack.push_struct(&shape).unwrap();
//! s.set_u32("id", 7).unwrap();
//! s.set_u8("flags", 0x80).unwrap();
//! s.set_u32("count", 1024).unwrap();
//! assert_eq!(s.get_u32("count").unwrap(), 1024);
//!
//! stack.pop().unwrap();
//! assert_eq!(stack.stack_pointer(), base);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strata-core` | ABI model, native types, sizes, error types |
//! | [`layout`] | `strata-layout` | Shapes, structures, arrays, pointers, dirty tracking |
//! | [`arena`] | `strata-arena` | The LIFO memory stack and checkpoint guards |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// ABI model, native types, sizes, and error types (`strata-core`).
///
/// Contains [`types::Abi`], [`types::NativeType`], [`types::MemSize`],
/// and every error enum the other crates return.
pub use strata_core as types;

/// Shapes, structures, arrays, pointers, and dirty tracking
/// (`strata-layout`).
///
/// Build layouts with [`layout::ShapeBuilder`], then bind them to memory
/// through [`layout::Structure`] and [`layout::StructureArray`].
pub use strata_layout as layout;

/// The LIFO memory stack and checkpoint guards (`strata-arena`).
///
/// [`arena::MemoryStack`] hands out regions with strict push/pop
/// discipline; [`arena::SafePoint`] and [`arena::PopPoint`] verify it.
pub use strata_arena as arena;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
///
/// This imports the most frequently used types: the shape builder, the
/// structure views, the memory stack, and the core ABI types.
pub mod prelude {
    // Core ABI model
    pub use strata_core::{Abi, MemSize, NativeType, StructureInfo};

    // Errors
    pub use strata_core::{
        AccessError, BoundsError, LayoutError, LifecycleError, OverflowError, SafePointError,
    };

    // Layout
    pub use strata_layout::{
        DirtyRange, LayoutKind, Pointer32, Pointer64, Shape, ShapeBuilder, Structure,
        StructureArray, TypedPointer64, View,
    };

    // Arena
    pub use strata_arena::{MemoryStack, PopPoint, RawRegion, SafePoint};
}
