//! Core types for the Strata native-memory layout engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the facts everything else is computed from: primitive sizes and
//! alignments per target ABI, the [`MemSize`] value pair, the computed
//! [`StructureInfo`] layout record, and the error taxonomy shared by
//! the layout and arena crates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod abi;
pub mod error;
pub mod info;

pub use abi::{round_up, Abi, MemSize, NativeType, MAX_ALIGNMENT};
pub use error::{
    AccessError, BoundsError, LayoutError, LifecycleError, OverflowError, SafePointError,
};
pub use info::StructureInfo;
