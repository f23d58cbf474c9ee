//! Stack-discipline arena allocation for Strata structures.
//!
//! A [`MemoryStack`] owns one aligned block and hands out regions to
//! structures with strict LIFO push/pop, avoiding per-call allocation
//! for short-lived native-call scratch data.
//!
//! # Architecture
//!
//! ```text
//! MemoryStack
//! ├── SharedBlock (one owned, MAX_ALIGNMENT-based allocation)
//! ├── cursor (bump pointer, offset into the block)
//! ├── frames (pre-push cursor per live structure → exact LIFO restore)
//! └── reclaim floor (mirrors the cursor; invalidates popped views)
//! ```
//!
//! # Checkpoints
//!
//! [`SafePoint`] snapshots `{cursor, count}` and verifies the snapshot
//! on close, turning a forgotten `pop` into an immediate, localized
//! failure instead of silent corruption of later allocations.
//! [`PopPoint`] additionally auto-pops everything pushed through it.
//!
//! One stack has exactly one logical owner: `&mut self` on every
//! mutating operation makes concurrent misuse unrepresentable.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod point;
pub mod region;
pub mod stack;

pub use point::{PopPoint, SafePoint};
pub use region::RawRegion;
pub use stack::MemoryStack;
