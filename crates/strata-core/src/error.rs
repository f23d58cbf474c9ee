//! Error types for the Strata memory engine, organized by subsystem:
//! layout computation, buffer lifecycle, bounds checking, arena
//! checkpoints, and checked integer narrowing.
//!
//! All errors are raised synchronously at the offending call, before any
//! state mutation, and are never retried internally — the operations are
//! deterministic, so retrying with the same inputs reproduces the error.

use std::error::Error;
use std::fmt;

use crate::abi::NativeType;

/// Errors from shape declaration and layout computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// Alignment is not a supported power of two (1, 2, 4, 8, or 16).
    UnsupportedAlignment {
        /// The rejected alignment value.
        alignment: usize,
    },
    /// A composite shape was declared with no fields.
    EmptyFieldList,
    /// Two fields of one composite share a name.
    DuplicateField {
        /// The repeated field name.
        name: String,
    },
    /// A compressed shape was embedded anywhere but the final field
    /// position of its parent.
    CompressedNotLast {
        /// Name of the offending field.
        field: String,
    },
    /// A compressed shape was used as an array element. Elements repeat,
    /// so no element can occupy a trailing position.
    CompressedArrayElement,
    /// An array was declared with zero elements.
    ZeroLengthArray,
    /// Offset or size arithmetic overflowed `usize`.
    SizeOverflow,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedAlignment { alignment } => {
                write!(f, "unsupported alignment {alignment}: must be 1, 2, 4, 8, or 16")
            }
            Self::EmptyFieldList => write!(f, "composite shape requires at least one field"),
            Self::DuplicateField { name } => write!(f, "duplicate field '{name}'"),
            Self::CompressedNotLast { field } => {
                write!(f, "compressed field '{field}' must be the last declared field")
            }
            Self::CompressedArrayElement => {
                write!(f, "compressed shapes cannot be array elements")
            }
            Self::ZeroLengthArray => write!(f, "array length must be at least 1"),
            Self::SizeOverflow => write!(f, "layout size computation overflowed"),
        }
    }
}

impl Error for LayoutError {}

/// Errors from the buffer lifecycle state machine.
///
/// A structure is created unallocated, transitions exactly once to
/// allocated (owning a fresh buffer) or claimed (viewing an ancestor's
/// buffer), and is shape-immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleError {
    /// `allocate` or `claim` was called on an already-initialised instance.
    AlreadyBound,
    /// A field was read or written before `allocate`/`claim`.
    NotBound,
    /// The backing region was reclaimed — the structure was popped off
    /// its arena and any further use of the instance is invalid.
    Reclaimed {
        /// Absolute end offset of the structure within the block.
        end: usize,
        /// Current live floor of the block.
        floor: usize,
    },
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyBound => write!(f, "structure buffer is already initialised"),
            Self::NotBound => write!(f, "structure buffer is not initialised"),
            Self::Reclaimed { end, floor } => {
                write!(f, "region ending at {end} was reclaimed (live floor {floor})")
            }
        }
    }
}

impl Error for LifecycleError {}

/// Errors from bounds checking: indices, capacities, and addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundsError {
    /// Array index out of range.
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of elements in the array.
        len: usize,
    },
    /// An allocation would exceed the block's capacity.
    CapacityExceeded {
        /// Bytes requested (including alignment padding).
        requested: usize,
        /// Bytes remaining in the block.
        remaining: usize,
    },
    /// A byte region falls outside the owning block.
    RegionOutOfRange {
        /// Start offset of the region.
        offset: usize,
        /// Length of the region in bytes.
        len: usize,
        /// Capacity of the block.
        capacity: usize,
    },
    /// An address does not belong to the owning block.
    AddressOutsideBlock {
        /// The foreign address.
        address: usize,
    },
    /// A claim offset does not satisfy the shape's alignment.
    MisalignedOffset {
        /// The rejected offset.
        offset: usize,
        /// The required alignment.
        alignment: usize,
    },
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for array of {len}")
            }
            Self::CapacityExceeded { requested, remaining } => {
                write!(f, "capacity exceeded: requested {requested} bytes, {remaining} remaining")
            }
            Self::RegionOutOfRange { offset, len, capacity } => {
                write!(f, "region [{offset}, {}) outside block of {capacity} bytes", offset + len)
            }
            Self::AddressOutsideBlock { address } => {
                write!(f, "address {address:#x} is outside the block")
            }
            Self::MisalignedOffset { offset, alignment } => {
                write!(f, "offset {offset} is not aligned to {alignment}")
            }
        }
    }
}

impl Error for BoundsError {}

/// Errors from arena checkpoint accounting.
///
/// These are fatal to the enclosing scope: once push/pop balance is
/// violated, the stack pointer can no longer be trusted, so the scope
/// guards escalate a drop-time mismatch to a panic rather than recover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SafePointError {
    /// `pop` was called with no live structures on the stack.
    PopOnEmpty,
    /// A checkpoint closed with state differing from its snapshot —
    /// an unpaired `push` (or stray `pop`) inside the scope.
    Mismatch {
        /// Stack pointer recorded when the scope opened.
        expected_pointer: usize,
        /// Stack pointer observed at close.
        actual_pointer: usize,
        /// Structure count recorded when the scope opened.
        expected_count: usize,
        /// Structure count observed at close.
        actual_count: usize,
    },
}

impl fmt::Display for SafePointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PopOnEmpty => write!(f, "pop on empty stack"),
            Self::Mismatch {
                expected_pointer,
                actual_pointer,
                expected_count,
                actual_count,
            } => write!(
                f,
                "safe point mismatch: pointer {actual_pointer:#x} (expected {expected_pointer:#x}), \
                 {actual_count} live structures (expected {expected_count})"
            ),
        }
    }
}

impl Error for SafePointError {}

/// A value too wide for the target integer field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverflowError {
    /// The assigned value does not fit the field's native type.
    ValueOutOfRange {
        /// The rejected value.
        value: i128,
        /// The target primitive type.
        ty: NativeType,
    },
}

impl fmt::Display for OverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueOutOfRange { value, ty } => {
                write!(f, "value {value} does not fit native type {ty}")
            }
        }
    }
}

impl Error for OverflowError {}

/// Umbrella error for field access on a structure view.
///
/// Wraps the subsystem errors that can surface from one accessor call,
/// plus the two failures only the access path itself can detect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessError {
    /// Layout violation surfaced while deriving a view (e.g. building an
    /// array shape for a pushed array).
    Layout(LayoutError),
    /// Lifecycle violation (unbound, double-bind, reclaimed region).
    Lifecycle(LifecycleError),
    /// Bounds violation (index, capacity, region).
    Bounds(BoundsError),
    /// Checked narrowing rejected the value.
    Overflow(OverflowError),
    /// No field with the given name is declared on this shape.
    UnknownField {
        /// The requested field name.
        name: String,
    },
    /// The field exists but has a different primitive type, or is not
    /// a primitive at all.
    TypeMismatch {
        /// The requested field name.
        field: String,
        /// The accessor's expected type, if the field is a primitive.
        expected: Option<NativeType>,
    },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout(e) => write!(f, "layout: {e}"),
            Self::Lifecycle(e) => write!(f, "lifecycle: {e}"),
            Self::Bounds(e) => write!(f, "bounds: {e}"),
            Self::Overflow(e) => write!(f, "overflow: {e}"),
            Self::UnknownField { name } => write!(f, "unknown field '{name}'"),
            Self::TypeMismatch { field, expected } => match expected {
                Some(ty) => write!(f, "field '{field}' is not of type {ty}"),
                None => write!(f, "field '{field}' is not a primitive"),
            },
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Layout(e) => Some(e),
            Self::Lifecycle(e) => Some(e),
            Self::Bounds(e) => Some(e),
            Self::Overflow(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LayoutError> for AccessError {
    fn from(e: LayoutError) -> Self {
        Self::Layout(e)
    }
}

impl From<LifecycleError> for AccessError {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

impl From<BoundsError> for AccessError {
    fn from(e: BoundsError) -> Self {
        Self::Bounds(e)
    }
}

impl From<OverflowError> for AccessError {
    fn from(e: OverflowError) -> Self {
        Self::Overflow(e)
    }
}
