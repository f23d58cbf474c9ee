//! The computed layout record for one declared shape.

use std::fmt;

use crate::abi::MemSize;

/// Layout facts for one declared shape: alignment, padded size, and the
/// padding actually inserted.
///
/// Computed once when a shape is built and shared by every instance of
/// that shape. Immutable after construction.
///
/// Invariant: `size % alignment == 0` unless `compressed` — a compressed
/// shape drops its trailing padding and is only legal in the final field
/// position of its parent (a packed/flexible tail).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructureInfo {
    alignment: usize,
    size: usize,
    pre_padding: usize,
    post_padding: usize,
    compressed: bool,
}

impl StructureInfo {
    /// Build the record from the raw layout cursor.
    ///
    /// `unpadded_size` is the cursor after the final field; the padded
    /// size and `post_padding` are derived from it. Callers guarantee
    /// `alignment` came out of a validated [`MemSize`].
    pub fn from_cursor(unpadded_size: usize, alignment: usize, compressed: bool) -> Self {
        let size = if compressed {
            unpadded_size
        } else {
            crate::abi::round_up(unpadded_size, alignment)
        };
        Self {
            alignment,
            size,
            pre_padding: 0,
            post_padding: size - unpadded_size,
            compressed,
        }
    }

    /// Alignment in bytes.
    pub const fn alignment(&self) -> usize {
        self.alignment
    }

    /// Total size in bytes, including trailing padding (unless compressed).
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Padding the parent inserts before this shape. Always 0 in this
    /// engine; kept in the record so ABI reports stay complete.
    pub const fn pre_padding(&self) -> usize {
        self.pre_padding
    }

    /// Trailing padding inside `size`. 0 when compressed.
    pub const fn post_padding(&self) -> usize {
        self.post_padding
    }

    /// Whether trailing padding was dropped.
    pub const fn compressed(&self) -> bool {
        self.compressed
    }

    /// This shape's storage requirement for embedding in a parent.
    pub fn mem_size(&self) -> MemSize {
        // Alignment was validated when the shape was declared.
        MemSize::new(self.size, self.alignment).expect("alignment validated at shape build")
    }
}

impl fmt::Display for StructureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size {} align {} (pad {}{})",
            self.size,
            self.alignment,
            self.post_padding,
            if self.compressed { ", compressed" } else { "" }
        )
    }
}
