//! Primitive sizing facts: [`NativeType`], [`MemSize`], and the [`Abi`] provider.
//!
//! A structure layout is a pure function of the `MemSize` of each of its
//! fields. Fixed-width primitives carry the same size on every supported
//! target; only `Pointer` consults the active [`Abi`].

use std::fmt;

use crate::error::LayoutError;

/// Largest alignment any field may request, in bytes.
///
/// Buffers are always based at a `MAX_ALIGNMENT` boundary, so a field
/// offset that is a multiple of its alignment yields a correctly aligned
/// absolute address.
pub const MAX_ALIGNMENT: usize = 16;

/// Round `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two (guaranteed for any alignment that
/// came out of [`MemSize::new`]). `round_up(x, 1) == x` for all `x`.
#[inline]
pub const fn round_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

/// An immutable `(size, alignment)` pair describing storage requirements.
///
/// Every shape — primitive, struct, union, or array — reduces to one of
/// these for the purposes of embedding it in a parent. Alignment is
/// restricted to {1, 2, 4, 8, 16}.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemSize {
    size: usize,
    alignment: usize,
}

impl MemSize {
    /// Create a new size/alignment pair.
    ///
    /// Returns [`LayoutError::UnsupportedAlignment`] unless `alignment`
    /// is one of 1, 2, 4, 8, or 16.
    pub fn new(size: usize, alignment: usize) -> Result<Self, LayoutError> {
        if !alignment.is_power_of_two() || alignment > MAX_ALIGNMENT {
            return Err(LayoutError::UnsupportedAlignment { alignment });
        }
        Ok(Self { size, alignment })
    }

    /// Size in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Alignment in bytes.
    pub const fn alignment(&self) -> usize {
        self.alignment
    }
}

impl fmt::Display for MemSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}b/align {}", self.size, self.alignment)
    }
}

/// Target ABI: supplies the primitive sizes that vary by platform word width.
///
/// Fixed-width integers and floats are identical across supported targets;
/// only pointers differ. The ABI is chosen once when shapes are declared
/// and baked into the computed offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Abi {
    /// 64-bit targets: 8-byte pointers at 8-byte alignment.
    #[default]
    Lp64,
    /// 32-bit targets: 4-byte pointers at 4-byte alignment.
    Ilp32,
}

impl Abi {
    /// Pointer size (== alignment) in bytes for this target.
    pub const fn pointer_size(&self) -> usize {
        match self {
            Self::Lp64 => 8,
            Self::Ilp32 => 4,
        }
    }
}

/// The primitive types a field descriptor may declare.
///
/// Values are stored in native byte order — the whole point of the engine
/// is that the buffer is handed to native code on the same machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 64-bit integer.
    I64,
    /// IEEE-754 single-precision float.
    F32,
    /// IEEE-754 double-precision float.
    F64,
    /// A raw address, sized per the active [`Abi`].
    Pointer,
}

impl NativeType {
    /// Storage requirements of this primitive under the given ABI.
    ///
    /// All primitives are naturally aligned (`size == alignment`), which
    /// matches the common platform ABIs this engine targets.
    pub fn mem_size(&self, abi: Abi) -> MemSize {
        let size = match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::Pointer => abi.pointer_size(),
        };
        // Natural alignment is always in {1,2,4,8}.
        MemSize { size, alignment: size }
    }

    /// Whether this is an integer type (pointers count — they hold addresses).
    pub const fn is_integer(&self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }

    /// Inclusive value range for integer types, `None` for floats.
    ///
    /// Used by the checked-narrowing setters to reject values too wide
    /// for the target field.
    pub fn int_range(&self, abi: Abi) -> Option<(i128, i128)> {
        match self {
            Self::U8 => Some((0, u8::MAX as i128)),
            Self::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::U16 => Some((0, u16::MAX as i128)),
            Self::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::U32 => Some((0, u32::MAX as i128)),
            Self::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::U64 => Some((0, u64::MAX as i128)),
            Self::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::Pointer => match abi.pointer_size() {
                4 => Some((0, u32::MAX as i128)),
                _ => Some((0, u64::MAX as i128)),
            },
            Self::F32 | Self::F64 => None,
        }
    }

    /// Stable lowercase name (for diagnostics).
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Pointer => "ptr",
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
