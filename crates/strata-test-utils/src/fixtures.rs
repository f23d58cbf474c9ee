//! Reusable layout fixtures.
//!
//! Standard shapes that exercise the interesting layout cases:
//!
//! - [`header_shape`] — `{i32, i8, i32}`: interior padding (size 12).
//! - [`vec3_shape`] — `{f32, f32, f32}`: no padding anywhere.
//! - [`pair_shape`] — `{u8, u64}`: 7 bytes of interior padding (size 16).
//! - [`value_union_shape`] — `u64 | f64 | i32` overlapping at offset 0.

use std::sync::Arc;

use strata_core::{Abi, NativeType};
use strata_layout::{Shape, ShapeBuilder, Structure};

/// `{ i32 a; i8 b; i32 c; }` — offsets 0/4/8, size 12, alignment 4.
pub fn header_shape() -> Arc<Shape> {
    ShapeBuilder::sequential(Abi::Lp64)
        .primitive("a", NativeType::I32)
        .primitive("b", NativeType::I8)
        .primitive("c", NativeType::I32)
        .build()
        .unwrap()
}

/// `{ f32 x; f32 y; f32 z; }` — densely packed, size 12.
pub fn vec3_shape() -> Arc<Shape> {
    ShapeBuilder::sequential(Abi::Lp64)
        .primitive("x", NativeType::F32)
        .primitive("y", NativeType::F32)
        .primitive("z", NativeType::F32)
        .build()
        .unwrap()
}

/// `{ u8 tag; u64 value; }` — offsets 0/8, size 16, alignment 8.
pub fn pair_shape() -> Arc<Shape> {
    ShapeBuilder::sequential(Abi::Lp64)
        .primitive("tag", NativeType::U8)
        .primitive("value", NativeType::U64)
        .build()
        .unwrap()
}

/// `u64 | f64 | i32`, all at offset 0 — size 8, alignment 8.
pub fn value_union_shape() -> Arc<Shape> {
    ShapeBuilder::overlapping(Abi::Lp64)
        .primitive("as_u64", NativeType::U64)
        .primitive("as_f64", NativeType::F64)
        .primitive("as_i32", NativeType::I32)
        .build()
        .unwrap()
}

/// An allocated [`header_shape`] structure with `a=1, b=2, c=3`.
pub fn filled_header() -> Structure {
    let mut s = Structure::new(header_shape());
    s.allocate().unwrap();
    s.set_i32("a", 1).unwrap();
    s.set_i8("b", 2).unwrap();
    s.set_i32("c", 3).unwrap();
    s
}
