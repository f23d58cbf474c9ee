//! Benchmark profiles and utilities for the Strata crates.
//!
//! Provides pre-built shapes sized like real workloads:
//!
//! - [`telemetry_record_shape`]: a 10-field mixed-width record with the
//!   padding pattern typical of hand-written C telemetry structs
//! - [`wide_record_shape`]: a record with `n` u64 fields, for scaling
//!   field-resolution benchmarks
//! - [`STACK_CAPACITY`]: the arena size the benches allocate against

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use strata_core::{Abi, NativeType};
use strata_layout::{Shape, ShapeBuilder};

/// Arena capacity used by the stack benchmarks (1 MiB).
pub const STACK_CAPACITY: usize = 1 << 20;

/// A 10-field record mixing widths the way C telemetry structs do.
///
/// Alternating narrow and wide fields force interior padding at most
/// boundaries, which is the worst case for the offset calculator.
pub fn telemetry_record_shape() -> Arc<Shape> {
    ShapeBuilder::sequential(Abi::Lp64)
        .primitive("source_id", NativeType::U32)
        .primitive("kind", NativeType::U8)
        .primitive("timestamp", NativeType::U64)
        .primitive("flags", NativeType::U16)
        .primitive("sequence", NativeType::U32)
        .primitive("latitude", NativeType::F64)
        .primitive("longitude", NativeType::F64)
        .primitive("altitude", NativeType::F32)
        .primitive("quality", NativeType::I8)
        .primitive("checksum", NativeType::U32)
        .build()
        .expect("telemetry shape is statically valid")
}

/// A record with `n` consecutive u64 fields named `f0..f{n-1}`.
///
/// Field lookup cost scales with the table, not the struct size, so the
/// layout benches use this to vary field count independently.
pub fn wide_record_shape(n: usize) -> Arc<Shape> {
    let mut builder = ShapeBuilder::sequential(Abi::Lp64);
    for i in 0..n {
        builder = builder.primitive(format!("f{i}"), NativeType::U64);
    }
    builder.build().expect("wide record shape is statically valid")
}
