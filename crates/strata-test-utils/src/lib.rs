//! Test utilities and shared fixtures for Strata development.
//!
//! Provides prebuilt shapes ([`header_shape`], [`vec3_shape`],
//! [`value_union_shape`]) and helpers for asserting on structure bytes,
//! so individual crates' tests do not rebuild the same layouts by hand.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    filled_header, header_shape, pair_shape, value_union_shape, vec3_shape,
};

use strata_layout::Structure;

/// Assert that a bound structure's bytes equal `expected`.
///
/// Panics with a hex dump of both sides on mismatch.
pub fn assert_bytes(structure: &Structure, expected: &[u8]) {
    let actual = structure.to_bytes().unwrap();
    assert_eq!(
        actual, expected,
        "byte mismatch\n  actual:   {actual:02x?}\n  expected: {expected:02x?}"
    );
}
