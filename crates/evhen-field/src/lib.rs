//! Algebraic building blocks for the EVHEN white-box table generator.
//!
//! This crate provides:
//! - GF(2^8) multiplication, inversion and division over any of the 30
//!   irreducible degree-8 polynomials, selected per call.
//! - Polynomials over GF(2^8) (additive masks, Euclidean inverse,
//!   Reed–Solomon style generator polynomials over the Rijndael field).
//! - The 16-lane state type and the ShiftRows-style lane relabeling shared by
//!   the generator and the table evaluator.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod block;
mod error;
pub mod field;
pub mod lanes;
mod poly;

pub use crate::block::{xor_all, xor_in_place, Block, LANES};
pub use crate::error::FieldError;
pub use crate::field::{
    divide, field_poly, invert, is_field_poly, multiply, rijndael_exp_table,
    rijndael_primitive_power, FIELD_POLYS, FIELD_POLY_COUNT, RIJNDAEL_FIELD_POLY,
    RIJNDAEL_PRIMITIVE_ELEMENT,
};
pub use crate::lanes::{shift_lane, unshift_lane};
pub use crate::poly::Poly;
