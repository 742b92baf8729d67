//! GF(2^8) arithmetic over a caller-selected irreducible polynomial.
//!
//! Field polynomials are passed around by their low byte; the `x^8` term is
//! implicit. Every round of the table network may pick a different field, so
//! nothing here assumes a single global modulus.

use crate::error::FieldError;

/// Number of irreducible degree-8 polynomials over GF(2).
pub const FIELD_POLY_COUNT: usize = 30;

/// All irreducible degree-8 polynomials over GF(2), low byte only, ascending.
pub const FIELD_POLYS: [u8; FIELD_POLY_COUNT] = [
    0x1b, 0x1d, 0x2b, 0x2d, 0x39, 0x3f, 0x4d, 0x5f, 0x63, 0x65, 0x69, 0x71, 0x77, 0x7b, 0x87,
    0x8b, 0x8d, 0x9f, 0xa3, 0xa9, 0xb1, 0xbd, 0xc3, 0xcf, 0xd7, 0xdd, 0xe7, 0xf3, 0xf5, 0xf9,
];

/// Rijndael field polynomial `x^8 + x^4 + x^3 + x + 1`.
pub const RIJNDAEL_FIELD_POLY: u8 = 0x1b;

/// Generator of the multiplicative group of the Rijndael field.
pub const RIJNDAEL_PRIMITIVE_ELEMENT: u8 = 0x03;

/// Returns the catalog entry at `index`.
///
/// # Panics
/// Panics when `index >= FIELD_POLY_COUNT`.
#[inline]
pub fn field_poly(index: usize) -> u8 {
    FIELD_POLYS[index]
}

/// Returns true if `poly` names a catalog field.
pub fn is_field_poly(poly: u8) -> bool {
    FIELD_POLYS.contains(&poly)
}

/// Multiplies `a · b` modulo `x^8 + poly`.
#[inline]
pub const fn multiply(mut a: u8, mut b: u8, poly: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= poly;
        }
        b >>= 1;
    }
    product
}

/// Raises `a` to `exp` modulo `x^8 + poly`.
pub const fn pow(a: u8, mut exp: u32, poly: u8) -> u8 {
    let mut base = a;
    let mut acc = 1u8;
    while exp != 0 {
        if exp & 1 != 0 {
            acc = multiply(acc, base, poly);
        }
        base = multiply(base, base, poly);
        exp >>= 1;
    }
    acc
}

/// Multiplicative inverse of `a`; fails for zero.
#[inline]
pub fn invert(a: u8, poly: u8) -> Result<u8, FieldError> {
    if a == 0 {
        return Err(FieldError::ZeroInverse { field: poly });
    }
    // a^(2^8 - 2) = a^-1
    Ok(pow(a, 254, poly))
}

/// Computes `a / b`; fails when `b` is zero.
#[inline]
pub fn divide(a: u8, b: u8, poly: u8) -> Result<u8, FieldError> {
    Ok(multiply(a, invert(b, poly)?, poly))
}

/// Powers of the Rijndael primitive element: `table[i] = 3^i`.
pub fn rijndael_exp_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut value = 1u8;
    for entry in table.iter_mut() {
        *entry = value;
        value = multiply(value, RIJNDAEL_PRIMITIVE_ELEMENT, RIJNDAEL_FIELD_POLY);
    }
    table
}

/// Returns `3^power` in the Rijndael field, with `power` taken mod 255.
#[inline]
pub fn rijndael_primitive_power(power: u32) -> u8 {
    pow(RIJNDAEL_PRIMITIVE_ELEMENT, power % 255, RIJNDAEL_FIELD_POLY)
}
