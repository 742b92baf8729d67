//! Errors raised by field and polynomial arithmetic.

use core::fmt;

/// Algebraic operation with no defined result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// Zero has no multiplicative inverse in the field `x^8 + field`.
    ZeroInverse {
        /// Low byte of the irreducible polynomial.
        field: u8,
    },
    /// Polynomial division by the zero polynomial.
    DivisionByZero,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::ZeroInverse { field } => {
                write!(f, "zero has no inverse in GF(2^8) mod {:#05x}", 0x100 | *field as u16)
            }
            FieldError::DivisionByZero => write!(f, "polynomial division by zero"),
        }
    }
}

impl std::error::Error for FieldError {}
