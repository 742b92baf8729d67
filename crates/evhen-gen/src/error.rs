//! Generator error type.

use core::fmt;

use evhen_field::FieldError;

/// Result alias used across the generator.
pub type GenResult<T> = Result<T, GenError>;

/// Failure while configuring, building or flashing a table network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenError {
    /// The chain needs at least two rounds.
    InvalidRoundCount(u32),
    /// Minimum mix-set count exceeds the maximum.
    InvalidMixRange {
        /// Requested minimum.
        min: u32,
        /// Requested maximum.
        max: u32,
    },
    /// Cauchy matrices are limited to sizes 1..=32.
    InvalidMatrixSize(usize),
    /// Operand shapes do not allow the operation.
    DimensionMismatch {
        /// `(rows, cols)` of the left operand.
        left: (usize, usize),
        /// `(rows, cols)` of the right operand.
        right: (usize, usize),
    },
    /// A matrix was used before `init` or after `release`.
    UninitializedMatrix,
    /// A Cauchy init vector has the wrong length or repeats a value.
    InvalidInitVector {
        /// Expected number of values.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },
    /// Underlying field or polynomial arithmetic failed.
    Field(FieldError),
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::InvalidRoundCount(rounds) => {
                write!(f, "round count must be at least 2 (got {rounds})")
            }
            GenError::InvalidMixRange { min, max } => write!(
                f,
                "minimum mix count ({min}) must be less than or equal to maximum mix count ({max})"
            ),
            GenError::InvalidMatrixSize(size) => {
                write!(f, "cauchy matrix size must be in 1..=32 (got {size})")
            }
            GenError::DimensionMismatch { left, right } => write!(
                f,
                "matrix dimensions {}x{} and {}x{} are incompatible",
                left.0, left.1, right.0, right.1
            ),
            GenError::UninitializedMatrix => write!(f, "matrix is not initialized"),
            GenError::InvalidInitVector { expected, actual } => write!(
                f,
                "cauchy init vector needs {expected} distinct values (got {actual})"
            ),
            GenError::Field(err) => write!(f, "field arithmetic: {err}"),
        }
    }
}

impl std::error::Error for GenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenError::Field(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FieldError> for GenError {
    fn from(err: FieldError) -> Self {
        GenError::Field(err)
    }
}

impl GenError {
    /// True for errors caused by the requested configuration rather than by
    /// the algebra itself.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            GenError::InvalidRoundCount(_) | GenError::InvalidMixRange { .. }
        )
    }
}
