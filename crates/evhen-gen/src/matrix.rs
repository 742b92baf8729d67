//! Byte matrices over GF(2^8) and the Cauchy construction used for the
//! per-round MDS layer.

use core::ops::{Index, IndexMut};

use evhen_field::{invert, multiply};
use serde::{Deserialize, Serialize};

use crate::entropy::EntropySource;
use crate::error::{GenError, GenResult};

/// Largest supported Cauchy matrix dimension.
pub const MAX_CAUCHY_SIZE: usize = 32;

/// Dense row-major byte matrix.
///
/// `Matrix::default()` is the uninitialized state; it becomes usable after
/// [`Matrix::init`] and returns to uninitialized on [`Matrix::release`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl Matrix {
    /// Allocates a zero-filled `rows × cols` matrix.
    pub fn zeroed(rows: usize, cols: usize) -> GenResult<Self> {
        let mut matrix = Self::default();
        matrix.init(rows, cols)?;
        Ok(matrix)
    }

    /// Returns the `n × n` identity.
    pub fn identity(n: usize) -> GenResult<Self> {
        let mut matrix = Self::zeroed(n, n)?;
        for i in 0..n {
            matrix[i][i] = 1;
        }
        Ok(matrix)
    }

    /// Zero-fills the storage for `rows × cols` entries and marks the
    /// matrix initialized.
    pub fn init(&mut self, rows: usize, cols: usize) -> GenResult<()> {
        if rows == 0 || cols == 0 {
            return Err(GenError::DimensionMismatch {
                left: (rows, cols),
                right: (rows, cols),
            });
        }
        self.rows = rows;
        self.cols = cols;
        self.data = vec![0u8; rows * cols];
        Ok(())
    }

    /// Frees the storage and marks the matrix uninitialized.
    pub fn release(&mut self) {
        self.rows = 0;
        self.cols = 0;
        self.data = Vec::new();
    }

    /// Whether the matrix currently holds storage.
    pub fn is_init(&self) -> bool {
        !self.data.is_empty()
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Entry at `(row, col)`.
    ///
    /// # Panics
    /// Panics when either index is out of range.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self[row][col]
    }

    /// Writes the entry at `(row, col)`.
    ///
    /// # Panics
    /// Panics when either index is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self[row][col] = value;
    }

    /// Copies column `col` into a vector of length `rows`.
    pub fn column(&self, col: usize) -> Vec<u8> {
        (0..self.rows).map(|row| self[row][col]).collect()
    }

    fn row_range(&self, row: usize) -> core::ops::Range<usize> {
        assert!(
            row < self.rows,
            "row {row} out of range for {}x{} matrix",
            self.rows,
            self.cols
        );
        row * self.cols..(row + 1) * self.cols
    }
}

impl Index<usize> for Matrix {
    type Output = [u8];

    fn index(&self, row: usize) -> &[u8] {
        let range = self.row_range(row);
        &self.data[range]
    }
}

impl IndexMut<usize> for Matrix {
    fn index_mut(&mut self, row: usize) -> &mut [u8] {
        let range = self.row_range(row);
        &mut self.data[range]
    }
}

/// Computes `m1 · m2` with products taken under `field`.
pub fn multiply_matrices(m1: &Matrix, m2: &Matrix, field: u8) -> GenResult<Matrix> {
    if !m1.is_init() || !m2.is_init() {
        return Err(GenError::UninitializedMatrix);
    }
    if m1.cols != m2.rows {
        return Err(GenError::DimensionMismatch {
            left: (m1.rows, m1.cols),
            right: (m2.rows, m2.cols),
        });
    }
    let mut out = Matrix::zeroed(m1.rows, m2.cols)?;
    for i in 0..m1.rows {
        for j in 0..m2.cols {
            let mut acc = 0u8;
            for k in 0..m1.cols {
                acc ^= multiply(m1[i][k], m2[k][j], field);
            }
            out[i][j] = acc;
        }
    }
    Ok(out)
}

/// Square Cauchy matrix `C[i][j] = 1 / (x_i ^ y_j)` over a chosen field.
///
/// The init vector holds `x_0..x_{n-1}` followed by `y_0..y_{n-1}`; all
/// `2n` values are pairwise distinct, so every entry is defined and every
/// square submatrix is nonsingular.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauchyMatrix {
    size: usize,
    matrix: Matrix,
    init: Vec<u8>,
    field: u8,
}

impl CauchyMatrix {
    /// Allocates a zero `size × size` matrix with no init vector.
    pub fn init(&mut self, size: usize, field: u8) -> GenResult<()> {
        if size == 0 || size > MAX_CAUCHY_SIZE {
            return Err(GenError::InvalidMatrixSize(size));
        }
        self.matrix.init(size, size)?;
        self.init.clear();
        self.size = size;
        self.field = field;
        Ok(())
    }

    /// Builds the matrix from the first `2·size` values of a fresh random
    /// permutation.
    pub fn init_random<E: EntropySource + ?Sized>(
        &mut self,
        size: usize,
        field: u8,
        entropy: &mut E,
    ) -> GenResult<()> {
        self.init(size, field)?;
        let perm = entropy.random_permutation();
        self.init.extend_from_slice(&perm[..2 * size]);
        self.fill_entries()
    }

    /// Builds a matrix from explicit `x` and `y` halves.
    pub fn from_init_vector(values: &[u8], field: u8) -> GenResult<Self> {
        if values.len() % 2 != 0 {
            return Err(GenError::InvalidInitVector {
                expected: values.len() + 1,
                actual: values.len(),
            });
        }
        let distinct = {
            let mut seen = [false; 256];
            values
                .iter()
                .filter(|&&v| !core::mem::replace(&mut seen[v as usize], true))
                .count()
        };
        if distinct != values.len() {
            return Err(GenError::InvalidInitVector {
                expected: values.len(),
                actual: distinct,
            });
        }
        let mut cauchy = Self::default();
        cauchy.init(values.len() / 2, field)?;
        cauchy.init.extend_from_slice(values);
        cauchy.fill_entries()?;
        Ok(cauchy)
    }

    fn fill_entries(&mut self) -> GenResult<()> {
        let (xs, ys) = self.init.split_at(self.size);
        for (i, &x) in xs.iter().enumerate() {
            for (j, &y) in ys.iter().enumerate() {
                self.matrix[i][j] = invert(x ^ y, self.field)?;
            }
        }
        Ok(())
    }

    /// Drops the entries and the init vector.
    pub fn release(&mut self) {
        self.matrix.release();
        self.init.clear();
        self.size = 0;
        self.field = 0;
    }

    /// Whether entries have been derived from an init vector.
    pub fn is_init(&self) -> bool {
        self.matrix.is_init() && self.init.len() == 2 * self.size
    }

    /// Dimension of the square matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Field polynomial the entries were computed under.
    pub fn field(&self) -> u8 {
        self.field
    }

    /// The `x` values followed by the `y` values.
    pub fn init_vector(&self) -> &[u8] {
        &self.init
    }

    /// The entries.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Full determinant from the closed Cauchy formula.
    pub fn determinant(&self) -> GenResult<u8> {
        self.ensure_init()?;
        let (xs, ys) = self.init.split_at(self.size);
        cauchy_determinant(xs, ys, self.field)
    }

    /// Determinant of the matrix with `row` and `col` deleted.
    ///
    /// # Panics
    /// Panics when `row` or `col` is not below [`Self::size`].
    pub fn determinant_excluding(&self, row: usize, col: usize) -> GenResult<u8> {
        self.ensure_init()?;
        let (xs, ys) = self.reduced_halves(row, col);
        cauchy_determinant(&xs, &ys, self.field)
    }

    /// Cauchy matrix with `row` and `col` deleted.
    pub fn minor_matrix(&self, row: usize, col: usize) -> GenResult<CauchyMatrix> {
        self.ensure_init()?;
        let (mut xs, ys) = self.reduced_halves(row, col);
        xs.extend_from_slice(&ys);
        Self::from_init_vector(&xs, self.field)
    }

    /// Inverse as the transposed cofactor matrix divided by the determinant.
    pub fn inverse(&self) -> GenResult<Matrix> {
        self.ensure_init()?;
        let det_inv = invert(self.determinant()?, self.field)?;
        let mut out = Matrix::zeroed(self.size, self.size)?;
        for i in 0..self.size {
            for j in 0..self.size {
                out[j][i] = multiply(det_inv, self.determinant_excluding(i, j)?, self.field);
            }
        }
        Ok(out)
    }

    fn ensure_init(&self) -> GenResult<()> {
        if self.is_init() {
            Ok(())
        } else {
            Err(GenError::UninitializedMatrix)
        }
    }

    fn reduced_halves(&self, row: usize, col: usize) -> (Vec<u8>, Vec<u8>) {
        assert!(row < self.size && col < self.size, "minor index out of range");
        let (xs, ys) = self.init.split_at(self.size);
        let skip = |values: &[u8], gap: usize| -> Vec<u8> {
            values
                .iter()
                .enumerate()
                .filter(|&(idx, _)| idx != gap)
                .map(|(_, &v)| v)
                .collect()
        };
        (skip(xs, row), skip(ys, col))
    }
}

/// `∏_{i<j} (x_i^x_j)(y_i^y_j) / ∏_{i,j} (x_i^y_j)`; the empty matrix has
/// determinant 1.
fn cauchy_determinant(xs: &[u8], ys: &[u8], field: u8) -> GenResult<u8> {
    let mut numerator = 1u8;
    let mut denominator = 1u8;
    for i in 0..xs.len() {
        for j in (i + 1)..xs.len() {
            numerator = multiply(numerator, xs[i] ^ xs[j], field);
            numerator = multiply(numerator, ys[i] ^ ys[j], field);
        }
        for &y in ys {
            denominator = multiply(denominator, xs[i] ^ y, field);
        }
    }
    Ok(multiply(numerator, invert(denominator, field)?, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use evhen_field::{field_poly, FIELD_POLY_COUNT, RIJNDAEL_FIELD_POLY};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn gaussian_determinant(matrix: &Matrix, field: u8) -> u8 {
        let n = matrix.rows();
        let mut rows: Vec<Vec<u8>> = (0..n).map(|i| matrix[i].to_vec()).collect();
        let mut det = 1u8;
        for col in 0..n {
            let Some(pivot) = (col..n).find(|&r| rows[r][col] != 0) else {
                return 0;
            };
            rows.swap(col, pivot);
            let lead = rows[col][col];
            det = multiply(det, lead, field);
            let lead_inv = invert(lead, field).unwrap();
            for r in (col + 1)..n {
                let factor = multiply(rows[r][col], lead_inv, field);
                if factor == 0 {
                    continue;
                }
                for c in col..n {
                    let delta = multiply(factor, rows[col][c], field);
                    rows[r][c] ^= delta;
                }
            }
        }
        det
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let mut rng = ChaCha20Rng::from_seed([50u8; 32]);
        for size in 1..=MAX_CAUCHY_SIZE {
            let field = field_poly(size % FIELD_POLY_COUNT);
            let mut cauchy = CauchyMatrix::default();
            cauchy.init_random(size, field, &mut rng).unwrap();
            let inv = cauchy.inverse().unwrap();
            let product = multiply_matrices(cauchy.matrix(), &inv, field).unwrap();
            assert_eq!(product, Matrix::identity(size).unwrap(), "size {size}");
        }
    }

    #[test]
    fn closed_form_matches_elimination() {
        let mut rng = ChaCha20Rng::from_seed([51u8; 32]);
        for size in [2usize, 4, 7, 16] {
            let mut cauchy = CauchyMatrix::default();
            cauchy.init_random(size, RIJNDAEL_FIELD_POLY, &mut rng).unwrap();
            let det = cauchy.determinant().unwrap();
            assert_ne!(det, 0);
            assert_eq!(det, gaussian_determinant(cauchy.matrix(), RIJNDAEL_FIELD_POLY));
            let minor = cauchy.minor_matrix(1, size - 1).unwrap();
            assert_eq!(
                cauchy.determinant_excluding(1, size - 1).unwrap(),
                minor.determinant().unwrap()
            );
        }
    }

    #[test]
    fn size_bounds_are_enforced() {
        let mut cauchy = CauchyMatrix::default();
        assert_eq!(
            cauchy.init(0, RIJNDAEL_FIELD_POLY),
            Err(GenError::InvalidMatrixSize(0))
        );
        assert_eq!(
            cauchy.init(33, RIJNDAEL_FIELD_POLY),
            Err(GenError::InvalidMatrixSize(33))
        );
        assert!(cauchy.init(32, RIJNDAEL_FIELD_POLY).is_ok());
        assert!(!cauchy.is_init());
        assert_eq!(cauchy.inverse(), Err(GenError::UninitializedMatrix));
    }

    #[test]
    fn init_vector_must_be_distinct() {
        assert_eq!(
            CauchyMatrix::from_init_vector(&[1, 2, 3, 1], RIJNDAEL_FIELD_POLY),
            Err(GenError::InvalidInitVector {
                expected: 4,
                actual: 3
            })
        );
        let cauchy = CauchyMatrix::from_init_vector(&[1, 2], RIJNDAEL_FIELD_POLY).unwrap();
        assert_eq!(cauchy.matrix().get(0, 0), invert(3, RIJNDAEL_FIELD_POLY).unwrap());
    }

    #[test]
    fn multiply_rejects_bad_operands() {
        let a = Matrix::zeroed(2, 3).unwrap();
        let b = Matrix::zeroed(2, 3).unwrap();
        assert_eq!(
            multiply_matrices(&a, &b, RIJNDAEL_FIELD_POLY),
            Err(GenError::DimensionMismatch {
                left: (2, 3),
                right: (2, 3)
            })
        );
        assert_eq!(
            multiply_matrices(&Matrix::default(), &b, RIJNDAEL_FIELD_POLY),
            Err(GenError::UninitializedMatrix)
        );
    }

    #[test]
    fn release_returns_to_uninitialized() {
        let mut m = Matrix::identity(4).unwrap();
        assert!(m.is_init());
        assert_eq!(m.column(2), vec![0, 0, 1, 0]);
        m.release();
        assert!(!m.is_init());
        assert_eq!(m, Matrix::default());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn row_index_is_checked() {
        let m = Matrix::identity(4).unwrap();
        let _ = m[4][0];
    }
}
