//! Polynomials over GF(2^8).
//!
//! Coefficients are stored lowest degree first. The zero polynomial is the
//! empty vector. A polynomial is normally trimmed of zero high-degree
//! coefficients after every operation; clearing its `volatile_size` flag
//! freezes the width instead, which is how the 16-byte additive masks keep
//! their shape even when the top bytes happen to be zero.

use core::cmp::Ordering;
use core::ops::{Add, BitXor, Index, IndexMut, Shl, Shr, Sub};

use rand::RngCore;

use crate::error::FieldError;
use crate::field::{invert, multiply, rijndael_primitive_power, RIJNDAEL_FIELD_POLY};

/// Polynomial with GF(2^8) coefficients.
#[derive(Clone, Debug)]
pub struct Poly {
    coeffs: Vec<u8>,
    volatile_size: bool,
}

impl Default for Poly {
    fn default() -> Self {
        Self {
            coeffs: Vec::new(),
            volatile_size: true,
        }
    }
}

impl Poly {
    /// Returns the zero polynomial.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps raw coefficients (lowest degree first) without trimming them.
    pub fn from_coeffs(coeffs: Vec<u8>) -> Self {
        Self {
            coeffs,
            volatile_size: true,
        }
    }

    /// Returns `coeff · x^degree`.
    pub fn monomial(coeff: u8, degree: usize) -> Self {
        let mut coeffs = vec![0u8; degree + 1];
        coeffs[degree] = coeff;
        Self::from_coeffs(coeffs)
    }

    /// Returns a zero-filled polynomial frozen at `width` coefficients.
    pub fn with_width(width: usize) -> Self {
        Self {
            coeffs: vec![0u8; width],
            volatile_size: false,
        }
    }

    /// Whether trailing zero coefficients are trimmed after each operation.
    pub fn volatile_size(&self) -> bool {
        self.volatile_size
    }

    /// Enables or disables trimming.
    pub fn set_volatile_size(&mut self, volatile_size: bool) {
        self.volatile_size = volatile_size;
    }

    /// Number of stored coefficients.
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// True for the zero polynomial in its empty representation.
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree of the highest nonzero coefficient, `None` for zero.
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.iter().rposition(|&c| c != 0)
    }

    /// Coefficients, lowest degree first.
    pub fn coeffs(&self) -> &[u8] {
        &self.coeffs
    }

    /// Drops every coefficient.
    pub fn clear(&mut self) {
        self.coeffs.clear();
    }

    /// Appends a coefficient of the next higher degree.
    pub fn push(&mut self, coeff: u8) {
        self.coeffs.push(coeff);
    }

    /// Trims zero high-degree coefficients unless the width is frozen.
    pub fn normalize(&mut self) {
        if !self.volatile_size {
            return;
        }
        let keep = self.degree().map_or(0, |d| d + 1);
        self.coeffs.truncate(keep);
    }

    fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Trimmed copy regardless of the size flag; working form for division.
    fn trimmed_copy(&self) -> Self {
        Self::from_coeffs(self.coeffs.clone()).normalized()
    }

    fn lead(&self) -> u8 {
        self.coeffs.last().copied().unwrap_or(0)
    }

    /// Multiplies two polynomials with coefficient arithmetic mod `x^8 + field`.
    pub fn mul(&self, rhs: &Poly, field: u8) -> Poly {
        if self.is_empty() || rhs.is_empty() {
            return Poly::new();
        }
        let mut coeffs = vec![0u8; self.len() + rhs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            if a == 0 {
                continue;
            }
            for (j, &b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] ^= multiply(a, b, field);
            }
        }
        Poly::from_coeffs(coeffs).normalized()
    }

    /// Multiplies every coefficient by the scalar `c`.
    pub fn scale(&self, c: u8, field: u8) -> Poly {
        let coeffs = self.coeffs.iter().map(|&a| multiply(a, c, field)).collect();
        Poly {
            coeffs,
            volatile_size: self.volatile_size,
        }
        .normalized()
    }

    /// Long division, returning `(quotient, remainder)`.
    pub fn div_rem(&self, divisor: &Poly, field: u8) -> Result<(Poly, Poly), FieldError> {
        let divisor = divisor.trimmed_copy();
        if divisor.is_empty() {
            return Err(FieldError::DivisionByZero);
        }
        let mut rem = self.trimmed_copy();
        if rem.len() < divisor.len() {
            return Ok((Poly::new(), rem));
        }

        let lead_inv = invert(divisor.lead(), field)?;
        let mut quot = vec![0u8; rem.len() - divisor.len() + 1];
        while rem.len() >= divisor.len() {
            let shift = rem.len() - divisor.len();
            let t = multiply(rem.lead(), lead_inv, field);
            quot[shift] = t;
            for (i, &d) in divisor.coeffs.iter().enumerate() {
                rem.coeffs[i + shift] ^= multiply(t, d, field);
            }
            rem.normalize();
        }

        Ok((Poly::from_coeffs(quot).normalized(), rem))
    }

    /// Scales the polynomial so its leading coefficient is one.
    pub fn make_monic(&self, field: u8) -> Result<Poly, FieldError> {
        let trimmed = self.trimmed_copy();
        if trimmed.is_empty() {
            return Ok(trimmed);
        }
        let inv = invert(trimmed.lead(), field)?;
        Ok(trimmed.scale(inv, field))
    }

    /// Inverse of `self` modulo `modulus` via the extended Euclidean algorithm.
    ///
    /// Returns `None` when the gcd of the two is not a nonzero constant.
    pub fn inverse_mod(&self, modulus: &Poly, field: u8) -> Result<Option<Poly>, FieldError> {
        let modulus = modulus.trimmed_copy();
        if modulus.is_empty() {
            return Err(FieldError::DivisionByZero);
        }
        let mut u = modulus.clone();
        let mut v = self.trimmed_copy();
        if v.is_empty() {
            return Ok(None);
        }

        // u ≡ t_u · self and v ≡ t_v · self (mod modulus)
        let mut t_u = Poly::new();
        let mut t_v = Poly::monomial(1, 0);
        loop {
            if u < v {
                core::mem::swap(&mut u, &mut v);
                core::mem::swap(&mut t_u, &mut t_v);
            }
            let (q, r) = u.div_rem(&v, field)?;
            if r.is_empty() {
                break;
            }
            let (_, qt) = q.mul(&t_v, field).div_rem(&modulus, field)?;
            let t = &t_u - &qt;
            t_u = core::mem::replace(&mut t_v, t);
            u = core::mem::replace(&mut v, r);
        }

        if v.len() != 1 {
            return Ok(None);
        }
        let (_, t_v) = t_v.div_rem(&modulus, field)?;
        Ok(Some(t_v.scale(invert(v[0], field)?, field)))
    }

    /// Evaluates the polynomial at `x` (Horner's rule).
    pub fn evaluate(&self, x: u8, field: u8) -> u8 {
        self.coeffs
            .iter()
            .rev()
            .fold(0u8, |acc, &c| multiply(acc, x, field) ^ c)
    }

    /// Draws `size` random coefficients, optionally excluding zero.
    pub fn random<R: RngCore + ?Sized>(
        rng: &mut R,
        size: usize,
        nonzero: bool,
        volatile_size: bool,
    ) -> Poly {
        let mut coeffs = Vec::with_capacity(size);
        while coeffs.len() < size {
            let byte = rng.next_u32() as u8;
            if nonzero && byte == 0 {
                continue;
            }
            coeffs.push(byte);
        }
        Poly {
            coeffs,
            volatile_size,
        }
    }

    /// Multiplies by `(x + α^(deg + b))` in the Rijndael field, α = 0x03.
    ///
    /// Successive calls starting from `1` build the product
    /// `∏ (x + α^(b + i))`, independent of any per-round field choice.
    pub fn increase_power(&self, b: u32) -> Poly {
        if self.is_empty() {
            return Poly::new();
        }
        let n = self.len();
        let power = ((n - 1) as u64 + u64::from(b)) % 255;
        let root = rijndael_primitive_power(power as u32);

        let mut coeffs = vec![0u8; n + 1];
        coeffs[n] = self.coeffs[n - 1];
        coeffs[0] = multiply(self.coeffs[0], root, RIJNDAEL_FIELD_POLY);
        for i in 1..n {
            coeffs[i] = self.coeffs[i - 1] ^ multiply(self.coeffs[i], root, RIJNDAEL_FIELD_POLY);
        }
        Poly::from_coeffs(coeffs)
    }

    /// Returns `∏_{i < power} (x + α^(b + i))` over the Rijndael field.
    pub fn rs_generator(power: u32, b: u32) -> Poly {
        (0..power).fold(Poly::monomial(1, 0), |p, _| p.increase_power(b))
    }
}

impl PartialEq for Poly {
    fn eq(&self, other: &Self) -> bool {
        self.coeffs == other.coeffs
    }
}

impl Eq for Poly {}

impl PartialOrd for Poly {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Poly {
    /// Width first, then coefficients from the highest degree down.
    fn cmp(&self, other: &Self) -> Ordering {
        self.coeffs
            .len()
            .cmp(&other.coeffs.len())
            .then_with(|| self.coeffs.iter().rev().cmp(other.coeffs.iter().rev()))
    }
}

impl Index<usize> for Poly {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.coeffs[index]
    }
}

impl IndexMut<usize> for Poly {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.coeffs[index]
    }
}

impl BitXor<&Poly> for &Poly {
    type Output = Poly;

    fn bitxor(self, rhs: &Poly) -> Poly {
        let (short, long) = if self.len() > rhs.len() {
            (rhs, self)
        } else {
            (self, rhs)
        };
        let mut coeffs = long.coeffs.clone();
        for (c, s) in coeffs.iter_mut().zip(short.coeffs.iter()) {
            *c ^= *s;
        }
        Poly {
            coeffs,
            volatile_size: long.volatile_size,
        }
        .normalized()
    }
}

impl BitXor for Poly {
    type Output = Poly;

    fn bitxor(self, rhs: Poly) -> Poly {
        &self ^ &rhs
    }
}

impl Add<&Poly> for &Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        self ^ rhs
    }
}

impl Sub<&Poly> for &Poly {
    type Output = Poly;

    fn sub(self, rhs: &Poly) -> Poly {
        self ^ rhs
    }
}

impl Shr<usize> for &Poly {
    type Output = Poly;

    /// Divides by `x^k`, discarding the `k` lowest coefficients.
    fn shr(self, k: usize) -> Poly {
        if self.is_empty() || k == 0 {
            return self.clone();
        }
        let len = self.len();
        let coeffs = (0..len)
            .map(|i| if i + k < len { self.coeffs[i + k] } else { 0 })
            .collect();
        Poly {
            coeffs,
            volatile_size: self.volatile_size,
        }
        .normalized()
    }
}

impl Shl<usize> for &Poly {
    type Output = Poly;

    /// Multiplies by `x^k`; a frozen-width polynomial drops what overflows.
    fn shl(self, k: usize) -> Poly {
        if self.is_empty() || k == 0 {
            return self.clone();
        }
        let coeffs = if self.volatile_size {
            let mut coeffs = vec![0u8; k];
            coeffs.extend_from_slice(&self.coeffs);
            coeffs
        } else {
            let len = self.len();
            let mut coeffs = vec![0u8; len];
            for (i, &c) in self.coeffs.iter().enumerate().take(len.saturating_sub(k)) {
                coeffs[i + k] = c;
            }
            coeffs
        };
        Poly {
            coeffs,
            volatile_size: self.volatile_size,
        }
        .normalized()
    }
}

impl From<Vec<u8>> for Poly {
    fn from(coeffs: Vec<u8>) -> Self {
        Self::from_coeffs(coeffs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{field_poly, rijndael_primitive_power};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn p(coeffs: &[u8]) -> Poly {
        Poly::from_coeffs(coeffs.to_vec())
    }

    #[test]
    fn xor_cancels_and_trims() {
        let a = p(&[1, 2, 3]);
        let b = p(&[1, 2, 3]);
        assert!((&a ^ &b).is_empty());
        assert_eq!(&a ^ &p(&[0, 0, 3]), p(&[1, 2]));
        assert_eq!(&a + &p(&[5]), &a - &p(&[5]));
    }

    #[test]
    fn fixed_width_survives_xor() {
        let mut rng = ChaCha20Rng::from_seed([30u8; 32]);
        let mask = Poly::random(&mut rng, 16, true, false);
        let zero = &mask ^ &mask;
        assert_eq!(zero.len(), 16);
        assert!(zero.coeffs().iter().all(|&c| c == 0));
        assert_eq!(&Poly::with_width(16) ^ &mask, mask);
    }

    #[test]
    fn ordering_is_degree_first_then_high_coefficients() {
        assert!(p(&[9, 9]) < p(&[0, 0, 1]));
        assert!(p(&[5, 1]) < p(&[0, 2]));
        assert!(p(&[1, 2]) < p(&[2, 2]));
        assert!(Poly::new() < p(&[1]));
        assert_eq!(p(&[4, 2]).cmp(&p(&[4, 2])), Ordering::Equal);
    }

    #[test]
    fn normalize_respects_size_flag() {
        let mut a = p(&[1, 0, 0]);
        a.normalize();
        assert_eq!(a.coeffs(), &[1]);
        let mut fixed = Poly::with_width(4);
        fixed[0] = 7;
        fixed.normalize();
        assert_eq!(fixed.len(), 4);
        let mut zero = p(&[0, 0]);
        zero.normalize();
        assert!(zero.is_empty());
        assert_eq!(p(&[0, 3, 0]).degree(), Some(1));
    }

    #[test]
    fn shifts_move_coefficients() {
        let a = p(&[1, 2, 3]);
        assert_eq!(&a >> 1, p(&[2, 3]));
        assert!((&a >> 3).is_empty());
        assert_eq!(&a << 2, p(&[0, 0, 1, 2, 3]));

        let mut fixed = p(&[1, 2, 3, 4]);
        fixed.set_volatile_size(false);
        let shifted = &fixed << 1;
        assert_eq!(shifted.coeffs(), &[0, 1, 2, 3]);
        let back = &shifted >> 1;
        assert_eq!(back.coeffs(), &[1, 2, 3, 0]);
    }

    #[test]
    fn shift_matches_monomial_multiplication() {
        let field = field_poly(3);
        let a = p(&[7, 0, 9, 1]);
        assert_eq!(&a << 3, a.mul(&Poly::monomial(1, 3), field));
    }

    #[test]
    fn division_recovers_quotient_and_remainder() {
        let mut rng = ChaCha20Rng::from_seed([31u8; 32]);
        for idx in [0usize, 5, 17, 29] {
            let field = field_poly(idx);
            for _ in 0..16 {
                let a = Poly::random(&mut rng, 6, true, true);
                let b = Poly::random(&mut rng, 4, true, true);
                let c = Poly::random(&mut rng, 3, true, true);
                let dividend = &a.mul(&b, field) ^ &c;
                let (q, r) = dividend.div_rem(&b, field).expect("nonzero divisor");
                assert_eq!(q, a);
                assert_eq!(r, c);
            }
        }
    }

    #[test]
    fn division_by_zero_fails() {
        let a = p(&[1, 2]);
        assert_eq!(a.div_rem(&Poly::new(), 0x1b), Err(FieldError::DivisionByZero));
        assert_eq!(a.div_rem(&p(&[0, 0]), 0x1b), Err(FieldError::DivisionByZero));
    }

    #[test]
    fn small_dividend_is_its_own_remainder() {
        let (q, r) = p(&[3]).div_rem(&p(&[1, 1]), 0x1b).unwrap();
        assert!(q.is_empty());
        assert_eq!(r, p(&[3]));
    }

    #[test]
    fn make_monic_scales_leading_coefficient() {
        let field = field_poly(8);
        let monic = p(&[4, 9, 0x35, 0]).make_monic(field).unwrap();
        assert_eq!(monic.len(), 3);
        assert_eq!(monic[2], 1);
        assert!(Poly::new().make_monic(field).unwrap().is_empty());
    }

    #[test]
    fn inverse_mod_satisfies_definition() {
        let mut rng = ChaCha20Rng::from_seed([32u8; 32]);
        let field = field_poly(0);
        let modulus = Poly::random(&mut rng, 6, true, true);
        let mut found = 0;
        for _ in 0..32 {
            let a = Poly::random(&mut rng, 4, true, true);
            if let Some(inv) = a.inverse_mod(&modulus, field).unwrap() {
                let (_, r) = a.mul(&inv, field).div_rem(&modulus, field).unwrap();
                assert_eq!(r, p(&[1]));
                found += 1;
            }
        }
        assert!(found > 0);
    }

    #[test]
    fn inverse_mod_simple_cases() {
        let field = 0x1b;
        // x · x = x^2 ≡ 1 mod x^2 + 1
        let inv = p(&[0, 1]).inverse_mod(&p(&[1, 0, 1]), field).unwrap();
        assert_eq!(inv, Some(p(&[0, 1])));
        let inv = p(&[5]).inverse_mod(&p(&[1, 0, 1]), field).unwrap();
        assert_eq!(inv, Some(p(&[invert(5, field).unwrap()])));
    }

    #[test]
    fn inverse_mod_reports_common_factor() {
        let field = 0x1b;
        let a = p(&[1, 1]).mul(&p(&[2, 1]), field);
        let m = p(&[1, 1]).mul(&p(&[3, 1]), field);
        assert_eq!(a.inverse_mod(&m, field).unwrap(), None);
        assert_eq!(Poly::new().inverse_mod(&m, field).unwrap(), None);
        assert!(a.inverse_mod(&Poly::new(), field).is_err());
    }

    #[test]
    fn random_honours_nonzero() {
        let mut rng = ChaCha20Rng::from_seed([33u8; 32]);
        for _ in 0..64 {
            let mask = Poly::random(&mut rng, 16, true, false);
            assert_eq!(mask.len(), 16);
            assert!(mask.coeffs().iter().all(|&c| c != 0));
            assert!(!mask.volatile_size());
        }
    }

    #[test]
    fn rs_generator_has_consecutive_roots() {
        for b in [0u32, 1, 7] {
            let g = Poly::rs_generator(4, b);
            assert_eq!(g.len(), 5);
            assert_eq!(g[4], 1);
            for i in 0..4 {
                let root = rijndael_primitive_power(b + i);
                assert_eq!(g.evaluate(root, RIJNDAEL_FIELD_POLY), 0);
            }
            let not_root = rijndael_primitive_power(b + 4);
            assert_ne!(g.evaluate(not_root, RIJNDAEL_FIELD_POLY), 0);
        }
        assert_eq!(Poly::rs_generator(0, 3), p(&[1]));
    }

    #[test]
    fn increase_power_multiplies_by_linear_factor() {
        let g1 = Poly::monomial(1, 0).increase_power(2);
        assert_eq!(g1, p(&[rijndael_primitive_power(2), 1]));
    }
}
