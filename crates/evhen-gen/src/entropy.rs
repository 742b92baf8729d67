//! Entropy seam used by every generation step.
//!
//! The generator never reaches for a global RNG: callers construct an
//! [`EntropySource`] (any cryptographic `RngCore`) and hand it to
//! [`crate::Generator`], which threads it through round construction and
//! table flashing. Seeding the source makes generation reproducible.

use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng, RngCore};

/// Source of secure random bytes and byte permutations.
pub trait EntropySource: RngCore + CryptoRng {
    /// Fills `buf` with random bytes.
    fn random_bytes(&mut self, buf: &mut [u8]) {
        self.fill_bytes(buf);
    }

    /// Returns a random 32-bit word.
    fn random_u32(&mut self) -> u32 {
        self.next_u32()
    }

    /// Returns a uniformly random byte in `1..=255`.
    fn random_nonzero_byte(&mut self) -> u8 {
        loop {
            let byte = self.next_u32() as u8;
            if byte != 0 {
                return byte;
            }
        }
    }

    /// Returns a uniform index in `0..bound`.
    ///
    /// # Panics
    /// Panics if `bound` is zero.
    fn random_index(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound)
    }

    /// Returns a pseudorandom bijection on `0..=255`.
    fn random_permutation(&mut self) -> [u8; 256] {
        let mut perm: [u8; 256] = core::array::from_fn(|i| i as u8);
        perm.shuffle(self);
        perm
    }

    /// Shuffles `items` in place.
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        items.shuffle(self);
    }
}

impl<R: RngCore + CryptoRng + ?Sized> EntropySource for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn permutation_is_bijective() {
        let mut rng = ChaCha20Rng::from_seed([40u8; 32]);
        for _ in 0..8 {
            let perm = rng.random_permutation();
            let mut seen = [false; 256];
            for &v in perm.iter() {
                assert!(!seen[v as usize]);
                seen[v as usize] = true;
            }
        }
    }

    #[test]
    fn seeded_sources_repeat() {
        let mut a = ChaCha20Rng::from_seed([41u8; 32]);
        let mut b = ChaCha20Rng::from_seed([41u8; 32]);
        assert_eq!(a.random_permutation(), b.random_permutation());
        assert_eq!(a.random_u32(), b.random_u32());
    }

    #[test]
    fn nonzero_bytes_and_indices_stay_in_range() {
        let mut rng = ChaCha20Rng::from_seed([42u8; 32]);
        for _ in 0..1024 {
            assert_ne!(rng.random_nonzero_byte(), 0);
            assert!(rng.random_index(30) < 30);
        }
    }
}
