//! Per-lane byte bijections.

use evhen_field::{shift_lane, LANES};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use crate::entropy::EntropySource;

/// One bijection on `0..=255`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sbox(#[serde(with = "BigArray")] pub [u8; 256]);

impl Sbox {
    /// The identity map.
    pub fn identity() -> Self {
        Self(core::array::from_fn(|i| i as u8))
    }

    /// Looks up `input`.
    #[inline]
    pub fn apply(&self, input: u8) -> u8 {
        self.0[input as usize]
    }

    /// Returns the inverse map.
    pub fn inverse(&self) -> Self {
        let mut out = [0u8; 256];
        for (input, &output) in self.0.iter().enumerate() {
            out[output as usize] = input as u8;
        }
        Self(out)
    }

    /// Whether every output value appears exactly once.
    pub fn is_bijective(&self) -> bool {
        let mut seen = [false; 256];
        self.0
            .iter()
            .all(|&v| !core::mem::replace(&mut seen[v as usize], true))
    }
}

/// Sixteen S-boxes, one per lane.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SboxFamily {
    lanes: Vec<Sbox>,
}

impl Default for SboxFamily {
    fn default() -> Self {
        Self::identity()
    }
}

impl SboxFamily {
    /// Identity map on every lane.
    pub fn identity() -> Self {
        Self {
            lanes: vec![Sbox::identity(); LANES],
        }
    }

    /// Draws sixteen independent random permutations.
    pub fn random<E: EntropySource + ?Sized>(entropy: &mut E) -> Self {
        Self {
            lanes: (0..LANES)
                .map(|_| Sbox(entropy.random_permutation()))
                .collect(),
        }
    }

    /// S-box of `lane`.
    pub fn lane(&self, lane: usize) -> &Sbox {
        &self.lanes[lane]
    }

    /// Mutable S-box of `lane`.
    pub fn lane_mut(&mut self, lane: usize) -> &mut Sbox {
        &mut self.lanes[lane]
    }

    /// Iterates lanes in order.
    pub fn iter(&self) -> impl Iterator<Item = &Sbox> {
        self.lanes.iter()
    }

    /// Inverts every lane and moves lane `i` to `shift_lane(i)`.
    pub fn invert(&self) -> Self {
        let mut lanes = vec![Sbox::identity(); LANES];
        for (i, sbox) in self.lanes.iter().enumerate() {
            lanes[shift_lane(i)] = sbox.inverse();
        }
        Self { lanes }
    }

    /// Whether every lane is a bijection.
    pub fn is_bijective(&self) -> bool {
        self.lanes.len() == LANES && self.lanes.iter().all(Sbox::is_bijective)
    }
}
