//! Lane relabeling between consecutive rounds.
//!
//! Each round reads its input bytes through the same cross-lane pattern as
//! AES ShiftRows: lane `i` of an encryption round consumes byte
//! `shift_lane(i)` of the previous state, a decryption round consumes byte
//! `unshift_lane(i)`.

use crate::block::{Block, LANES};

/// Source byte consumed by each lane of an encryption round.
pub const SHIFT_LANES: [usize; LANES] = [0, 5, 10, 15, 4, 9, 14, 3, 8, 13, 2, 7, 12, 1, 6, 11];

/// Source byte consumed by each lane of a decryption round.
pub const UNSHIFT_LANES: [usize; LANES] = [0, 13, 10, 7, 4, 1, 14, 11, 8, 5, 2, 15, 12, 9, 6, 3];

/// Maps lane `i` to `(i + 4·(i mod 4)) mod 16`.
#[inline]
pub const fn shift_lane(lane: usize) -> usize {
    (lane + 4 * (lane % 4)) % LANES
}

/// Inverse of [`shift_lane`]: `(i − 4·(i mod 4)) mod 16`.
#[inline]
pub const fn unshift_lane(lane: usize) -> usize {
    (lane + LANES - 4 * (lane % 4)) % LANES
}

/// Gathers `state[shift_lane(i)]` into lane `i`.
#[inline]
pub fn shift_rows(state: &mut Block) {
    let src = *state;
    for (lane, byte) in state.iter_mut().enumerate() {
        *byte = src[SHIFT_LANES[lane]];
    }
}

/// Gathers `state[unshift_lane(i)]` into lane `i`.
#[inline]
pub fn inv_shift_rows(state: &mut Block) {
    let src = *state;
    for (lane, byte) in state.iter_mut().enumerate() {
        *byte = src[UNSHIFT_LANES[lane]];
    }
}
