//! Round construction and encoding absorption.
//!
//! A round owns a clear S-box family, a Cauchy MDS layer over its own field,
//! and an output [`Encoding`] (mix sets plus an additive mask). When a round
//! follows another one it folds the predecessor's encoding into its composed
//! S-boxes, so the byte that reaches lane `i` is decoded inside the table
//! lookup instead of in the clear.

use evhen_field::{multiply, shift_lane, unshift_lane, Poly, FIELD_POLYS, FIELD_POLY_COUNT, LANES};
use log::debug;

use crate::entropy::EntropySource;
use crate::error::{GenError, GenResult};
use crate::matrix::{CauchyMatrix, Matrix};
use crate::sbox::SboxFamily;

/// Which construction a round follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoundKind {
    /// Encryption round with an MDS layer and an output encoding.
    Forward,
    /// Last encryption round: substitution only.
    Terminal,
    /// Decryption round diffusing through the inverse MDS matrix.
    Decrypt,
    /// Last decryption round: substitution only.
    TerminalDecrypt,
}

impl RoundKind {
    /// True for the substitution-only variants.
    pub fn is_terminal(self) -> bool {
        matches!(self, RoundKind::Terminal | RoundKind::TerminalDecrypt)
    }

    /// True for the decryption-chain variants.
    pub fn is_decryption(self) -> bool {
        matches!(self, RoundKind::Decrypt | RoundKind::TerminalDecrypt)
    }

    /// State position that feeds `lane`.
    #[inline]
    pub fn source_lane(self, lane: usize) -> usize {
        if self.is_decryption() {
            unshift_lane(lane)
        } else {
            shift_lane(lane)
        }
    }
}

/// Lifecycle of a [`Round`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    /// Constructed, nothing drawn yet.
    Empty,
    /// S-boxes, layer and encoding are in place.
    Built,
    /// Layer and encoding released; S-boxes kept.
    Cleared,
}

/// Inclusive bounds on the number of mix sets per round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MixRange {
    min: u32,
    max: u32,
}

impl MixRange {
    /// Validates `min <= max`.
    pub fn new(min: u32, max: u32) -> GenResult<Self> {
        if min > max {
            return Err(GenError::InvalidMixRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    pub fn min(self) -> u32 {
        self.min
    }

    /// Upper bound.
    pub fn max(self) -> u32 {
        self.max
    }

    /// Whether rounds built with this range carry an output encoding at all.
    pub fn is_disabled(self) -> bool {
        self.max == 0
    }

    fn draw<E: EntropySource>(self, entropy: &mut E) -> usize {
        let span = (self.max - self.min) as usize + 1;
        self.min as usize + entropy.random_index(span)
    }
}

impl Default for MixRange {
    fn default() -> Self {
        Self { min: 1, max: 3 }
    }
}

/// Scalar multiplication of one lane under its own field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneMix {
    /// Nonzero multiplier.
    pub multiplier: u8,
    /// Field polynomial the product is taken in.
    pub field: u8,
}

impl LaneMix {
    /// `multiplier · value` in `field`.
    #[inline]
    pub fn apply(self, value: u8) -> u8 {
        multiply(self.multiplier, value, self.field)
    }
}

/// One mixing layer: a [`LaneMix`] per lane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixSet {
    lanes: [LaneMix; LANES],
}

impl MixSet {
    /// Draws a layer whose lanes use sixteen distinct catalog fields.
    pub fn random<E: EntropySource>(entropy: &mut E) -> Self {
        let mut fields: [u8; FIELD_POLY_COUNT] = FIELD_POLYS;
        entropy.shuffle(&mut fields);
        let lanes = core::array::from_fn(|lane| LaneMix {
            multiplier: entropy.random_nonzero_byte(),
            field: fields[lane],
        });
        Self { lanes }
    }

    /// Builds a layer from explicit lane multiplications.
    pub fn from_lanes(lanes: [LaneMix; LANES]) -> Self {
        Self { lanes }
    }

    /// Multiplication applied to `lane`.
    pub fn lane(&self, lane: usize) -> LaneMix {
        self.lanes[lane]
    }
}

/// Output transform a round leaves on its state bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Encoding {
    mixes: Vec<MixSet>,
    mask: Poly,
}

impl Encoding {
    /// No mixing and no mask; seeds both chains.
    pub fn none() -> Self {
        Self::default()
    }

    /// Combines mix sets with an additive mask (empty or 16 bytes wide).
    pub fn new(mixes: Vec<MixSet>, mask: Poly) -> Self {
        Self { mixes, mask }
    }

    /// Mix sets, in application order.
    pub fn mixes(&self) -> &[MixSet] {
        &self.mixes
    }

    /// Additive mask.
    pub fn mask(&self) -> &Poly {
        &self.mask
    }

    /// Whether a full-width mask is present.
    pub fn has_mask(&self) -> bool {
        self.mask.len() == LANES
    }

    /// True when applying the encoding changes nothing.
    pub fn is_identity(&self) -> bool {
        self.mixes.is_empty() && !self.has_mask()
    }

    /// Runs `value` through every mix set at `lane`.
    #[inline]
    pub fn mix(&self, lane: usize, value: u8) -> u8 {
        self.mixes
            .iter()
            .fold(value, |acc, set| set.lane(lane).apply(acc))
    }

    /// Mixes `value` at `lane`, then adds the mask byte.
    #[inline]
    pub fn apply(&self, lane: usize, value: u8) -> u8 {
        let mixed = self.mix(lane, value);
        if self.has_mask() {
            mixed ^ self.mask[lane]
        } else {
            mixed
        }
    }
}

/// One round of either chain.
#[derive(Clone, Debug)]
pub struct Round {
    kind: RoundKind,
    range: MixRange,
    state: RoundState,
    clear: SboxFamily,
    composed: SboxFamily,
    mds: CauchyMatrix,
    field: u8,
    encoding: Encoding,
}

impl Round {
    /// Unbuilt round of the given kind.
    pub fn empty(kind: RoundKind, range: MixRange) -> Self {
        Self {
            kind,
            range,
            state: RoundState::Empty,
            clear: SboxFamily::identity(),
            composed: SboxFamily::identity(),
            mds: CauchyMatrix::default(),
            field: 0,
            encoding: Encoding::none(),
        }
    }

    /// Encryption round following `prev`.
    pub fn forward<E: EntropySource>(
        range: MixRange,
        prev: &Encoding,
        entropy: &mut E,
    ) -> GenResult<Self> {
        let mut round = Self::empty(RoundKind::Forward, range);
        round.init_chained(prev, entropy)?;
        Ok(round)
    }

    /// Final encryption round following `prev`.
    pub fn terminal<E: EntropySource>(
        range: MixRange,
        prev: &Encoding,
        entropy: &mut E,
    ) -> GenResult<Self> {
        let mut round = Self::empty(RoundKind::Terminal, range);
        round.init_chained(prev, entropy)?;
        Ok(round)
    }

    /// Decryption round over known S-boxes and a forward round's layer.
    pub fn decrypt<E: EntropySource>(
        range: MixRange,
        clear: SboxFamily,
        mds: CauchyMatrix,
        field: u8,
        prev: &Encoding,
        entropy: &mut E,
    ) -> GenResult<Self> {
        let mut round = Self::empty(RoundKind::Decrypt, range);
        round.init_with(clear, Some(mds), field, prev, entropy)?;
        Ok(round)
    }

    /// Final decryption round over known S-boxes.
    pub fn terminal_decrypt<E: EntropySource>(
        range: MixRange,
        clear: SboxFamily,
        field: u8,
        prev: &Encoding,
        entropy: &mut E,
    ) -> GenResult<Self> {
        let mut round = Self::empty(RoundKind::TerminalDecrypt, range);
        round.init_with(clear, None, field, prev, entropy)?;
        Ok(round)
    }

    /// Draws S-boxes, field, MDS layer and output encoding from scratch.
    pub fn init<E: EntropySource>(&mut self, entropy: &mut E) -> GenResult<()> {
        self.clear = SboxFamily::random(entropy);
        self.field = FIELD_POLYS[entropy.random_index(FIELD_POLY_COUNT)];
        if self.kind.is_terminal() {
            self.mds.release();
        } else {
            self.mds.init_random(LANES, self.field, entropy)?;
        }
        self.encoding = self.draw_encoding(entropy);
        self.composed = self.clear.clone();
        self.state = RoundState::Built;
        self.log_built();
        Ok(())
    }

    /// [`Round::init`], then absorbs `prev`.
    pub fn init_chained<E: EntropySource>(
        &mut self,
        prev: &Encoding,
        entropy: &mut E,
    ) -> GenResult<()> {
        self.init(entropy)?;
        self.absorb(prev);
        Ok(())
    }

    /// Builds around supplied S-boxes and layer, draws only the output
    /// encoding, then absorbs `prev`.
    pub fn init_with<E: EntropySource>(
        &mut self,
        clear: SboxFamily,
        mds: Option<CauchyMatrix>,
        field: u8,
        prev: &Encoding,
        entropy: &mut E,
    ) -> GenResult<()> {
        self.clear = clear;
        self.field = field;
        self.mds = match mds {
            Some(mds) if !self.kind.is_terminal() => mds,
            _ => CauchyMatrix::default(),
        };
        self.encoding = self.draw_encoding(entropy);
        self.absorb(prev);
        self.state = RoundState::Built;
        self.log_built();
        Ok(())
    }

    /// Releases the layer and encoding; S-boxes stay.
    pub fn clear(&mut self) {
        self.mds.release();
        self.encoding = Encoding::none();
        self.field = 0;
        self.state = RoundState::Cleared;
    }

    fn draw_encoding<E: EntropySource>(&self, entropy: &mut E) -> Encoding {
        if self.kind.is_terminal() || self.range.is_disabled() {
            return Encoding::none();
        }
        let count = self.range.draw(entropy);
        let mixes = (0..count).map(|_| MixSet::random(entropy)).collect();
        let mask = Poly::random(entropy, LANES, true, false);
        Encoding::new(mixes, mask)
    }

    /// Relocates each clear mapping to the index the predecessor's encoding
    /// sends its input to: `composed_i(prev(j)) = clear_i(j)`.
    fn absorb(&mut self, prev: &Encoding) {
        if prev.is_identity() {
            self.composed = self.clear.clone();
            return;
        }
        let mut composed = self.clear.clone();
        for lane in 0..LANES {
            let src = self.kind.source_lane(lane);
            let clear = self.clear.lane(lane);
            let out = composed.lane_mut(lane);
            for j in 0..=255u8 {
                out.0[prev.apply(src, j) as usize] = clear.apply(j);
            }
        }
        self.composed = composed;
    }

    fn log_built(&self) {
        debug!(
            "built {:?} round: field {:#04x}, {} mix set(s), mask {}",
            self.kind,
            self.field,
            self.encoding.mixes().len(),
            self.encoding.has_mask()
        );
    }

    /// Diffusion matrix used by table flashing: the MDS layer for forward
    /// rounds, its inverse for decryption rounds, `None` for terminal rounds.
    pub fn diffusion(&self) -> GenResult<Option<Matrix>> {
        match self.kind {
            RoundKind::Terminal | RoundKind::TerminalDecrypt => Ok(None),
            RoundKind::Forward if self.mds.is_init() => Ok(Some(self.mds.matrix().clone())),
            RoundKind::Decrypt if self.mds.is_init() => self.mds.inverse().map(Some),
            _ => Err(GenError::UninitializedMatrix),
        }
    }

    /// Round variant.
    pub fn kind(&self) -> RoundKind {
        self.kind
    }

    /// Lifecycle state.
    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Configured mix-set range.
    pub fn mix_range(&self) -> MixRange {
        self.range
    }

    /// Field polynomial of the S-box/MDS products.
    pub fn field(&self) -> u8 {
        self.field
    }

    /// S-boxes before absorption.
    pub fn clear_sboxes(&self) -> &SboxFamily {
        &self.clear
    }

    /// S-boxes after absorption; what tables are built from.
    pub fn sboxes(&self) -> &SboxFamily {
        &self.composed
    }

    /// MDS layer (uninitialized for terminal rounds).
    pub fn mds(&self) -> &CauchyMatrix {
        &self.mds
    }

    /// Output encoding.
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn range(min: u32, max: u32) -> MixRange {
        MixRange::new(min, max).unwrap()
    }

    #[test]
    fn first_round_is_not_composed_and_second_is() {
        let mut rng = ChaCha20Rng::from_seed([70u8; 32]);
        let first = Round::forward(range(1, 1), &Encoding::none(), &mut rng).unwrap();
        assert_eq!(first.sboxes(), first.clear_sboxes());
        assert_eq!(first.encoding().mixes().len(), 1);
        assert!(first.encoding().has_mask());

        let second = Round::forward(range(1, 1), first.encoding(), &mut rng).unwrap();
        assert_ne!(second.sboxes(), second.clear_sboxes());
        assert!(second.sboxes().is_bijective());
        for lane in 0..LANES {
            let src = shift_lane(lane);
            for j in 0..=255u8 {
                let encoded = first.encoding().apply(src, j);
                assert_eq!(
                    second.sboxes().lane(lane).apply(encoded),
                    second.clear_sboxes().lane(lane).apply(j)
                );
            }
        }
    }

    #[test]
    fn decryption_rounds_read_unshifted_lanes() {
        let mut rng = ChaCha20Rng::from_seed([71u8; 32]);
        let source = Round::forward(range(2, 2), &Encoding::none(), &mut rng).unwrap();
        let round = Round::decrypt(
            range(2, 2),
            source.clear_sboxes().invert(),
            source.mds().clone(),
            source.field(),
            source.encoding(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(round.kind(), RoundKind::Decrypt);
        for lane in 0..LANES {
            let src = unshift_lane(lane);
            for j in [0u8, 1, 0x80, 0xff] {
                let encoded = source.encoding().apply(src, j);
                assert_eq!(
                    round.sboxes().lane(lane).apply(encoded),
                    round.clear_sboxes().lane(lane).apply(j)
                );
            }
        }
    }

    #[test]
    fn terminal_rounds_have_no_layer_or_encoding() {
        let mut rng = ChaCha20Rng::from_seed([72u8; 32]);
        let prev = Round::forward(range(1, 3), &Encoding::none(), &mut rng).unwrap();
        let last = Round::terminal(range(1, 3), prev.encoding(), &mut rng).unwrap();
        assert!(last.kind().is_terminal());
        assert!(!last.mds().is_init());
        assert!(last.encoding().is_identity());
        assert_eq!(last.diffusion().unwrap(), None);
        assert!(prev.diffusion().unwrap().is_some());
    }

    #[test]
    fn mask_only_predecessor_is_absorbed() {
        let mut rng = ChaCha20Rng::from_seed([73u8; 32]);
        let mask = Poly::random(&mut rng, LANES, true, false);
        let prev = Encoding::new(Vec::new(), mask);
        let round = Round::forward(range(0, 1), &prev, &mut rng).unwrap();
        assert_ne!(round.sboxes(), round.clear_sboxes());
    }

    #[test]
    fn disabled_range_draws_no_encoding() {
        let mut rng = ChaCha20Rng::from_seed([74u8; 32]);
        let round = Round::forward(range(0, 0), &Encoding::none(), &mut rng).unwrap();
        assert!(round.encoding().is_identity());
        assert!(round.mds().is_init());
    }

    #[test]
    fn mix_sets_use_distinct_fields() {
        let mut rng = ChaCha20Rng::from_seed([75u8; 32]);
        let set = MixSet::random(&mut rng);
        for a in 0..LANES {
            assert_ne!(set.lane(a).multiplier, 0);
            for b in (a + 1)..LANES {
                assert_ne!(set.lane(a).field, set.lane(b).field);
            }
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(
            MixRange::new(3, 1),
            Err(GenError::InvalidMixRange { min: 3, max: 1 })
        );
    }

    #[test]
    fn clear_releases_layer_and_keeps_sboxes() {
        let mut rng = ChaCha20Rng::from_seed([76u8; 32]);
        let mut round = Round::empty(RoundKind::Forward, MixRange::default());
        assert_eq!(round.state(), RoundState::Empty);
        round.init(&mut rng).unwrap();
        assert_eq!(round.state(), RoundState::Built);
        let sboxes = round.clear_sboxes().clone();
        round.clear();
        assert_eq!(round.state(), RoundState::Cleared);
        assert_eq!(round.clear_sboxes(), &sboxes);
        assert!(round.encoding().is_identity());
        assert_eq!(round.field(), 0);
        assert_eq!(round.diffusion(), Err(GenError::UninitializedMatrix));
    }
}
