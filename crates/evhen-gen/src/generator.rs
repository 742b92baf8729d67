//! Chain builder and table flasher.

use evhen_field::{multiply, xor_all, xor_in_place, Block, Poly, LANES};
use log::info;

use crate::entropy::EntropySource;
use crate::error::{GenError, GenResult};
use crate::instance::{NetworkParams, TableNetwork};
use crate::round::{Encoding, MixRange, Round};
use crate::tables::{RoundTables, TableSet};

/// Configuration for the generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Rounds per chain; at least 2.
    pub rounds: u32,
    /// Minimum mix sets per non-terminal round.
    pub min_mixes: u32,
    /// Maximum mix sets per non-terminal round.
    pub max_mixes: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rounds: 10,
            min_mixes: 1,
            max_mixes: 3,
        }
    }
}

impl GeneratorConfig {
    /// Checks the round count and mix range.
    pub fn validate(&self) -> GenResult<MixRange> {
        if self.rounds < 2 {
            return Err(GenError::InvalidRoundCount(self.rounds));
        }
        MixRange::new(self.min_mixes, self.max_mixes)
    }
}

/// Both round chains of one network, index-addressed.
#[derive(Clone, Debug)]
pub struct RoundChains {
    /// Encryption rounds; the last one is terminal.
    pub forward: Vec<Round>,
    /// Decryption rounds; the last one is terminal.
    pub decryption: Vec<Round>,
}

/// Table network generator parametrized by an entropy source.
pub struct Generator<R: EntropySource> {
    rng: R,
    config: GeneratorConfig,
    range: MixRange,
}

impl<R: EntropySource> Generator<R> {
    /// Creates a generator with the default configuration.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            config: GeneratorConfig::default(),
            range: MixRange::default(),
        }
    }

    /// Creates a generator with an explicit, validated configuration.
    pub fn with_config(rng: R, config: GeneratorConfig) -> GenResult<Self> {
        let range = config.validate()?;
        Ok(Self { rng, config, range })
    }

    /// Active configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Builds the forward chain, then the decryption chain from its inverted
    /// S-boxes.
    pub fn build_chains(&mut self) -> GenResult<RoundChains> {
        let rounds = self.config.rounds as usize;
        let range = self.range;
        let rng = &mut self.rng;

        let mut forward: Vec<Round> = Vec::with_capacity(rounds);
        forward.push(Round::forward(range, &Encoding::none(), rng)?);
        for i in 1..rounds - 1 {
            let round = Round::forward(range, forward[i - 1].encoding(), rng)?;
            forward.push(round);
        }
        let last = Round::terminal(range, forward[rounds - 2].encoding(), rng)?;
        forward.push(last);

        let mut decryption: Vec<Round> = Vec::with_capacity(rounds);
        decryption.push(Round::decrypt(
            range,
            forward[rounds - 1].clear_sboxes().invert(),
            forward[rounds - 2].mds().clone(),
            forward[rounds - 2].field(),
            &Encoding::none(),
            rng,
        )?);
        for i in (1..rounds - 1).rev() {
            let prev = &decryption[decryption.len() - 1];
            let round = Round::decrypt(
                range,
                forward[i].clear_sboxes().invert(),
                forward[i - 1].mds().clone(),
                forward[i - 1].field(),
                prev.encoding(),
                rng,
            )?;
            decryption.push(round);
        }
        let prev = &decryption[decryption.len() - 1];
        let last = Round::terminal_decrypt(
            range,
            forward[0].clear_sboxes().invert(),
            forward[0].field(),
            prev.encoding(),
            rng,
        )?;
        decryption.push(last);

        info!(
            "built round chains: {} rounds, {}..={} mix sets",
            rounds,
            range.min(),
            range.max()
        );
        Ok(RoundChains {
            forward,
            decryption,
        })
    }

    /// Expands both chains into lookup tables.
    pub fn flash(&mut self, chains: &RoundChains) -> GenResult<TableNetwork> {
        let encryption = self.flash_chain(&chains.forward)?;
        info!("flashed encryption tables ({} rounds)", encryption.len());
        let decryption = self.flash_chain(&chains.decryption)?;
        info!("flashed decryption tables ({} rounds)", decryption.len());
        Ok(TableNetwork {
            params: NetworkParams {
                rounds: self.config.rounds as usize,
                min_mixes: self.config.min_mixes,
                max_mixes: self.config.max_mixes,
                ..NetworkParams::default()
            },
            encryption,
            decryption,
        })
    }

    /// [`Generator::build_chains`] followed by [`Generator::flash`].
    pub fn generate(&mut self) -> GenResult<TableNetwork> {
        let chains = self.build_chains()?;
        self.flash(&chains)
    }

    fn flash_chain(&mut self, rounds: &[Round]) -> GenResult<TableSet> {
        let mut set = TableSet::default();
        for round in rounds {
            set.push(flash_round(&mut self.rng, round)?);
        }
        Ok(set)
    }
}

/// Entry for lane `j`, input `k`, output byte `c`:
/// `mix_c(S_j(k) · D[c][j]) ^ submask_j[c]`.
pub fn flash_round<E: EntropySource>(entropy: &mut E, round: &Round) -> GenResult<RoundTables> {
    let diffusion = round.diffusion()?;
    let encoding = round.encoding();
    let submasks = if !round.kind().is_terminal() && encoding.has_mask() {
        Some(split_mask(entropy, encoding.mask()))
    } else {
        None
    };
    let field = round.field();

    let mut tables = RoundTables::new_zeroed();
    for lane in 0..LANES {
        let column: Block = match &diffusion {
            Some(matrix) => core::array::from_fn(|out| matrix[out][lane]),
            None => core::array::from_fn(|out| u8::from(out == lane)),
        };
        let sbox = round.sboxes().lane(lane);
        for k in 0..=255u8 {
            let s = sbox.apply(k);
            let mut entry: Block =
                core::array::from_fn(|out| encoding.mix(out, multiply(s, column[out], field)));
            if let Some(parts) = &submasks {
                xor_in_place(&mut entry, &parts[lane]);
            }
            tables.lanes[lane].set(k, &entry);
        }
    }
    Ok(tables)
}

/// Splits a 16-byte mask into one sub-mask per lane; the sub-masks XOR to
/// `mask`.
///
/// # Panics
/// Panics if `mask` is not [`LANES`] bytes wide.
pub fn split_mask<E: EntropySource>(entropy: &mut E, mask: &Poly) -> [Block; LANES] {
    let mut parts = [[0u8; LANES]; LANES];
    for part in parts.iter_mut().take(LANES - 1) {
        part.copy_from_slice(Poly::random(entropy, LANES, true, false).coeffs());
    }
    let mut last: Block = [0u8; LANES];
    last.copy_from_slice(mask.coeffs());
    xor_in_place(&mut last, &xor_all(&parts[..LANES - 1]));
    parts[LANES - 1] = last;
    parts
}
