//! Generated network representation and serialization helpers.

use evhen_field::LANES;
use serde::{Deserialize, Serialize};

use crate::tables::{TableSet, ENTRY_BYTES};

/// Current binary format version.
pub const FORMAT_VERSION: u32 = 1;

/// Static parameters describing the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Rounds per chain.
    pub rounds: usize,
    /// Lanes per round.
    pub lanes: usize,
    /// Bytes per table entry.
    pub entry_bytes: usize,
    /// Minimum mix sets per non-terminal round.
    pub min_mixes: u32,
    /// Maximum mix sets per non-terminal round.
    pub max_mixes: u32,
    /// Version tag for future compatibility changes.
    pub version: u32,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            rounds: 10,
            lanes: LANES,
            entry_bytes: ENTRY_BYTES,
            min_mixes: 1,
            max_mixes: 3,
            version: FORMAT_VERSION,
        }
    }
}

/// Encryption and decryption table sets produced by one generator run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNetwork {
    /// Static parameters.
    pub params: NetworkParams,
    /// Tables of the forward chain.
    pub encryption: TableSet,
    /// Tables of the decryption chain.
    pub decryption: TableSet,
}

impl TableNetwork {
    /// Pairs separately stored chains. The mix range is not recorded in a
    /// bare table set, so it is reported as `0..=0`.
    pub fn from_sets(encryption: TableSet, decryption: TableSet) -> Option<Self> {
        if encryption.len() != decryption.len() || encryption.len() < 2 {
            return None;
        }
        Some(Self {
            params: NetworkParams {
                rounds: encryption.len(),
                min_mixes: 0,
                max_mixes: 0,
                ..NetworkParams::default()
            },
            encryption,
            decryption,
        })
    }

    /// Serializes the network with `bincode`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserializes a network with `bincode` and checks its shape.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        let network: Self = bincode::deserialize(bytes)?;
        network.check_shape().map_err(|msg| {
            Box::new(bincode::ErrorKind::Custom(msg)) as bincode::Error
        })?;
        Ok(network)
    }

    fn check_shape(&self) -> Result<(), String> {
        let params = &self.params;
        if params.version != FORMAT_VERSION {
            return Err(format!("unsupported format version {}", params.version));
        }
        if params.lanes != LANES || params.entry_bytes != ENTRY_BYTES {
            return Err(format!(
                "unsupported geometry: {} lanes of {}-byte entries",
                params.lanes, params.entry_bytes
            ));
        }
        for (name, set) in [("encryption", &self.encryption), ("decryption", &self.decryption)] {
            if set.len() != params.rounds || !set.is_well_formed() {
                return Err(format!(
                    "{name} tables do not hold {} rounds of {LANES} lanes",
                    params.rounds
                ));
            }
        }
        Ok(())
    }
}
