//! Lookup-table storage for flashed rounds.

use evhen_field::{Block, LANES};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

/// Entries per lane table (one per input byte).
pub const ENTRIES: usize = 256;

/// Bytes per entry (one per output lane).
pub const ENTRY_BYTES: usize = LANES;

/// An 8→128-bit table `x ∈ u8 → 16-byte contribution`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneTable {
    #[serde(with = "BigArray")]
    entries: [Block; ENTRIES],
}

impl LaneTable {
    /// Allocates a zeroed table.
    pub fn new_zeroed() -> Self {
        Self {
            entries: [[0u8; ENTRY_BYTES]; ENTRIES],
        }
    }

    /// Writes the entry for `x`.
    pub fn set(&mut self, x: u8, value: &Block) {
        self.entries[x as usize] = *value;
    }

    /// Reads the entry for `x`.
    #[inline]
    pub fn get(&self, x: u8) -> &Block {
        &self.entries[x as usize]
    }

    /// All entries in input order.
    pub fn entries(&self) -> &[Block; ENTRIES] {
        &self.entries
    }
}

impl Default for LaneTable {
    fn default() -> Self {
        Self::new_zeroed()
    }
}

/// The sixteen lane tables of one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTables {
    /// Tables indexed by lane.
    pub lanes: Vec<LaneTable>,
}

impl RoundTables {
    /// Allocates zeroed tables for the round.
    pub fn new_zeroed() -> Self {
        Self {
            lanes: vec![LaneTable::new_zeroed(); LANES],
        }
    }

    /// Table for `lane`.
    #[inline]
    pub fn lane(&self, lane: usize) -> &LaneTable {
        &self.lanes[lane]
    }

    /// Whether the round holds exactly one table per lane.
    pub fn is_complete(&self) -> bool {
        self.lanes.len() == LANES
    }
}

impl Default for RoundTables {
    fn default() -> Self {
        Self::new_zeroed()
    }
}

/// Tables for every round of one chain, in evaluation order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSet {
    /// Round tables in evaluation order.
    pub rounds: Vec<RoundTables>,
}

impl TableSet {
    /// Number of rounds.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Whether the set has no rounds.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Appends a round.
    pub fn push(&mut self, round: RoundTables) {
        self.rounds.push(round);
    }

    /// Whether every round has sixteen lane tables.
    pub fn is_well_formed(&self) -> bool {
        self.rounds.iter().all(RoundTables::is_complete)
    }

    /// Serializes the set with `bincode`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserializes a set with `bincode`, rejecting rounds that do not hold
    /// sixteen lane tables.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        let set: Self = bincode::deserialize(bytes)?;
        if !set.is_well_formed() {
            return Err(Box::new(bincode::ErrorKind::Custom(format!(
                "table set rounds must hold {LANES} lane tables"
            ))));
        }
        Ok(set)
    }
}
