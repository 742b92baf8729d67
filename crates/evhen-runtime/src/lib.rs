//! Runtime evaluator for generated EVHEN table networks.
//!
//! A round is evaluated as the XOR of one table row per lane: lane `j` of an
//! encryption round is indexed by state byte `shift_lane(j)`, lane `j` of a
//! decryption round by `unshift_lane(j)`. No key material or field
//! arithmetic is needed at this point.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use evhen_field::lanes::{inv_shift_rows, shift_rows};
use evhen_field::{xor_in_place, Block, LANES};
use evhen_gen::{RoundTables, TableNetwork};
use log::debug;

/// Relabels the state so byte `j` feeds lane `j`, then XORs the rows.
fn eval_round(tables: &RoundTables, input: &Block, relabel: fn(&mut Block)) -> Block {
    let mut gathered = *input;
    relabel(&mut gathered);
    let mut out = [0u8; LANES];
    for (table, &byte) in tables.lanes.iter().zip(gathered.iter()) {
        xor_in_place(&mut out, table.get(byte));
    }
    out
}

/// Evaluates one encryption round.
pub fn encrypt_round(tables: &RoundTables, input: &Block) -> Block {
    eval_round(tables, input, shift_rows)
}

/// Evaluates one decryption round.
pub fn decrypt_round(tables: &RoundTables, input: &Block) -> Block {
    eval_round(tables, input, inv_shift_rows)
}

/// Table-driven cipher over a generated [`TableNetwork`].
#[derive(Clone, Debug)]
pub struct WbCipher {
    network: TableNetwork,
}

impl WbCipher {
    /// Wraps a generated or deserialized network.
    pub fn new(network: TableNetwork) -> Self {
        debug!(
            "loaded table network: {} encryption / {} decryption rounds",
            network.encryption.len(),
            network.decryption.len()
        );
        Self { network }
    }

    /// Underlying network.
    pub fn network(&self) -> &TableNetwork {
        &self.network
    }

    /// Encrypts a 16-byte block in place.
    pub fn encrypt_block(&self, block: &mut Block) {
        for round in &self.network.encryption.rounds {
            *block = encrypt_round(round, block);
        }
    }

    /// Decrypts a 16-byte block in place.
    pub fn decrypt_block(&self, block: &mut Block) {
        for round in &self.network.decryption.rounds {
            *block = decrypt_round(round, block);
        }
    }
}
