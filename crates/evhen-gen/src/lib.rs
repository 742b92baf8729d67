//! EVHEN white-box table network generation.
//!
//! This crate builds the two round chains of an EVHEN network and flashes
//! them into lookup tables:
//! - random per-lane S-boxes, a chaotic Cauchy MDS layer over a per-round
//!   field, and per-round output encodings (mix sets and an additive mask);
//! - absorption of each round's output encoding into the next round's
//!   S-boxes, for both the encryption chain and the decryption chain built
//!   from inverted S-boxes;
//! - table flashing with per-lane sub-masks, binary serialization and C
//!   header rendering.
//!
//! All randomness flows through an explicit [`EntropySource`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod emit;
mod entropy;
mod error;
mod generator;
mod instance;
pub mod matrix;
mod round;
mod sbox;
mod tables;

pub use entropy::EntropySource;
pub use error::{GenError, GenResult};
pub use generator::{flash_round, split_mask, Generator, GeneratorConfig, RoundChains};
pub use instance::{NetworkParams, TableNetwork, FORMAT_VERSION};
pub use matrix::{multiply_matrices, CauchyMatrix, Matrix, MAX_CAUCHY_SIZE};
pub use round::{Encoding, LaneMix, MixRange, MixSet, Round, RoundKind, RoundState};
pub use sbox::{Sbox, SboxFamily};
pub use tables::{LaneTable, RoundTables, TableSet, ENTRIES, ENTRY_BYTES};
