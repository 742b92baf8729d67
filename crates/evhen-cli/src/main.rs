//! Command-line interface for EVHEN white-box table generation.

#![forbid(unsafe_code)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use evhen_field::{Block, LANES};
use evhen_gen::emit::{guard_stem, render_c_header, DECRYPTION_TABLE_NAME, ENCRYPTION_TABLE_NAME};
use evhen_gen::{GenError, Generator, GeneratorConfig, TableNetwork, TableSet};
use evhen_runtime::WbCipher;
use log::info;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

const EXIT_CONFIG: u8 = 3;
const EXIT_IO: u8 = 4;
const EXIT_INTERNAL: u8 = 5;

const DEMO_MESSAGE: &[u8; LANES] = b"White-Box sample";

/// EVHEN white-box table generator.
#[derive(Parser)]
#[command(
    name = "evhen",
    version,
    author,
    about = "Generates chaotic white-box lookup-table networks (EVHEN)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate encryption and decryption tables.
    Gen {
        /// Rounds per chain (at least 2).
        #[arg(long, default_value_t = 10)]
        rounds: u32,
        /// Minimum mix sets per round.
        #[arg(long, default_value_t = 1)]
        min_mixes: u32,
        /// Maximum mix sets per round.
        #[arg(long, default_value_t = 3)]
        max_mixes: u32,
        /// Output path for the encryption tables.
        #[arg(long, value_name = "FILE")]
        encr_out: PathBuf,
        /// Output path for the decryption tables.
        #[arg(long, value_name = "FILE")]
        decr_out: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::C)]
        format: OutputFormat,
        /// Optional RNG seed for reproducible generation.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Verify that binary table files decrypt what they encrypt.
    Check {
        /// Encryption tables written with `--format bin`.
        #[arg(long, value_name = "FILE")]
        encr: PathBuf,
        /// Decryption tables written with `--format bin`.
        #[arg(long, value_name = "FILE")]
        decr: PathBuf,
        /// Number of random blocks to test.
        #[arg(long, default_value_t = 16)]
        samples: usize,
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate a network in memory and round-trip a sample block.
    Demo {
        /// Rounds per chain (at least 2).
        #[arg(long, default_value_t = 10)]
        rounds: u32,
        /// Minimum mix sets per round.
        #[arg(long, default_value_t = 1)]
        min_mixes: u32,
        /// Maximum mix sets per round.
        #[arg(long, default_value_t = 3)]
        max_mixes: u32,
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// C header with one `tbox_t` array per round.
    C,
    /// bincode-serialized table set.
    Bin,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Gen {
            rounds,
            min_mixes,
            max_mixes,
            encr_out,
            decr_out,
            format,
            seed,
        } => cmd_gen(
            GeneratorConfig {
                rounds,
                min_mixes,
                max_mixes,
            },
            &encr_out,
            &decr_out,
            format,
            seed,
        ),
        Commands::Check {
            encr,
            decr,
            samples,
            seed,
        } => cmd_check(&encr, &decr, samples, seed),
        Commands::Demo {
            rounds,
            min_mixes,
            max_mixes,
            seed,
        } => cmd_demo(
            GeneratorConfig {
                rounds,
                min_mixes,
                max_mixes,
            },
            seed,
        ),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let status = exit_status(&err);
            match status {
                EXIT_CONFIG => eprintln!("configuration error: {err:#}"),
                EXIT_IO => eprintln!("I/O error: {err:#}"),
                _ => eprintln!("unexpected internal error: {err:#}"),
            }
            ExitCode::from(status)
        }
    }
}

fn exit_status(err: &anyhow::Error) -> u8 {
    let config = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<GenError>())
        .any(GenError::is_config);
    if config {
        EXIT_CONFIG
    } else if err.chain().any(|cause| cause.is::<io::Error>()) {
        EXIT_IO
    } else {
        EXIT_INTERNAL
    }
}

fn cmd_gen(
    config: GeneratorConfig,
    encr_out: &Path,
    decr_out: &Path,
    format: OutputFormat,
    seed: Option<u64>,
) -> Result<()> {
    config.validate()?;
    let mut gen = Generator::with_config(seeded_rng(seed), config)?;
    let network = gen.generate().context("generate table network")?;

    let (encr, decr) = match format {
        OutputFormat::C => (
            render_c_header(&network.encryption, &guard_stem(encr_out), ENCRYPTION_TABLE_NAME)
                .into_bytes(),
            render_c_header(&network.decryption, &guard_stem(decr_out), DECRYPTION_TABLE_NAME)
                .into_bytes(),
        ),
        OutputFormat::Bin => (
            network.encryption.to_bytes().context("serialize encryption tables")?,
            network.decryption.to_bytes().context("serialize decryption tables")?,
        ),
    };

    write_output(encr_out, &encr)?;
    if let Err(err) = write_output(decr_out, &decr) {
        let _ = fs::remove_file(encr_out);
        return Err(err);
    }
    info!(
        "wrote {} and {}",
        encr_out.display(),
        decr_out.display()
    );
    Ok(())
}

fn cmd_check(encr: &Path, decr: &Path, samples: usize, seed: Option<u64>) -> Result<()> {
    let encryption = load_set(encr)?;
    let decryption = load_set(decr)?;
    let Some(network) = TableNetwork::from_sets(encryption, decryption) else {
        bail!("encryption and decryption tables must hold the same number (>= 2) of rounds");
    };
    let cipher = WbCipher::new(network);
    let mut rng = seeded_rng(seed);

    for _ in 0..samples {
        let mut plain: Block = [0u8; LANES];
        rng.fill_bytes(&mut plain);
        let mut block = plain;
        cipher.encrypt_block(&mut block);
        cipher.decrypt_block(&mut block);
        if block != plain {
            bail!("round trip mismatch for block {}", hex::encode(plain));
        }
    }
    println!(
        "ok: {} samples, {} rounds",
        samples,
        cipher.network().params.rounds
    );
    Ok(())
}

fn cmd_demo(config: GeneratorConfig, seed: Option<u64>) -> Result<()> {
    config.validate()?;
    let mut gen = Generator::with_config(seeded_rng(seed), config)?;
    let network = gen.generate().context("generate table network")?;
    let bytes = network.to_bytes().context("serialize network")?;
    let network = TableNetwork::from_bytes(&bytes).context("deserialize network")?;
    let cipher = WbCipher::new(network);

    let mut block: Block = *DEMO_MESSAGE;
    let plaintext_hex = hex::encode(block);
    cipher.encrypt_block(&mut block);
    let ciphertext_hex = hex::encode(block);
    cipher.decrypt_block(&mut block);
    let decrypted_hex = hex::encode(block);

    println!("rounds: {}", config.rounds);
    println!("network: {} bytes", bytes.len());
    println!("plaintext: {}", plaintext_hex);
    println!("ciphertext: {}", ciphertext_hex);
    println!("decrypted: {}", decrypted_hex);
    if &block != DEMO_MESSAGE {
        bail!("demo roundtrip failed");
    }
    println!("message: {}", String::from_utf8_lossy(&block));
    Ok(())
}

/// Writes `contents` to `path`, removing the file if the write fails.
fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    let written = fs::File::create(path).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    if let Err(err) = written {
        let _ = fs::remove_file(path);
        return Err(err).with_context(|| format!("write {}", path.display()));
    }
    Ok(())
}

fn load_set(path: &Path) -> Result<TableSet> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    TableSet::from_bytes(&bytes).with_context(|| format!("deserialize {}", path.display()))
}

fn seeded_rng(seed: Option<u64>) -> impl RngCore + CryptoRng {
    match seed {
        Some(value) => {
            let mut seed_bytes = [0u8; 32];
            seed_bytes[..8].copy_from_slice(&value.to_le_bytes());
            ChaCha20Rng::from_seed(seed_bytes)
        }
        None => {
            let mut seed_bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed_bytes);
            ChaCha20Rng::from_seed(seed_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_map_to_their_own_status() {
        let err = anyhow::Error::new(GenError::InvalidRoundCount(1));
        assert_eq!(exit_status(&err), EXIT_CONFIG);
        let err = anyhow::Error::new(GenError::InvalidMixRange { min: 3, max: 1 });
        assert_eq!(exit_status(&err.context("gen")), EXIT_CONFIG);
    }

    #[test]
    fn io_and_internal_errors_are_distinct() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = anyhow::Error::new(io_err).context("write tables.h");
        assert_eq!(exit_status(&err), EXIT_IO);
        let err = anyhow::Error::new(GenError::UninitializedMatrix);
        assert_eq!(exit_status(&err), EXIT_INTERNAL);
        assert_eq!(exit_status(&anyhow::anyhow!("boom")), EXIT_INTERNAL);
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = std::env::temp_dir().join("evhen-cli-missing-dir-for-test");
        let path = dir.join("tables.h");
        assert!(write_output(&path, b"data").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn format_flag_parses() {
        let cli = Cli::try_parse_from([
            "evhen", "gen", "--encr-out", "e.bin", "--decr-out", "d.bin", "--format", "bin",
            "--rounds", "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Gen { format, rounds, .. } => {
                assert_eq!(format, OutputFormat::Bin);
                assert_eq!(rounds, 4);
            }
            _ => panic!("expected gen"),
        }
    }
}
