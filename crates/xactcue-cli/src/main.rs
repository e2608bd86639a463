mod manifest;
mod play;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use soundbank::SoundBank;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::manifest::BankManifest;

#[derive(Parser)]
#[command(name = "xactcue", version, about = "Inspect XACT sound banks and resolve cue playback")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a sound record and print it as JSON.
    Sound {
        /// Path to the sound bank file.
        bank: PathBuf,
        /// Offset of the sound record (decimal or 0x hex).
        #[arg(value_parser = parse_offset)]
        offset: u32,
    },
    /// Decode a cue record and print it as JSON.
    Cue {
        /// Path to the sound bank file.
        bank: PathBuf,
        /// Offset of the cue record (decimal or 0x hex).
        #[arg(value_parser = parse_offset)]
        offset: u32,
        /// Read a simple cue record instead of a complex one.
        #[arg(long)]
        simple: bool,
    },
    /// Resolve plays of a named cue into playback requests, one JSON line per play.
    Play {
        /// Path to the bank manifest (xactcue.json).
        manifest: PathBuf,
        /// Cue name as listed in the manifest.
        cue: String,
        /// Number of plays.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        /// RNG seed; overrides the manifest seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Control variable value for user-controlled cues.
        #[arg(long)]
        variable: Option<f32>,
    },
}

fn parse_offset(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid offset {s:?}: {e}"))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_bank(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read sound bank {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Sound { bank, offset } => {
            let data = read_bank(&bank)?;
            let sound = soundbank::decode_sound(&data, offset as usize)
                .with_context(|| format!("failed to decode sound at {offset:#x}"))?;
            println!("{}", serde_json::to_string_pretty(&sound)?);
        }
        Command::Cue {
            bank,
            offset,
            simple,
        } => {
            let bank = SoundBank::new(read_bank(&bank)?, Vec::new());
            let cue = if simple {
                bank.simple_cue(offset)
            } else {
                bank.complex_cue(offset)
            }
            .with_context(|| format!("failed to decode cue at {offset:#x}"))?;
            println!("{}", serde_json::to_string_pretty(&cue)?);
        }
        Command::Play {
            manifest,
            cue,
            count,
            seed,
            variable,
        } => {
            let manifest = BankManifest::load(&manifest)?;
            let bank = SoundBank::new(read_bank(&manifest.bank)?, manifest.wave_banks.clone());
            let decoded = play::load_cue(&bank, &manifest, &cue)?;

            let mut rng = match seed.or(manifest.seed) {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            info!(cue = %cue, variants = decoded.sounds.len(), count, "playing cue");
            play::play(&bank, &cue, &decoded, count, variable, &mut rng, |record| {
                println!("{}", serde_json::to_string(record)?);
                Ok(())
            })?;
        }
    }

    Ok(())
}
