//! # Tonk CLI Library
//!
//! Developer tooling around the Tonk engine: deal a round for inspection,
//! simulate rounds with auto-play policies, verify settlement ledgers and
//! show the resolved configuration.
//!
//! ## Main Entry Point
//!
//! [`run`] parses the arguments, dispatches to a subcommand and returns the
//! process exit code.
//!
//! ```
//! let mut out = Vec::new();
//! let mut err = Vec::new();
//! let code = tonk_cli::run(["tonk", "deal", "--seed", "42"], &mut out, &mut err);
//! assert_eq!(code, 0);
//! assert!(String::from_utf8(out).unwrap().starts_with("Seed: 42"));
//! ```
//!
//! ## Available Subcommands
//!
//! - `deal`: Deal one round and print every hand
//! - `sim`: Play many rounds with a policy and write the settlements as JSONL
//! - `verify`: Validate a settlement ledger
//! - `cfg`: Display current configuration settings

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

mod commands;
pub mod config;
mod error;
pub mod exit_code;
mod ui;

use commands::{
    handle_cfg_command, handle_deal_command, handle_sim_command, handle_verify_command, SimOptions,
};

pub use error::{BatchValidationError, CliError};

#[derive(Debug, Parser)]
#[command(name = "tonk", version, about = "Tonk engine developer tools")]
pub struct TonkCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Deal one round and print every hand with its value
    Deal {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        seats: Option<usize>,
    },
    /// Play rounds with an auto-play policy in every seat
    Sim {
        #[arg(long, default_value_t = 100)]
        rounds: u64,
        #[arg(long)]
        seats: Option<usize>,
        #[arg(long)]
        stake: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        policy: Option<String>,
        #[arg(long)]
        max_turns: Option<u32>,
        /// JSONL file receiving one settlement per finished round
        #[arg(long)]
        output: Option<String>,
    },
    /// Validate a settlement ledger
    Verify {
        #[arg(long)]
        input: PathBuf,
    },
    /// Display the resolved configuration
    Cfg,
}

const COMMANDS: &[&str] = &["deal", "sim", "verify", "cfg"];

/// Parses `args` and runs the chosen subcommand.
///
/// Returns `0` on success and `2` for any error, including invalid arguments.
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let cli = match TonkCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => return usage_error(e, out, err),
    };

    let result = match cli.cmd {
        Commands::Deal { seed, seats } => deal(seed, seats, out),
        Commands::Sim {
            rounds,
            seats,
            stake,
            seed,
            policy,
            max_turns,
            output,
        } => handle_sim_command(
            SimOptions {
                rounds,
                seats,
                stake,
                seed,
                policy,
                max_turns,
                output,
            },
            out,
            err,
        ),
        Commands::Verify { input } => handle_verify_command(&input, out, err),
        Commands::Cfg => handle_cfg_command(out, err),
    };

    match result {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            let _ = writeln!(err, "Error: {}", e);
            exit_code::ERROR
        }
    }
}

/// `deal` takes seed and seat count from the flags, then the configuration.
fn deal(seed: Option<u64>, seats: Option<usize>, out: &mut dyn Write) -> Result<(), CliError> {
    let cfg = config::load().map_err(|e| CliError::Config(e.to_string()))?;
    let seats = seats.unwrap_or(cfg.seats);
    config::check_seats(seats).map_err(CliError::InvalidInput)?;
    let seed = seed.or(cfg.seed).unwrap_or_else(rand::random);
    handle_deal_command(seed, seats, out)
}

fn usage_error(e: clap::Error, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    use clap::error::ErrorKind;

    // Help and version print to stdout and succeed
    if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        return match write!(out, "{}", e) {
            Ok(()) => exit_code::SUCCESS,
            Err(_) => exit_code::ERROR,
        };
    }
    let _ = writeln!(err, "{}", e);
    let _ = writeln!(err, "Usage: tonk <command> [options]\n");
    let _ = writeln!(err, "Commands:");
    for c in COMMANDS {
        let _ = writeln!(err, "  {}", c);
    }
    let _ = writeln!(err, "\nFor full help, run: tonk --help");
    exit_code::ERROR
}
