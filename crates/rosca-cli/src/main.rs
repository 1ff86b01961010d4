//! # rosca CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rosca_cli::amount::{run_amount, AmountArgs};
use rosca_cli::keys::{run_keys, KeysArgs};
use rosca_cli::policy::{run_policy, PolicyArgs};
use rosca_cli::simulate::{run_simulate, SimulateArgs};

/// ROSCA Stack CLI
///
/// Issuer key management, disclosure issuance, amount conversion, circle
/// policy validation, and offline lifecycle simulation.
#[derive(Parser, Debug)]
#[command(name = "rosca", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ed25519 issuer keys and disclosure packages.
    Keys(KeysArgs),

    /// Convert between decimal amounts and micro-units.
    Amount(AmountArgs),

    /// Validate circle policies.
    Policy(PolicyArgs),

    /// Run a circle scenario end to end without the HTTP service.
    Simulate(SimulateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("rosca CLI starting");

    let result = match cli.command {
        Commands::Keys(args) => run_keys(&args),
        Commands::Amount(args) => run_amount(&args),
        Commands::Policy(args) => run_policy(&args),
        Commands::Simulate(args) => run_simulate(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
