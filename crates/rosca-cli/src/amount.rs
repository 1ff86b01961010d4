//! # Amount Subcommand
//!
//! Converts between the canonical decimal form accepted by the API and the
//! integer micro-units the ledger stores.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use rosca_core::Amount;

/// Arguments for the `rosca amount` subcommand.
#[derive(Args, Debug)]
pub struct AmountArgs {
    #[command(subcommand)]
    pub command: AmountCommand,
}

/// Amount subcommands.
#[derive(Subcommand, Debug)]
pub enum AmountCommand {
    /// Parse a decimal amount and print its micro-units.
    Parse {
        /// Decimal amount, e.g. `100.00`.
        value: String,
    },
    /// Render micro-units as a decimal amount.
    Format {
        /// Integer micro-units.
        micros: u128,
    },
}

/// Execute the amount subcommand.
pub fn run_amount(args: &AmountArgs) -> Result<u8> {
    match &args.command {
        AmountCommand::Parse { value } => {
            println!("{}", parse_micros(value)?);
            Ok(0)
        }
        AmountCommand::Format { micros } => {
            println!("{}", Amount::from_micros(*micros).format());
            Ok(0)
        }
    }
}

fn parse_micros(value: &str) -> Result<u128> {
    let amount = Amount::parse(value).map_err(|e| anyhow!("invalid amount {value:?}: {e}"))?;
    Ok(amount.micros())
}
