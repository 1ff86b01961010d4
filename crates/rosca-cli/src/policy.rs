//! # Policy Subcommand
//!
//! Validates a circle policy document before it is submitted to the API.
//!
//! The document uses the same camelCase fields as `POST /v1/circles`. The
//! amount may be quoted or plain; either way it is read exactly as written,
//! trailing zeros included:
//!
//! ```yaml
//! monthlyAmount: "100.00"
//! maxMembers: 3
//! durationPeriods: 3
//! countryCode: USA
//! minAge: 18
//! maxAge: 65
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use rosca_state::{CirclePolicy, CirclePolicyDraft};

/// Arguments for the `rosca policy` subcommand.
#[derive(Args, Debug)]
pub struct PolicyArgs {
    #[command(subcommand)]
    pub command: PolicyCommand,
}

/// Policy subcommands.
#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Validate a policy YAML file. Exits 1 when the policy is rejected.
    Check {
        /// Path to the policy file.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Execute the policy subcommand.
pub fn run_policy(args: &PolicyArgs) -> Result<u8> {
    match &args.command {
        PolicyCommand::Check { file } => {
            let draft: CirclePolicyDraft = crate::read_yaml(file)?;
            match check(draft) {
                Ok(policy) => {
                    println!("OK: {}", file.display());
                    println!(
                        "  {} members x {} per period, {} periods, {} aged {}-{}",
                        policy.max_members(),
                        policy.monthly_amount(),
                        policy.duration_periods(),
                        policy.country_code(),
                        policy.min_age(),
                        policy.max_age()
                    );
                    Ok(0)
                }
                Err(reason) => {
                    println!("FAIL: {}: {reason}", file.display());
                    Ok(1)
                }
            }
        }
    }
}

fn check(draft: CirclePolicyDraft) -> Result<CirclePolicy, String> {
    CirclePolicy::new(draft).map_err(|e| e.to_string())
}
