//! # rosca-cli — Operator CLI for the ROSCA Stack
//!
//! Provides the `rosca` command-line interface for work that does not need
//! the HTTP service running.
//!
//! ## Subcommands
//!
//! - `rosca keys` — Ed25519 issuer key generation and disclosure issuance.
//! - `rosca amount` — Decimal/micro-unit conversion with the ledger's rules.
//! - `rosca policy` — Circle policy validation from YAML.
//! - `rosca simulate` — Offline end-to-end circle lifecycle from a scenario file.
//!
//! ```bash
//! rosca keys keygen --output keys/ --prefix issuer
//! rosca keys issue --key keys/issuer.key --subject alice --country USA --age 30
//! rosca policy check circle.yaml
//! rosca simulate scenario.yaml
//! ```

pub mod amount;
pub mod keys;
pub mod policy;
pub mod simulate;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Read and deserialize a YAML file.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("failed to parse YAML: {}", path.display()))
}
