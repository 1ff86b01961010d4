//! # Keys Subcommand
//!
//! Ed25519 issuer key generation and disclosure issuance.
//!
//! The public key written by `keygen` is what the API expects in
//! `ROSCA_ISSUER_PUBLIC_KEY`; `issue` produces a verification request body
//! that the API will accept when configured with that key, the same scope,
//! and the same endpoint.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};

use rosca_attest::config::{DEFAULT_ENDPOINT, DEFAULT_SCOPE};
use rosca_attest::{DisclosedAttributes, DisclosureIssuer, DocumentType, Ed25519DisclosureSigner};
use rosca_core::{CountryCode, SubjectId};

/// Arguments for the `rosca keys` subcommand.
#[derive(Args, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

/// Key subcommands.
#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Generate a new Ed25519 issuer keypair.
    Keygen {
        /// Output directory for the keypair files.
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
        /// Prefix for the key filenames.
        #[arg(long, default_value = "issuer")]
        prefix: String,
    },

    /// Issue a signed disclosure and print it as a verification request.
    Issue(IssueArgs),
}

/// Arguments for `rosca keys issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Path to the issuer private key file (hex-encoded 32-byte seed).
    #[arg(long)]
    pub key: PathBuf,
    /// Subject identifier.
    #[arg(long)]
    pub subject: String,
    /// Disclosed nationality (ISO alpha-3).
    #[arg(long)]
    pub country: String,
    /// Disclosed age in years.
    #[arg(long)]
    pub age: u8,
    /// Document type id (1 passport, 2 EU ID card, 3 Aadhaar).
    #[arg(long, default_value_t = 1)]
    pub document: u64,
    /// Application scope the verifier is configured with.
    #[arg(long, default_value = DEFAULT_SCOPE)]
    pub scope: String,
    /// Endpoint the verifier is configured with.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
    /// Disclose a failed sanctions screen.
    #[arg(long)]
    pub sanctioned: bool,
}

/// Execute the keys subcommand.
pub fn run_keys(args: &KeysArgs) -> Result<u8> {
    match &args.command {
        KeysCommand::Keygen { output, prefix } => cmd_keygen(output, prefix),
        KeysCommand::Issue(issue) => {
            let request = issue_request(issue)?;
            println!("{}", serde_json::to_string_pretty(&request)?);
            Ok(0)
        }
    }
}

/// Generate a new Ed25519 keypair and write to files.
fn cmd_keygen(output_dir: &Path, prefix: &str) -> Result<u8> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let signer = Ed25519DisclosureSigner::generate();
    let pk_hex = signer.public_key_hex();

    let sk_path = output_dir.join(format!("{prefix}.key"));
    let pk_path = output_dir.join(format!("{prefix}.pub"));

    std::fs::write(&sk_path, signer.secret_hex())
        .with_context(|| format!("failed to write private key: {}", sk_path.display()))?;
    std::fs::write(&pk_path, &pk_hex)
        .with_context(|| format!("failed to write public key: {}", pk_path.display()))?;

    println!("OK: generated Ed25519 issuer keypair");
    println!("  Private key: {}", sk_path.display());
    println!("  Public key:  {}", pk_path.display());
    println!("  Public key (hex): {pk_hex}");

    Ok(0)
}

/// Build the verification request JSON for one subject.
pub fn issue_request(args: &IssueArgs) -> Result<serde_json::Value> {
    if !args.key.exists() {
        bail!("private key file not found: {}", args.key.display());
    }
    let seed = std::fs::read_to_string(&args.key)
        .with_context(|| format!("failed to read private key: {}", args.key.display()))?;
    let signer = Ed25519DisclosureSigner::from_hex(seed.trim())
        .map_err(|e| anyhow!("invalid private key: {e}"))?;

    let subject = SubjectId::new(&args.subject).context("invalid subject")?;
    let country = CountryCode::new(&args.country).context("invalid country")?;
    let document = DocumentType::from_id(args.document)
        .ok_or_else(|| anyhow!("unsupported document type {}", args.document))?;

    let issuer = DisclosureIssuer::new(signer, args.scope.as_str(), args.endpoint.as_str());
    let package = issuer.issue(
        document,
        &subject,
        DisclosedAttributes {
            nationality_code: Some(country),
            age_at_verification: Some(args.age),
            is_unique: Some(true),
            passed_sanctions_screen: Some(!args.sanctioned),
        },
    );
    tracing::info!(subject = %subject, document = %document, "disclosure issued");

    Ok(serde_json::to_value(package.to_request())?)
}
