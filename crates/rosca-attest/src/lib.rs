//! # rosca-attest — Attestation Verification Gateway
//!
//! Turns an opaque identity attestation into a structured, policy-checked
//! [`AttestationResult`]. The proof system itself is treated as a black box
//! behind the [`ProofVerifier`] trait.
//!
//! ## Architecture
//!
//! - **Package** (`package.rs`): wire request, required-field checks,
//!   document types, the scheme-v1 public-signal layout, context data, and
//!   the statement digest a proof is bound to.
//!
//! - **Traits** (`traits.rs`): [`ProofVerifier`] and [`Prover`]. Object safe,
//!   `Send + Sync`; verification is a pure function of its inputs.
//!
//! - **Mock** (`mock.rs`): [`MockProofSystem`], a transparent proof system
//!   whose proofs are the statement digest itself. No privacy.
//!
//! - **Ed25519** (`ed25519.rs`): signed disclosures from a trusted issuer.
//!
//! - **Issuer** (`issuer.rs`): [`DisclosureIssuer`] builds packages a
//!   verifier with the same scope and endpoint accepts.
//!
//! - **Verifier** (`verifier.rs`): [`AttestationVerifier`] runs structure,
//!   proof, binding, and policy checks and produces the verdict.
//!
//! - **Config** (`config.rs`): [`VerifierConfig`] and proof backend selection
//!   from the environment.
//!
//! ## Outcomes
//!
//! Malformed packages and scheme mismatches are `Err(AttestationError)`.
//! A bad proof, a replay against another deployment, or a failed policy
//! check is `Ok(result)` with `is_valid == false` and the reasons listed.

pub mod config;
pub mod ed25519;
pub mod error;
pub mod hex;
pub mod issuer;
#[cfg(feature = "mock")]
pub mod mock;
pub mod package;
pub mod traits;
pub mod verifier;

pub use config::{ConfigError, ProofBackend, VerifierConfig};
pub use ed25519::{Ed25519DisclosureSigner, Ed25519DisclosureVerifier};
pub use error::{AttestationError, VerifyError};
#[cfg(feature = "mock")]
pub use mock::MockProofSystem;
pub use issuer::DisclosureIssuer;
pub use package::{
    AttestationPackage, ContextData, DisclosedAttributes, DisclosureSignals, DocumentType,
    RawAttestationRequest, Statement, SCHEME_VERSION,
};
pub use traits::{ProofVerifier, Prover};
pub use verifier::{AttestationResult, AttestationVerifier, VerdictReason, VerificationDetails};
