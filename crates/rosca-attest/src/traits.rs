//! # Proof System Traits
//!
//! The verifier never looks inside a proof. It hands the [`Statement`] and
//! the proof bytes to a [`ProofVerifier`] and gets back a boolean.
//!
//! ## Security Invariant
//!
//! Implementations must be `Send + Sync` and side-effect free: the same
//! statement and proof always produce the same answer, and requests may be
//! verified with unbounded parallelism.

use crate::error::VerifyError;
use crate::package::Statement;

/// Checks that a proof attests to a statement.
pub trait ProofVerifier: Send + Sync {
    /// Short name of the proof system, used in logs.
    fn scheme(&self) -> &'static str;

    /// Verify `proof` against `statement`.
    ///
    /// `Ok(false)` is a well-formed proof that does not verify.
    /// `Err(MalformedProof)` is a proof this system cannot even decode.
    fn verify(&self, statement: &Statement, proof: &[u8]) -> Result<bool, VerifyError>;
}

/// Produces proofs for statements. Used by disclosure issuers and tests.
pub trait Prover: Send + Sync {
    /// Produce a proof for `statement`.
    fn prove(&self, statement: &Statement) -> Vec<u8>;
}
