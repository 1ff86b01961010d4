//! # Mock Proof System
//!
//! A transparent proof system for development and tests: the proof for a
//! statement is the statement digest itself. It binds a package to its
//! signals and context (any tampering changes the digest) but offers no
//! privacy and no issuer authentication.
//!
//! Enabled with the `mock` feature. The API only selects it when
//! `ROSCA_MOCK_PROOFS=true`.

use crate::error::VerifyError;
use crate::package::Statement;
use crate::traits::{ProofVerifier, Prover};

/// Transparent proof system. Proof = statement digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProofSystem;

impl ProofVerifier for MockProofSystem {
    fn scheme(&self) -> &'static str {
        "mock-sha256"
    }

    fn verify(&self, statement: &Statement, proof: &[u8]) -> Result<bool, VerifyError> {
        if proof.len() != 32 {
            return Err(VerifyError::MalformedProof(format!(
                "mock proof must be 32 bytes, got {}",
                proof.len()
            )));
        }
        Ok(proof == statement.as_bytes())
    }
}

impl Prover for MockProofSystem {
    fn prove(&self, statement: &Statement) -> Vec<u8> {
        statement.as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::DocumentType;

    fn statement(tag: &str) -> Statement {
        Statement::compute(DocumentType::Passport, &[tag.to_string()], b"ctx")
    }

    #[test]
    fn proof_verifies_own_statement() {
        let s = statement("a");
        let proof = MockProofSystem.prove(&s);
        assert_eq!(MockProofSystem.verify(&s, &proof), Ok(true));
    }

    #[test]
    fn proof_rejected_for_other_statement() {
        let proof = MockProofSystem.prove(&statement("a"));
        assert_eq!(MockProofSystem.verify(&statement("b"), &proof), Ok(false));
    }

    #[test]
    fn wrong_length_is_malformed() {
        assert!(matches!(
            MockProofSystem.verify(&statement("a"), &[0u8; 31]),
            Err(VerifyError::MalformedProof(_))
        ));
    }
}
