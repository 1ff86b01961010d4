//! # Ed25519 Signed Disclosures
//!
//! A disclosure issuer (the party that checked the identity document) signs
//! the [`Statement`] with its Ed25519 key. The verifier holds only the
//! issuer's public key. The proof is the 64-byte signature.
//!
//! Verification uses `verify_strict`, which rejects small-order keys and
//! non-canonical signatures.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};

use crate::error::VerifyError;
use crate::hex;
use crate::package::Statement;
use crate::traits::{ProofVerifier, Prover};

/// Verifies disclosures signed by one trusted issuer key.
#[derive(Debug, Clone)]
pub struct Ed25519DisclosureVerifier {
    key: VerifyingKey,
}

impl Ed25519DisclosureVerifier {
    /// Wrap an issuer public key.
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Parse a 32-byte hex-encoded issuer public key.
    pub fn from_hex(hex_key: &str) -> Result<Self, VerifyError> {
        let bytes = hex::decode(hex_key).map_err(VerifyError::Backend)?;
        let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            VerifyError::Backend(format!("issuer key must be 32 bytes, got {}", bytes.len()))
        })?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| VerifyError::Backend(format!("invalid issuer key: {e}")))?;
        Ok(Self { key })
    }

    /// Hex of the trusted issuer key.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.as_bytes())
    }
}

impl ProofVerifier for Ed25519DisclosureVerifier {
    fn scheme(&self) -> &'static str {
        "ed25519-disclosure"
    }

    fn verify(&self, statement: &Statement, proof: &[u8]) -> Result<bool, VerifyError> {
        let bytes: [u8; 64] = proof.try_into().map_err(|_| {
            VerifyError::MalformedProof(format!("signature must be 64 bytes, got {}", proof.len()))
        })?;
        let signature = ed25519_dalek::Signature::from_bytes(&bytes);
        Ok(self
            .key
            .verify_strict(statement.as_bytes(), &signature)
            .is_ok())
    }
}

/// An issuer signing key.
pub struct Ed25519DisclosureSigner {
    key: SigningKey,
}

impl Ed25519DisclosureSigner {
    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            key: SigningKey::generate(&mut csprng),
        }
    }

    /// Deterministic key from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }

    /// Parse a 32-byte hex-encoded secret seed.
    pub fn from_hex(hex_seed: &str) -> Result<Self, VerifyError> {
        let bytes = hex::decode(hex_seed).map_err(VerifyError::Backend)?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            VerifyError::Backend(format!("issuer seed must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_seed(&seed))
    }

    /// Hex of the secret seed.
    pub fn secret_hex(&self) -> String {
        hex::encode(&self.key.to_bytes())
    }

    /// Hex of the public key.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.verifying_key().as_bytes())
    }

    /// The matching verifier.
    pub fn verifier(&self) -> Ed25519DisclosureVerifier {
        Ed25519DisclosureVerifier::new(self.key.verifying_key())
    }
}

impl std::fmt::Debug for Ed25519DisclosureSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519DisclosureSigner")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

impl Prover for Ed25519DisclosureSigner {
    fn prove(&self, statement: &Statement) -> Vec<u8> {
        self.key.sign(statement.as_bytes()).to_bytes().to_vec()
    }
}
