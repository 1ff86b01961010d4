//! # Attestation Error Types
//!
//! Only structurally unusable input and scheme mismatches are errors. A proof
//! that does not verify, a binding mismatch, and a failed policy check are
//! normal business outcomes reported inside the verdict.

use rosca_core::ErrorClass;
use thiserror::Error;

/// Failure to process an attestation package at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttestationError {
    /// One or more required request fields are absent, null, or empty.
    #[error("missing required fields: {}", missing.join(", "))]
    MalformedRequest {
        /// Wire names of the missing fields, in request order.
        missing: Vec<String>,
    },

    /// The document-type tag is not a known attestation id.
    #[error("unsupported attestation id: {0}")]
    UnsupportedDocumentType(String),

    /// The public signals declare a scheme version this verifier does not speak.
    #[error("scheme mismatch: expected version {expected}, found {found}")]
    SchemeMismatch {
        /// Version this verifier implements.
        expected: String,
        /// Version declared by the package.
        found: String,
    },

    /// A public signal is not well-formed for the declared scheme.
    #[error("malformed public signal at index {index}: {reason}")]
    MalformedSignal {
        /// Signal position.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// The proof blob cannot be decoded for the configured proof system.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The user context data cannot be decoded.
    #[error("malformed context data: {0}")]
    MalformedContext(String),

    /// The proof backend failed internally.
    #[error("proof backend failure: {0}")]
    Backend(String),
}

impl AttestationError {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::SchemeMismatch { .. } | Self::Backend(_) => ErrorClass::Fatal,
            _ => ErrorClass::Malformed,
        }
    }

    /// Whether this is the missing-fields rejection (reported with its own
    /// wire error code).
    pub fn is_missing_fields(&self) -> bool {
        matches!(self, Self::MalformedRequest { .. })
    }
}

/// Error raised by a [`crate::ProofVerifier`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The proof bytes do not have the shape this proof system expects.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The verifying key or backend is unusable.
    #[error("verifier backend error: {0}")]
    Backend(String),
}

impl From<VerifyError> for AttestationError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::MalformedProof(msg) => Self::MalformedProof(msg),
            VerifyError::Backend(msg) => Self::Backend(msg),
        }
    }
}
