//! # Attestation Verifier
//!
//! Runs, in order:
//!
//! 1. required-field check (all missing fields reported together)
//! 2. structural decode of the document type, proof, signals, and context
//! 3. proof verification against the package [`Statement`]
//! 4. binding checks: scope hash, endpoint hash, subject in context
//! 5. policy checks on the disclosed attributes: minimum age, excluded
//!    countries, sanctions screen
//!
//! Steps 1 and 2 fail with [`AttestationError`]. Steps 3 to 5 never fail;
//! they contribute [`VerdictReason`]s to the result. Policy is evaluated at
//! verification time against the current configuration.
//!
//! [`Statement`]: crate::package::Statement

use std::sync::Arc;

use rosca_core::{CountryCode, SubjectId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::config::VerifierConfig;
use crate::error::AttestationError;
use crate::package::{
    AttestationPackage, ContextData, DisclosedAttributes, DisclosureSignals, DocumentType,
    RawAttestationRequest,
};
use crate::traits::ProofVerifier;

/// Why an attestation was judged invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictReason {
    /// The proof does not attest to the package statement.
    InvalidProof,
    /// The proof was produced for another application scope.
    ScopeMismatch,
    /// The context data names another endpoint.
    EndpointMismatch,
    /// The context data names a different subject than the signals.
    SubjectMismatch,
    /// A minimum age is required but the age was not disclosed.
    AgeUndisclosed {
        /// Required minimum.
        minimum: u8,
    },
    /// The disclosed age is below the minimum.
    BelowMinimumAge {
        /// Disclosed age.
        age: u8,
        /// Required minimum.
        minimum: u8,
    },
    /// Countries are excluded but nationality was not disclosed.
    CountryUndisclosed,
    /// The disclosed nationality is excluded.
    ExcludedCountry {
        /// Disclosed nationality.
        country: CountryCode,
    },
    /// A passed sanctions screen is required and was not shown.
    SanctionsScreenFailed,
}

impl std::fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProof => f.write_str("proof does not verify"),
            Self::ScopeMismatch => f.write_str("proof bound to a different scope"),
            Self::EndpointMismatch => f.write_str("context bound to a different endpoint"),
            Self::SubjectMismatch => f.write_str("context subject differs from disclosed subject"),
            Self::AgeUndisclosed { minimum } => {
                write!(f, "age not disclosed (minimum {minimum})")
            }
            Self::BelowMinimumAge { age, minimum } => {
                write!(f, "age {age} below minimum {minimum}")
            }
            Self::CountryUndisclosed => f.write_str("nationality not disclosed"),
            Self::ExcludedCountry { country } => write!(f, "nationality {country} is excluded"),
            Self::SanctionsScreenFailed => f.write_str("sanctions screen not passed"),
        }
    }
}

/// Per-check breakdown of a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDetails {
    /// Proof verified and bound to this deployment.
    pub is_valid: bool,
    /// Minimum-age policy satisfied.
    pub is_minimum_age_valid: bool,
    /// Sanctions-screen policy satisfied.
    pub is_ofac_valid: bool,
    /// Excluded-country policy satisfied.
    pub is_country_valid: bool,
    /// Every failed check, in evaluation order.
    pub reasons: Vec<VerdictReason>,
}

/// Outcome of one verification attempt. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResult {
    /// Subject the attestation is about.
    pub subject_id: SubjectId,
    /// Document the attestation was produced from.
    pub document_type: DocumentType,
    /// All checks passed.
    pub is_valid: bool,
    /// Attributes the subject disclosed.
    #[serde(rename = "disclosedAttributes")]
    pub disclosed: DisclosedAttributes,
    /// Per-check breakdown.
    pub details: VerificationDetails,
    /// When the verdict was produced.
    #[serde(rename = "verifiedAtTime")]
    pub verified_at: Timestamp,
}

/// The verification gateway.
#[derive(Clone)]
pub struct AttestationVerifier {
    config: VerifierConfig,
    proof_verifier: Arc<dyn ProofVerifier>,
    scope_hash: String,
    endpoint_hash: [u8; 32],
}

impl std::fmt::Debug for AttestationVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationVerifier")
            .field("config", &self.config)
            .field("scheme", &self.proof_verifier.scheme())
            .finish()
    }
}

impl AttestationVerifier {
    /// Verifier applying `config` and trusting `proof_verifier`.
    pub fn new(config: VerifierConfig, proof_verifier: Arc<dyn ProofVerifier>) -> Self {
        let scope_hash = config.scope_hash();
        let endpoint_hash = config.endpoint_hash();
        Self {
            config,
            proof_verifier,
            scope_hash,
            endpoint_hash,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify a wire request, stamping the result with the current time.
    pub fn verify(&self, raw: &RawAttestationRequest) -> Result<AttestationResult, AttestationError> {
        self.verify_at(raw, Timestamp::now())
    }

    /// Verify a wire request, stamping the result with `now`.
    pub fn verify_at(
        &self,
        raw: &RawAttestationRequest,
        now: Timestamp,
    ) -> Result<AttestationResult, AttestationError> {
        let package = AttestationPackage::from_raw(raw)?;
        self.verify_package(&package, now)
    }

    /// Verify an already decoded package.
    pub fn verify_package(
        &self,
        package: &AttestationPackage,
        now: Timestamp,
    ) -> Result<AttestationResult, AttestationError> {
        let signals = DisclosureSignals::parse(&package.public_signals)?;
        let context = ContextData::parse(&package.context)?;

        let mut reasons = Vec::new();

        // ── Proof and binding ──
        let proof_ok = self
            .proof_verifier
            .verify(&package.statement(), &package.proof)?;
        if !proof_ok {
            reasons.push(VerdictReason::InvalidProof);
        }
        if signals.scope_hash != self.scope_hash {
            reasons.push(VerdictReason::ScopeMismatch);
        }
        if context.endpoint_hash != self.endpoint_hash {
            reasons.push(VerdictReason::EndpointMismatch);
        }
        if context.subject_id != signals.subject_id {
            reasons.push(VerdictReason::SubjectMismatch);
        }
        let is_valid = reasons.is_empty();

        // ── Policy ──
        let attrs = &signals.attributes;
        let minimum = self.config.minimum_age;
        let is_minimum_age_valid = if minimum == 0 {
            true
        } else {
            match attrs.age_at_verification {
                None => {
                    reasons.push(VerdictReason::AgeUndisclosed { minimum });
                    false
                }
                Some(age) if age < minimum => {
                    reasons.push(VerdictReason::BelowMinimumAge { age, minimum });
                    false
                }
                Some(_) => true,
            }
        };

        let is_country_valid = if self.config.excluded_countries.is_empty() {
            true
        } else {
            match &attrs.nationality_code {
                None => {
                    reasons.push(VerdictReason::CountryUndisclosed);
                    false
                }
                Some(country) if self.config.excluded_countries.contains(country) => {
                    reasons.push(VerdictReason::ExcludedCountry {
                        country: country.clone(),
                    });
                    false
                }
                Some(_) => true,
            }
        };

        let is_ofac_valid = if self.config.ofac && attrs.passed_sanctions_screen != Some(true) {
            reasons.push(VerdictReason::SanctionsScreenFailed);
            false
        } else {
            true
        };

        let overall = is_valid && is_minimum_age_valid && is_country_valid && is_ofac_valid;
        if overall {
            tracing::info!(
                subject = %signals.subject_id,
                document = %package.document_type,
                scheme = self.proof_verifier.scheme(),
                "attestation accepted"
            );
        } else {
            tracing::warn!(
                subject = %signals.subject_id,
                document = %package.document_type,
                reasons = ?reasons,
                "attestation rejected"
            );
        }

        Ok(AttestationResult {
            subject_id: signals.subject_id,
            document_type: package.document_type,
            is_valid: overall,
            disclosed: signals.attributes,
            details: VerificationDetails {
                is_valid,
                is_minimum_age_valid,
                is_ofac_valid,
                is_country_valid,
                reasons,
            },
            verified_at: now,
        })
    }
}
