//! # Verification Registry
//!
//! One slot per subject holding the most recent successful
//! [`AttestationResult`]. Records are replaced whole, never patched, and
//! never deleted.
//!
//! ## Write rules
//!
//! - `is_valid == false`: not stored; any prior record is kept; a warning is
//!   logged and [`RecordOutcome::RejectedInvalid`] returned.
//! - A result verified earlier than the one already on record is ignored
//!   ([`RecordOutcome::IgnoredStale`]): last verified wins, regardless of
//!   arrival order.
//! - The key must name the same subject as the result, otherwise the write
//!   is refused as an invariant violation.
//!
//! Writes take the map's write lock for the duration of one compare-and-set,
//! so writes for the same subject are serialized.

use std::collections::HashMap;

use parking_lot::RwLock;
use rosca_attest::AttestationResult;
use rosca_core::{CountryCode, SubjectId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// The stored record for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    /// Subject the record is about.
    pub subject_id: SubjectId,
    /// Most recent successful verification.
    pub latest: AttestationResult,
    /// When the registry stored it.
    #[serde(rename = "recordedAtTime")]
    pub recorded_at: Timestamp,
}

/// What [`VerificationRegistry::record`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// First record for the subject.
    Stored,
    /// Replaced an older record.
    Replaced,
    /// Invalid result; nothing changed.
    RejectedInvalid,
    /// Older than the record on file; nothing changed.
    IgnoredStale,
}

impl RecordOutcome {
    /// Whether the registry now holds the submitted result.
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored | Self::Replaced)
    }
}

/// Flat view of a subject's verification, with defaults for unknown subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSummary {
    /// A record exists.
    pub is_verified: bool,
    /// Disclosed nationality.
    pub nationality: Option<CountryCode>,
    /// Disclosed age when verified.
    pub age_at_verification: Option<u8>,
    /// When the recorded verification was produced.
    pub verification_timestamp: Option<Timestamp>,
    /// Uniqueness flag.
    pub is_human: bool,
    /// Sanctions screen result.
    #[serde(rename = "passedOFACCheck")]
    pub passed_ofac_check: bool,
}

/// Read access to verification records.
///
/// Eligibility depends on this trait rather than on the concrete registry so
/// it can be driven by any store.
pub trait VerificationLookup: Send + Sync {
    /// Current record for `subject`, if any.
    fn lookup(&self, subject: &SubjectId) -> Option<VerificationRecord>;

    /// Whether `subject` has a record.
    fn is_verified(&self, subject: &SubjectId) -> bool {
        self.lookup(subject).is_some()
    }
}

/// In-memory verification registry.
#[derive(Debug, Default)]
pub struct VerificationRegistry {
    records: RwLock<HashMap<SubjectId, VerificationRecord>>,
}

impl VerificationRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result now.
    pub fn record(
        &self,
        subject: &SubjectId,
        result: AttestationResult,
    ) -> Result<RecordOutcome, RegistryError> {
        self.record_at(subject, result, Timestamp::now())
    }

    /// Record a result, stamping the record with `now`.
    pub fn record_at(
        &self,
        subject: &SubjectId,
        result: AttestationResult,
        now: Timestamp,
    ) -> Result<RecordOutcome, RegistryError> {
        if &result.subject_id != subject {
            return Err(RegistryError::SubjectMismatch {
                key: subject.clone(),
                result: result.subject_id,
            });
        }

        if !result.is_valid {
            tracing::warn!(
                subject = %subject,
                reasons = ?result.details.reasons,
                "invalid verification result not recorded"
            );
            return Ok(RecordOutcome::RejectedInvalid);
        }

        let mut records = self.records.write();
        let outcome = match records.get(subject) {
            Some(existing) if existing.latest.verified_at > result.verified_at => {
                tracing::warn!(
                    subject = %subject,
                    on_record = %existing.latest.verified_at,
                    submitted = %result.verified_at,
                    "older verification result ignored"
                );
                return Ok(RecordOutcome::IgnoredStale);
            }
            Some(_) => RecordOutcome::Replaced,
            None => RecordOutcome::Stored,
        };
        records.insert(
            subject.clone(),
            VerificationRecord {
                subject_id: subject.clone(),
                latest: result,
                recorded_at: now,
            },
        );
        tracing::info!(subject = %subject, outcome = ?outcome, "verification recorded");
        Ok(outcome)
    }

    /// Record for `subject`, or [`RegistryError::NotFound`].
    pub fn get(&self, subject: &SubjectId) -> Result<VerificationRecord, RegistryError> {
        self.lookup(subject)
            .ok_or_else(|| RegistryError::NotFound(subject.clone()))
    }

    /// Flat view of `subject`'s verification.
    pub fn summary(&self, subject: &SubjectId) -> VerificationSummary {
        match self.lookup(subject) {
            Some(record) => {
                let attrs = &record.latest.disclosed;
                VerificationSummary {
                    is_verified: true,
                    nationality: attrs.nationality_code.clone(),
                    age_at_verification: attrs.age_at_verification,
                    verification_timestamp: Some(record.latest.verified_at),
                    is_human: attrs.is_unique.unwrap_or(false),
                    passed_ofac_check: attrs.passed_sanctions_screen.unwrap_or(false),
                }
            }
            None => VerificationSummary {
                is_verified: false,
                nationality: None,
                age_at_verification: None,
                verification_timestamp: None,
                is_human: false,
                passed_ofac_check: false,
            },
        }
    }

    /// Number of verified subjects.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no subject is verified.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl VerificationLookup for VerificationRegistry {
    fn lookup(&self, subject: &SubjectId) -> Option<VerificationRecord> {
        self.records.read().get(subject).cloned()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rosca_attest::{DisclosedAttributes, DocumentType, VerificationDetails};

    pub(crate) fn result(subject: &str, country: &str, age: u8, at: &str, valid: bool) -> AttestationResult {
        AttestationResult {
            subject_id: SubjectId::new(subject).unwrap(),
            document_type: DocumentType::Passport,
            is_valid: valid,
            disclosed: DisclosedAttributes {
                nationality_code: Some(CountryCode::new(country).unwrap()),
                age_at_verification: Some(age),
                is_unique: Some(true),
                passed_sanctions_screen: Some(true),
            },
            details: VerificationDetails {
                is_valid: valid,
                is_minimum_age_valid: true,
                is_ofac_valid: true,
                is_country_valid: true,
                reasons: Vec::new(),
            },
            verified_at: Timestamp::parse(at).unwrap(),
        }
    }

    fn sid(s: &str) -> SubjectId {
        SubjectId::new(s).unwrap()
    }

    #[test]
    fn first_record_stored_then_replaced() {
        let reg = VerificationRegistry::new();
        let alice = sid("alice");
        assert_eq!(
            reg.record(&alice, result("alice", "USA", 30, "2026-01-01T00:00:00Z", true)),
            Ok(RecordOutcome::Stored)
        );
        assert_eq!(
            reg.record(&alice, result("alice", "USA", 31, "2026-02-01T00:00:00Z", true)),
            Ok(RecordOutcome::Replaced)
        );
        assert_eq!(reg.get(&alice).unwrap().latest.disclosed.age_at_verification, Some(31));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn invalid_result_never_erases_good_record() {
        let reg = VerificationRegistry::new();
        let alice = sid("alice");
        reg.record(&alice, result("alice", "USA", 30, "2026-01-01T00:00:00Z", true))
            .unwrap();
        assert_eq!(
            reg.record(&alice, result("alice", "GBR", 30, "2026-02-01T00:00:00Z", false)),
            Ok(RecordOutcome::RejectedInvalid)
        );
        let kept = reg.get(&alice).unwrap();
        assert_eq!(kept.latest.disclosed.nationality_code, Some(CountryCode::new("USA").unwrap()));
    }

    #[test]
    fn invalid_result_for_unknown_subject_not_stored() {
        let reg = VerificationRegistry::new();
        let bob = sid("bob");
        reg.record(&bob, result("bob", "USA", 30, "2026-01-01T00:00:00Z", false))
            .unwrap();
        assert!(!reg.is_verified(&bob));
        assert!(reg.is_empty());
        assert_eq!(reg.get(&bob), Err(RegistryError::NotFound(bob)));
    }

    #[test]
    fn older_result_ignored() {
        let reg = VerificationRegistry::new();
        let alice = sid("alice");
        reg.record(&alice, result("alice", "USA", 31, "2026-02-01T00:00:00Z", true))
            .unwrap();
        assert_eq!(
            reg.record(&alice, result("alice", "USA", 30, "2026-01-01T00:00:00Z", true)),
            Ok(RecordOutcome::IgnoredStale)
        );
        assert_eq!(reg.get(&alice).unwrap().latest.disclosed.age_at_verification, Some(31));
    }

    #[test]
    fn subject_mismatch_is_fatal() {
        let reg = VerificationRegistry::new();
        let err = reg
            .record(&sid("alice"), result("mallory", "USA", 30, "2026-01-01T00:00:00Z", true))
            .unwrap_err();
        assert_eq!(err.class(), rosca_core::ErrorClass::Fatal);
        assert!(reg.is_empty());
    }

    #[test]
    fn summary_view() {
        let reg = VerificationRegistry::new();
        let alice = sid("alice");
        let unknown = reg.summary(&alice);
        assert!(!unknown.is_verified);
        assert_eq!(unknown.age_at_verification, None);

        reg.record(&alice, result("alice", "NGA", 25, "2026-01-01T00:00:00Z", true))
            .unwrap();
        let view = reg.summary(&alice);
        assert!(view.is_verified && view.is_human && view.passed_ofac_check);
        assert_eq!(view.nationality.unwrap().as_str(), "NGA");
        let json = serde_json::to_value(reg.summary(&alice)).unwrap();
        assert_eq!(json["passedOFACCheck"], true);
        assert_eq!(json["ageAtVerification"], 25);
    }
}
