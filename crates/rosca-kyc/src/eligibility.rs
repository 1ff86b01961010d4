//! # Eligibility Evaluation
//!
//! Combines a circle's constraints with the subject's verification record.
//! Fails closed: anything not positively established is ineligible.
//!
//! ## Check order
//!
//! The first failing check is the reported reason:
//!
//! 1. not verified
//! 2. verification expired (only under [`StalenessPolicy::MaxAge`])
//! 3. nationality undisclosed
//! 4. country mismatch
//! 5. age undisclosed
//! 6. age out of range (inclusive bounds)
//!
//! Evaluation is total and has no side effects.

use std::sync::Arc;

use chrono::Duration;
use rosca_core::{CountryCode, SubjectId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::registry::VerificationLookup;

/// Country and age constraints a subject is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityCriteria {
    /// Required nationality.
    pub country: CountryCode,
    /// Minimum age, inclusive.
    pub min_age: u8,
    /// Maximum age, inclusive.
    pub max_age: u8,
}

/// How long a recorded verification stays usable for eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalenessPolicy {
    /// Verifications never expire.
    #[default]
    NoExpiry,
    /// Verifications older than this are treated as expired.
    MaxAge(Duration),
}

impl StalenessPolicy {
    /// `None` → no expiry, `Some(days)` → expire after that many days.
    pub fn from_ttl_days(days: Option<u32>) -> Self {
        match days {
            None => Self::NoExpiry,
            Some(days) => Self::MaxAge(Duration::days(i64::from(days))),
        }
    }

    fn is_expired(&self, verified_at: Timestamp, now: Timestamp) -> bool {
        match self {
            Self::NoExpiry => false,
            Self::MaxAge(window) => verified_at.is_older_than(*window, now),
        }
    }
}

/// Why a subject is not eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IneligibleReason {
    /// No verification on record.
    NotVerified,
    /// The verification on record is too old.
    VerificationExpired {
        /// When the verification was produced.
        verified_at: Timestamp,
    },
    /// The verification does not disclose nationality.
    NationalityUndisclosed,
    /// Nationality differs from the required country.
    CountryMismatch {
        /// Required country.
        required: CountryCode,
        /// Disclosed nationality.
        found: CountryCode,
    },
    /// The verification does not disclose age.
    AgeUndisclosed,
    /// Age is outside the allowed range.
    AgeOutOfRange {
        /// Disclosed age.
        age: u8,
        /// Minimum, inclusive.
        min: u8,
        /// Maximum, inclusive.
        max: u8,
    },
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotVerified => f.write_str("not verified"),
            Self::VerificationExpired { verified_at } => {
                write!(f, "verification expired (verified {verified_at})")
            }
            Self::NationalityUndisclosed => f.write_str("nationality not disclosed"),
            Self::CountryMismatch { required, found } => {
                write!(f, "country mismatch: requires {required}, verified as {found}")
            }
            Self::AgeUndisclosed => f.write_str("age not disclosed"),
            Self::AgeOutOfRange { age, min, max } => {
                write!(f, "age {age} outside allowed range {min}-{max}")
            }
        }
    }
}

/// Verdict of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// Whether the subject may join.
    pub eligible: bool,
    /// Why not, when ineligible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<IneligibleReason>,
}

impl Eligibility {
    fn eligible() -> Self {
        Self {
            eligible: true,
            reason: None,
        }
    }

    fn ineligible(reason: IneligibleReason) -> Self {
        Self {
            eligible: false,
            reason: Some(reason),
        }
    }

    /// Human-readable reason; `"eligible"` when eligible.
    pub fn reason_text(&self) -> String {
        match &self.reason {
            Some(reason) => reason.to_string(),
            None => "eligible".to_string(),
        }
    }
}

/// Evaluates eligibility against a verification store.
#[derive(Clone)]
pub struct EligibilityEvaluator {
    lookup: Arc<dyn VerificationLookup>,
    staleness: StalenessPolicy,
}

impl std::fmt::Debug for EligibilityEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EligibilityEvaluator")
            .field("staleness", &self.staleness)
            .finish_non_exhaustive()
    }
}

impl EligibilityEvaluator {
    /// Evaluator reading from `lookup`.
    pub fn new(lookup: Arc<dyn VerificationLookup>, staleness: StalenessPolicy) -> Self {
        Self { lookup, staleness }
    }

    /// Active staleness policy.
    pub fn staleness(&self) -> StalenessPolicy {
        self.staleness
    }

    /// Evaluate `subject` against `criteria` as of now.
    pub fn evaluate(&self, subject: &SubjectId, criteria: &EligibilityCriteria) -> Eligibility {
        self.evaluate_at(subject, criteria, Timestamp::now())
    }

    /// Evaluate `subject` against `criteria` as of `now`.
    pub fn evaluate_at(
        &self,
        subject: &SubjectId,
        criteria: &EligibilityCriteria,
        now: Timestamp,
    ) -> Eligibility {
        let Some(record) = self.lookup.lookup(subject) else {
            return Eligibility::ineligible(IneligibleReason::NotVerified);
        };
        let result = &record.latest;

        if self.staleness.is_expired(result.verified_at, now) {
            return Eligibility::ineligible(IneligibleReason::VerificationExpired {
                verified_at: result.verified_at,
            });
        }

        let attrs = &result.disclosed;
        let Some(nationality) = &attrs.nationality_code else {
            return Eligibility::ineligible(IneligibleReason::NationalityUndisclosed);
        };
        if nationality != &criteria.country {
            return Eligibility::ineligible(IneligibleReason::CountryMismatch {
                required: criteria.country.clone(),
                found: nationality.clone(),
            });
        }

        let Some(age) = attrs.age_at_verification else {
            return Eligibility::ineligible(IneligibleReason::AgeUndisclosed);
        };
        if age < criteria.min_age || age > criteria.max_age {
            return Eligibility::ineligible(IneligibleReason::AgeOutOfRange {
                age,
                min: criteria.min_age,
                max: criteria.max_age,
            });
        }

        Eligibility::eligible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::result;
    use crate::registry::VerificationRegistry;
    use proptest::prelude::*;

    fn sid(s: &str) -> SubjectId {
        SubjectId::new(s).unwrap()
    }

    fn criteria(country: &str, min: u8, max: u8) -> EligibilityCriteria {
        EligibilityCriteria {
            country: CountryCode::new(country).unwrap(),
            min_age: min,
            max_age: max,
        }
    }

    fn setup(staleness: StalenessPolicy) -> (Arc<VerificationRegistry>, EligibilityEvaluator) {
        let registry = Arc::new(VerificationRegistry::new());
        let evaluator = EligibilityEvaluator::new(registry.clone(), staleness);
        (registry, evaluator)
    }

    fn now() -> Timestamp {
        Timestamp::parse("2026-06-01T00:00:00Z").unwrap()
    }

    #[test]
    fn unverified_subject_is_ineligible() {
        let (_, eval) = setup(StalenessPolicy::NoExpiry);
        let verdict = eval.evaluate(&sid("nobody"), &criteria("USA", 18, 65));
        assert!(!verdict.eligible);
        assert_eq!(verdict.reason_text(), "not verified");
    }

    #[test]
    fn matching_subject_is_eligible() {
        let (reg, eval) = setup(StalenessPolicy::NoExpiry);
        reg.record(&sid("a"), result("a", "USA", 20, "2026-01-01T00:00:00Z", true))
            .unwrap();
        let verdict = eval.evaluate_at(&sid("a"), &criteria("USA", 18, 65), now());
        assert!(verdict.eligible);
        assert_eq!(verdict.reason_text(), "eligible");
    }

    #[test]
    fn country_checked_before_age() {
        let (reg, eval) = setup(StalenessPolicy::NoExpiry);
        reg.record(&sid("g"), result("g", "GBR", 90, "2026-01-01T00:00:00Z", true))
            .unwrap();
        let verdict = eval.evaluate_at(&sid("g"), &criteria("USA", 18, 65), now());
        assert!(!verdict.eligible);
        assert!(verdict.reason_text().contains("country mismatch"));
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let (reg, eval) = setup(StalenessPolicy::NoExpiry);
        for (name, age) in [("lo", 18u8), ("hi", 65), ("over", 66), ("under", 17)] {
            reg.record(&sid(name), result(name, "USA", age, "2026-01-01T00:00:00Z", true))
                .unwrap();
        }
        let c = criteria("USA", 18, 65);
        assert!(eval.evaluate_at(&sid("lo"), &c, now()).eligible);
        assert!(eval.evaluate_at(&sid("hi"), &c, now()).eligible);
        assert_eq!(
            eval.evaluate_at(&sid("over"), &c, now()).reason,
            Some(IneligibleReason::AgeOutOfRange { age: 66, min: 18, max: 65 })
        );
        assert!(!eval.evaluate_at(&sid("under"), &c, now()).eligible);
    }

    #[test]
    fn undisclosed_attributes_fail_closed() {
        let (reg, eval) = setup(StalenessPolicy::NoExpiry);
        let mut r = result("x", "USA", 30, "2026-01-01T00:00:00Z", true);
        r.disclosed.age_at_verification = None;
        reg.record(&sid("x"), r).unwrap();
        assert_eq!(
            eval.evaluate_at(&sid("x"), &criteria("USA", 18, 65), now()).reason,
            Some(IneligibleReason::AgeUndisclosed)
        );

        let mut r = result("y", "USA", 30, "2026-01-01T00:00:00Z", true);
        r.disclosed.nationality_code = None;
        reg.record(&sid("y"), r).unwrap();
        assert_eq!(
            eval.evaluate_at(&sid("y"), &criteria("USA", 18, 65), now()).reason,
            Some(IneligibleReason::NationalityUndisclosed)
        );
    }

    #[test]
    fn expiry_checked_before_attributes() {
        let (reg, eval) = setup(StalenessPolicy::from_ttl_days(Some(30)));
        reg.record(&sid("old"), result("old", "GBR", 30, "2026-01-01T00:00:00Z", true))
            .unwrap();
        let verdict = eval.evaluate_at(&sid("old"), &criteria("USA", 18, 65), now());
        assert!(matches!(
            verdict.reason,
            Some(IneligibleReason::VerificationExpired { .. })
        ));

        let (reg, eval) = setup(StalenessPolicy::from_ttl_days(None));
        reg.record(&sid("old"), result("old", "USA", 30, "2020-01-01T00:00:00Z", true))
            .unwrap();
        assert!(eval.evaluate_at(&sid("old"), &criteria("USA", 18, 65), now()).eligible);
    }

    proptest! {
        #[test]
        fn absent_subject_never_eligible(min in 18u8..=100, span in 0u8..=82, code in "[A-Z]{3}") {
            let (_, eval) = setup(StalenessPolicy::NoExpiry);
            let max = min.saturating_add(span).min(100);
            let verdict = eval.evaluate(&sid("ghost"), &criteria(&code, min, max));
            prop_assert!(!verdict.eligible);
            prop_assert_eq!(verdict.reason, Some(IneligibleReason::NotVerified));
        }
    }
}
