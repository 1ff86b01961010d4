//! # Circle Policy
//!
//! The financial and eligibility parameters fixed when a circle is created.
//!
//! ## Ranges
//!
//! | Field | Allowed |
//! |-------|---------|
//! | `monthlyAmount` | > 0, at most 6 fractional digits |
//! | `maxMembers` | 2..=100 |
//! | `durationPeriods` | 1..=60, and at least `maxMembers` |
//! | `minAge`, `maxAge` | 18 <= minAge <= maxAge <= 100 |
//!
//! A circle pays each member once, one payout per period, so a duration
//! shorter than the member count could never complete.

use rosca_core::{Amount, CountryCode, ErrorClass};
use rosca_kyc::EligibilityCriteria;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest allowed circle.
pub const MIN_MEMBERS: u32 = 2;
/// Largest allowed circle.
pub const MAX_MEMBERS: u32 = 100;
/// Shortest allowed duration, in periods.
pub const MIN_DURATION: u32 = 1;
/// Longest allowed duration, in periods.
pub const MAX_DURATION: u32 = 60;
/// Lowest allowed minimum age.
pub const MIN_AGE: u8 = 18;
/// Highest allowed maximum age.
pub const MAX_AGE: u8 = 100;

/// Why a policy was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The monthly amount is zero.
    #[error("monthly amount must be positive")]
    AmountNotPositive,

    /// Member cap outside 2..=100.
    #[error("max members {0} outside {MIN_MEMBERS}..={MAX_MEMBERS}")]
    MaxMembersOutOfRange(u32),

    /// Duration outside 1..=60.
    #[error("duration {0} periods outside {MIN_DURATION}..={MAX_DURATION}")]
    DurationOutOfRange(u32),

    /// Age bounds violate 18 <= min <= max <= 100.
    #[error("age range {min}-{max} invalid: need {MIN_AGE} <= min <= max <= {MAX_AGE}")]
    AgeRange {
        /// Requested minimum.
        min: u8,
        /// Requested maximum.
        max: u8,
    },

    /// Fewer periods than members.
    #[error("duration {duration} periods is shorter than {members} members")]
    DurationShorterThanMembers {
        /// Requested duration.
        duration: u32,
        /// Requested member cap.
        members: u32,
    },
}

impl PolicyError {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Malformed
    }
}

/// Unvalidated policy fields, as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CirclePolicyDraft {
    /// Contribution per member per period.
    pub monthly_amount: Amount,
    /// Member cap; the circle activates when reached.
    pub max_members: u32,
    /// Number of periods the circle may run.
    pub duration_periods: u32,
    /// Required nationality.
    pub country_code: CountryCode,
    /// Minimum age, inclusive.
    pub min_age: u8,
    /// Maximum age, inclusive.
    pub max_age: u8,
}

/// A validated, immutable circle policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CirclePolicyDraft")]
pub struct CirclePolicy {
    monthly_amount: Amount,
    max_members: u32,
    duration_periods: u32,
    country_code: CountryCode,
    min_age: u8,
    max_age: u8,
}

impl CirclePolicy {
    /// Validate a draft.
    pub fn new(draft: CirclePolicyDraft) -> Result<Self, PolicyError> {
        if draft.monthly_amount.is_zero() {
            return Err(PolicyError::AmountNotPositive);
        }
        if !(MIN_MEMBERS..=MAX_MEMBERS).contains(&draft.max_members) {
            return Err(PolicyError::MaxMembersOutOfRange(draft.max_members));
        }
        if !(MIN_DURATION..=MAX_DURATION).contains(&draft.duration_periods) {
            return Err(PolicyError::DurationOutOfRange(draft.duration_periods));
        }
        if draft.min_age < MIN_AGE || draft.min_age > draft.max_age || draft.max_age > MAX_AGE {
            return Err(PolicyError::AgeRange {
                min: draft.min_age,
                max: draft.max_age,
            });
        }
        if draft.duration_periods < draft.max_members {
            return Err(PolicyError::DurationShorterThanMembers {
                duration: draft.duration_periods,
                members: draft.max_members,
            });
        }
        Ok(Self {
            monthly_amount: draft.monthly_amount,
            max_members: draft.max_members,
            duration_periods: draft.duration_periods,
            country_code: draft.country_code,
            min_age: draft.min_age,
            max_age: draft.max_age,
        })
    }

    /// Contribution per member per period.
    pub fn monthly_amount(&self) -> Amount {
        self.monthly_amount
    }

    /// Member cap.
    pub fn max_members(&self) -> u32 {
        self.max_members
    }

    /// Maximum number of periods.
    pub fn duration_periods(&self) -> u32 {
        self.duration_periods
    }

    /// Required nationality.
    pub fn country_code(&self) -> &CountryCode {
        &self.country_code
    }

    /// Minimum age, inclusive.
    pub fn min_age(&self) -> u8 {
        self.min_age
    }

    /// Maximum age, inclusive.
    pub fn max_age(&self) -> u8 {
        self.max_age
    }

    /// The eligibility constraints this policy imposes on joiners.
    pub fn criteria(&self) -> EligibilityCriteria {
        EligibilityCriteria {
            country: self.country_code.clone(),
            min_age: self.min_age,
            max_age: self.max_age,
        }
    }
}

impl TryFrom<CirclePolicyDraft> for CirclePolicy {
    type Error = PolicyError;

    fn try_from(draft: CirclePolicyDraft) -> Result<Self, Self::Error> {
        Self::new(draft)
    }
}

impl From<CirclePolicy> for CirclePolicyDraft {
    fn from(policy: CirclePolicy) -> Self {
        Self {
            monthly_amount: policy.monthly_amount,
            max_members: policy.max_members,
            duration_periods: policy.duration_periods,
            country_code: policy.country_code,
            min_age: policy.min_age,
            max_age: policy.max_age,
        }
    }
}
