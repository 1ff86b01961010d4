//! # Error Hierarchy
//!
//! Structured error types shared by the whole stack, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Domain crates define their own error enums and classify each variant
//! with an [`ErrorClass`]. The class decides how a failure is surfaced:
//! malformed input is rejected before any state change, policy failures are
//! verdicts rather than faults, state conflicts may be retried once the
//! caller has corrected state, and fatal errors must never be swallowed.

use thiserror::Error;

/// The five failure classes every operation in the stack reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Missing or ill-typed input. Rejected before any state change; never retried.
    Malformed,
    /// Cryptographically valid input that fails a disclosed-attribute or
    /// eligibility check. A business outcome; never retried automatically.
    PolicyFailure,
    /// The request conflicts with current state (circle not open, already a
    /// member, wrong period). The caller may retry after correcting state.
    StateConflict,
    /// Unknown circle or subject.
    NotFound,
    /// Scheme mismatch or internal invariant violation. Surfaced to the
    /// caller; processing must not silently continue.
    Fatal,
}

impl ErrorClass {
    /// Whether a caller may reasonably retry after correcting its input or
    /// the state it is acting on.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StateConflict | Self::NotFound)
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Malformed => "malformed",
            Self::PolicyFailure => "policy_failure",
            Self::StateConflict => "state_conflict",
            Self::NotFound => "not_found",
            Self::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Top-level error type for the foundational layer.
#[derive(Error, Debug)]
pub enum RoscaError {
    /// Domain primitive validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Monetary amount could not be parsed or computed.
    #[error("amount error: {0}")]
    Amount(#[from] AmountError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RoscaError {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) | Self::Json(_) => ErrorClass::Malformed,
            Self::Amount(e) => e.class(),
        }
    }
}

/// Validation errors for domain primitive newtypes.
///
/// Each carries the rejected input and the expected format so operators can
/// diagnose misconfiguration without guesswork.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Subject identifier is empty, too long, or contains illegal characters.
    #[error("invalid subject id: \"{0}\" (expected 1-128 characters of [A-Za-z0-9._:-])")]
    InvalidSubjectId(String),

    /// Country code is not a three-letter ISO-3166 alpha-3 code.
    #[error("invalid country code: \"{0}\" (expected ISO-3166 alpha-3, e.g. USA)")]
    InvalidCountryCode(String),

    /// Timestamp string is not valid UTC RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors from fixed-point amount parsing and arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The input string was empty.
    #[error("amount must not be empty")]
    Empty,

    /// The input is not a canonical unsigned decimal.
    #[error("invalid amount \"{input}\": {reason}")]
    Invalid {
        /// The rejected input.
        input: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// More fractional digits than the fixed-point scale allows.
    #[error("amount \"{input}\" has {digits} fractional digits (max {max})")]
    TooManyFractionalDigits {
        /// The rejected input.
        input: String,
        /// Number of fractional digits supplied.
        digits: usize,
        /// Maximum supported.
        max: u8,
    },

    /// The value does not fit the internal representation.
    #[error("amount overflow: {0}")]
    Overflow(String),
}

impl AmountError {
    /// Parsing problems are malformed input; overflow during arithmetic on
    /// already-validated amounts is an internal invariant violation.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Overflow(_) => ErrorClass::Fatal,
            _ => ErrorClass::Malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classes() {
        assert!(ErrorClass::StateConflict.is_retryable());
        assert!(ErrorClass::NotFound.is_retryable());
        assert!(!ErrorClass::Malformed.is_retryable());
        assert!(!ErrorClass::PolicyFailure.is_retryable());
        assert!(!ErrorClass::Fatal.is_retryable());
    }

    #[test]
    fn class_display() {
        assert_eq!(ErrorClass::StateConflict.to_string(), "state_conflict");
        assert_eq!(ErrorClass::Fatal.to_string(), "fatal");
    }

    #[test]
    fn amount_overflow_is_fatal() {
        assert_eq!(AmountError::Overflow("x".into()).class(), ErrorClass::Fatal);
        assert_eq!(AmountError::Empty.class(), ErrorClass::Malformed);
    }

    #[test]
    fn validation_error_messages_carry_input() {
        let err = ValidationError::InvalidCountryCode("US".into());
        assert!(err.to_string().contains("\"US\""));
        let wrapped: RoscaError = err.into();
        assert_eq!(wrapped.class(), ErrorClass::Malformed);
    }
}
