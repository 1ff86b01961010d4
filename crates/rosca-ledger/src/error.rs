//! Ledger errors.

use rosca_core::{CircleId, ErrorClass};
use rosca_state::{CircleError, PolicyError};
use thiserror::Error;

use crate::settlement::SettlementError;

/// Failure of a ledger operation. The ledger is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No circle with this id.
    #[error("circle {0} not found")]
    CircleNotFound(CircleId),

    /// The submitted policy is invalid.
    #[error("invalid policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    /// The circle rejected the operation.
    #[error(transparent)]
    Circle(#[from] CircleError),

    /// Value transfer failed; the circle stays `Rotating`.
    #[error("settlement failed: {0}")]
    Settlement(#[from] SettlementError),
}

impl LedgerError {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::CircleNotFound(_) => ErrorClass::NotFound,
            Self::InvalidPolicy(e) => e.class(),
            Self::Circle(e) => e.class(),
            Self::Settlement(_) => ErrorClass::StateConflict,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CircleNotFound(_) => "CIRCLE_NOT_FOUND",
            Self::InvalidPolicy(_) => "INVALID_POLICY",
            Self::Circle(e) => e.code(),
            Self::Settlement(_) => "SETTLEMENT_FAILED",
        }
    }
}
