//! Registry errors.

use rosca_core::{ErrorClass, SubjectId};
use thiserror::Error;

/// Failure of a registry operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The result being recorded is about a different subject than the key
    /// it is being recorded under.
    #[error("subject mismatch: recording under {key} a result about {result}")]
    SubjectMismatch {
        /// Key the caller supplied.
        key: SubjectId,
        /// Subject named inside the result.
        result: SubjectId,
    },

    /// No verification is on record for the subject.
    #[error("no verification on record for {0}")]
    NotFound(SubjectId),
}

impl RegistryError {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::SubjectMismatch { .. } => ErrorClass::Fatal,
            Self::NotFound(_) => ErrorClass::NotFound,
        }
    }
}
