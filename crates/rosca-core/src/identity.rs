//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers that flow between the
//! verification gateway and the circle engine.
//!
//! ## Validation
//!
//! [`SubjectId`] and [`CountryCode`] validate and normalize at construction,
//! so two spellings of the same subject or country always compare equal.
//! [`CircleId`] is assigned monotonically by the ledger and is valid by
//! construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// SubjectId
// ---------------------------------------------------------------------------

/// Maximum length of a subject identifier.
const SUBJECT_ID_MAX_LEN: usize = 128;

/// The identity a verification result is about, and the key members are
/// tracked under inside circles.
///
/// Any string of 1–128 characters from `[A-Za-z0-9._:-]` is accepted.
/// Two forms are normalized:
///
/// - UUIDs are rendered lowercase and hyphenated.
/// - `0x`-prefixed 20-byte wallet addresses are lowercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    /// Validate and normalize a subject identifier.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        let valid_chars = raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-'));
        if raw.is_empty() || raw.len() > SUBJECT_ID_MAX_LEN || !valid_chars {
            return Err(ValidationError::InvalidSubjectId(raw.to_string()));
        }

        if let Ok(uuid) = Uuid::parse_str(raw) {
            return Ok(Self(uuid.hyphenated().to_string()));
        }
        if is_wallet_address(raw) {
            return Ok(Self(raw.to_ascii_lowercase()));
        }
        Ok(Self(raw.to_string()))
    }

    /// The normalized identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_wallet_address(s: &str) -> bool {
    let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) else {
        return false;
    };
    hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

impl TryFrom<String> for SubjectId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

impl std::str::FromStr for SubjectId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// CountryCode
// ---------------------------------------------------------------------------

/// ISO-3166 alpha-3 country code (e.g. `USA`, `GBR`, `NGA`).
///
/// Exactly three ASCII letters, normalized to upper case. Used both for a
/// circle's residency constraint and for the nationality disclosed by an
/// attestation; eligibility requires exact equality of the two.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Validate and normalize an alpha-3 code.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        if raw.len() != 3 || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCountryCode(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    /// The upper-case code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CountryCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl std::str::FromStr for CountryCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// CircleId
// ---------------------------------------------------------------------------

/// Identifier of a savings circle, assigned monotonically by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircleId(u64);

impl CircleId {
    /// Wrap a raw circle number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw circle number.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Big-endian bytes, used when the id seeds a derivation.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<u64> for CircleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CircleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
