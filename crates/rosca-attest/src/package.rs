//! # Attestation Packages
//!
//! The wire request, its decoded form, and the statement a proof is bound to.
//!
//! ## Scheme version 1
//!
//! Public signals are a vector of exactly seven strings:
//!
//! | Index | Signal | Encoding |
//! |-------|--------|----------|
//! | 0 | version | `"1"` |
//! | 1 | scope hash | lowercase hex SHA-256 of the application scope |
//! | 2 | subject id | [`SubjectId`] |
//! | 3 | nationality | ISO alpha-3, `""` when undisclosed |
//! | 4 | age at verification | decimal, `""` when undisclosed |
//! | 5 | is unique | `"1"` / `"0"`, `""` when undisclosed |
//! | 6 | sanctions screen passed | `"1"` / `"0"`, `""` when undisclosed |
//!
//! User context data is `SHA-256(endpoint)` followed by the UTF-8 subject id.
//!
//! ## Statement
//!
//! The proof attests to a [`Statement`]: SHA-256 over a domain-separated,
//! length-prefixed encoding of the document type, every public signal, and
//! the context data. Changing any byte of any input changes the statement.

use rosca_core::{CountryCode, SubjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::AttestationError;
use crate::hex;

/// Public-signal scheme version implemented by this crate.
pub const SCHEME_VERSION: &str = "1";

/// Number of public signals in scheme version 1.
pub const SIGNAL_COUNT: usize = 7;

/// Domain separator mixed into every statement digest.
const STATEMENT_DOMAIN: &[u8] = b"rosca-attest/v1";

/// Maximum plausible age accepted in a disclosure.
const MAX_DISCLOSED_AGE: u8 = 150;

/// SHA-256 of a string, as raw bytes.
pub fn sha256(input: &str) -> [u8; 32] {
    Sha256::digest(input.as_bytes()).into()
}

// ── Document type ───────────────────────────────────────────────────

/// The identity document an attestation was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Biometric passport (attestation id 1).
    Passport,
    /// EU national identity card (attestation id 2).
    EuIdCard,
    /// Aadhaar (attestation id 3).
    Aadhaar,
}

impl DocumentType {
    /// Numeric attestation id used on the wire.
    pub fn id(&self) -> u8 {
        match self {
            Self::Passport => 1,
            Self::EuIdCard => 2,
            Self::Aadhaar => 3,
        }
    }

    /// Map a numeric attestation id.
    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(Self::Passport),
            2 => Some(Self::EuIdCard),
            3 => Some(Self::Aadhaar),
            _ => None,
        }
    }

    fn from_value(value: &Value) -> Result<Self, AttestationError> {
        let id = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        id.and_then(Self::from_id)
            .ok_or_else(|| AttestationError::UnsupportedDocumentType(value.to_string()))
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Passport => "passport",
            Self::EuIdCard => "eu_id_card",
            Self::Aadhaar => "aadhaar",
        };
        f.write_str(s)
    }
}

// ── Wire request ────────────────────────────────────────────────────

/// The verification request exactly as submitted.
///
/// Every field is kept as raw JSON so that absent, `null`, and empty values
/// can all be reported as missing in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttestationRequest {
    /// Document-type tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation_id: Option<Value>,
    /// Proof blob, hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,
    /// Public-signal vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_signals: Option<Value>,
    /// Caller-supplied context data, hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_context_data: Option<Value>,
}

impl RawAttestationRequest {
    /// Wire names of every missing field, in request order.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("attestationId", &self.attestation_id),
            ("proof", &self.proof),
            ("publicSignals", &self.public_signals),
            ("userContextData", &self.user_context_data),
        ]
        .into_iter()
        .filter(|(_, value)| is_missing(value))
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

fn is_missing(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

// ── Decoded package ─────────────────────────────────────────────────

/// A structurally decoded attestation package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationPackage {
    /// Document the attestation was produced from.
    pub document_type: DocumentType,
    /// Proof bytes, opaque to this crate.
    pub proof: Vec<u8>,
    /// Public signals as submitted.
    pub public_signals: Vec<String>,
    /// Context data bytes.
    pub context: Vec<u8>,
}

impl AttestationPackage {
    /// Decode a wire request.
    ///
    /// Missing fields are checked first and reported together, before any
    /// field is decoded.
    pub fn from_raw(raw: &RawAttestationRequest) -> Result<Self, AttestationError> {
        let missing = raw.missing_fields();
        if !missing.is_empty() {
            return Err(AttestationError::MalformedRequest { missing });
        }

        let document_type = DocumentType::from_value(raw.attestation_id.as_ref().unwrap_or(&Value::Null))?;

        let proof = match &raw.proof {
            Some(Value::String(s)) => hex::decode(s).map_err(AttestationError::MalformedProof)?,
            _ => return Err(AttestationError::MalformedProof("proof must be a hex string".into())),
        };

        let public_signals = match &raw.public_signals {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    _ => Err(AttestationError::MalformedSignal {
                        index,
                        reason: "signal must be a string".into(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => {
                return Err(AttestationError::MalformedSignal {
                    index: 0,
                    reason: "publicSignals must be an array".into(),
                })
            }
        };

        let context = match &raw.user_context_data {
            Some(Value::String(s)) => hex::decode(s).map_err(AttestationError::MalformedContext)?,
            _ => {
                return Err(AttestationError::MalformedContext(
                    "userContextData must be a hex string".into(),
                ))
            }
        };

        Ok(Self {
            document_type,
            proof,
            public_signals,
            context,
        })
    }

    /// The statement this package's proof must attest to.
    pub fn statement(&self) -> Statement {
        Statement::compute(self.document_type, &self.public_signals, &self.context)
    }

    /// Render back into the wire request shape.
    pub fn to_request(&self) -> RawAttestationRequest {
        RawAttestationRequest {
            attestation_id: Some(Value::from(self.document_type.id())),
            proof: Some(Value::String(hex::encode(&self.proof))),
            public_signals: Some(Value::Array(
                self.public_signals.iter().cloned().map(Value::String).collect(),
            )),
            user_context_data: Some(Value::String(hex::encode(&self.context))),
        }
    }
}

// ── Disclosed attributes ────────────────────────────────────────────

/// Identity facts revealed by a valid attestation. `None` means the holder
/// chose not to disclose that attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosedAttributes {
    /// Nationality as ISO alpha-3.
    pub nationality_code: Option<CountryCode>,
    /// Age in whole years when the document was attested.
    pub age_at_verification: Option<u8>,
    /// Uniqueness ("is human") flag.
    pub is_unique: Option<bool>,
    /// Whether the holder passed the sanctions screen.
    pub passed_sanctions_screen: Option<bool>,
}

// ── Public signals ──────────────────────────────────────────────────

/// Decoded scheme-v1 public signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureSignals {
    /// Lowercase hex SHA-256 of the scope the proof was produced for.
    pub scope_hash: String,
    /// Subject the disclosure is about.
    pub subject_id: SubjectId,
    /// Disclosed attributes.
    pub attributes: DisclosedAttributes,
}

impl DisclosureSignals {
    /// Decode a public-signal vector.
    ///
    /// The version signal is checked before the vector length so that a
    /// package from another scheme is reported as a scheme mismatch.
    pub fn parse(signals: &[String]) -> Result<Self, AttestationError> {
        let malformed = |index: usize, reason: String| AttestationError::MalformedSignal { index, reason };

        let version = signals
            .first()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| malformed(0, "missing scheme version".into()))?;
        if version != SCHEME_VERSION {
            return Err(AttestationError::SchemeMismatch {
                expected: SCHEME_VERSION.to_string(),
                found: version.clone(),
            });
        }
        if signals.len() != SIGNAL_COUNT {
            return Err(malformed(
                signals.len().min(SIGNAL_COUNT),
                format!("expected {SIGNAL_COUNT} signals, found {}", signals.len()),
            ));
        }

        let scope_hash = &signals[1];
        if scope_hash.len() != 64 || !scope_hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(malformed(1, "scope hash must be 64 lowercase hex characters".into()));
        }

        let subject_id = SubjectId::new(&signals[2]).map_err(|e| malformed(2, e.to_string()))?;

        let nationality_code = match signals[3].as_str() {
            "" => None,
            code => Some(CountryCode::new(code).map_err(|e| malformed(3, e.to_string()))?),
        };

        let age_at_verification = match signals[4].as_str() {
            "" => None,
            age => {
                let age: u8 = age
                    .parse()
                    .map_err(|_| malformed(4, format!("age {age:?} is not a whole number")))?;
                if age > MAX_DISCLOSED_AGE {
                    return Err(malformed(4, format!("age {age} is not plausible")));
                }
                Some(age)
            }
        };

        let is_unique = parse_flag(&signals[5]).map_err(|r| malformed(5, r))?;
        let passed_sanctions_screen = parse_flag(&signals[6]).map_err(|r| malformed(6, r))?;

        Ok(Self {
            scope_hash: scope_hash.clone(),
            subject_id,
            attributes: DisclosedAttributes {
                nationality_code,
                age_at_verification,
                is_unique,
                passed_sanctions_screen,
            },
        })
    }

    /// Encode as a scheme-v1 public-signal vector.
    pub fn to_signals(&self) -> Vec<String> {
        let flag = |f: Option<bool>| match f {
            None => String::new(),
            Some(true) => "1".to_string(),
            Some(false) => "0".to_string(),
        };
        vec![
            SCHEME_VERSION.to_string(),
            self.scope_hash.clone(),
            self.subject_id.to_string(),
            self.attributes
                .nationality_code
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_default(),
            self.attributes
                .age_at_verification
                .map(|a| a.to_string())
                .unwrap_or_default(),
            flag(self.attributes.is_unique),
            flag(self.attributes.passed_sanctions_screen),
        ]
    }
}

fn parse_flag(s: &str) -> Result<Option<bool>, String> {
    match s {
        "" => Ok(None),
        "1" => Ok(Some(true)),
        "0" => Ok(Some(false)),
        other => Err(format!("flag must be \"1\", \"0\" or empty, found {other:?}")),
    }
}

// ── Context data ────────────────────────────────────────────────────

/// Decoded user context data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextData {
    /// SHA-256 of the endpoint the proof was produced for.
    pub endpoint_hash: [u8; 32],
    /// Subject the caller claims to be.
    pub subject_id: SubjectId,
}

impl ContextData {
    /// Context for `subject` submitting to `endpoint`.
    pub fn new(endpoint: &str, subject_id: SubjectId) -> Self {
        Self {
            endpoint_hash: sha256(endpoint),
            subject_id,
        }
    }

    /// Decode context bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, AttestationError> {
        if bytes.len() <= 32 {
            return Err(AttestationError::MalformedContext(format!(
                "expected endpoint hash and subject id, got {} bytes",
                bytes.len()
            )));
        }
        let (hash, subject) = bytes.split_at(32);
        let mut endpoint_hash = [0u8; 32];
        endpoint_hash.copy_from_slice(hash);
        let subject = std::str::from_utf8(subject)
            .map_err(|_| AttestationError::MalformedContext("subject id is not UTF-8".into()))?;
        let subject_id =
            SubjectId::new(subject).map_err(|e| AttestationError::MalformedContext(e.to_string()))?;
        Ok(Self {
            endpoint_hash,
            subject_id,
        })
    }

    /// Encode to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + self.subject_id.as_str().len());
        out.extend_from_slice(&self.endpoint_hash);
        out.extend_from_slice(self.subject_id.as_str().as_bytes());
        out
    }
}

// ── Statement ───────────────────────────────────────────────────────

/// The 32-byte digest a proof attests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Statement([u8; 32]);

impl Statement {
    /// Digest of a document type, signal vector, and context data.
    pub fn compute(document_type: DocumentType, signals: &[String], context: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(STATEMENT_DOMAIN);
        hasher.update([document_type.id()]);
        hasher.update((signals.len() as u32).to_be_bytes());
        for signal in signals {
            hasher.update((signal.len() as u32).to_be_bytes());
            hasher.update(signal.as_bytes());
        }
        hasher.update((context.len() as u32).to_be_bytes());
        hasher.update(context);
        Self(hasher.finalize().into())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex digest.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}
