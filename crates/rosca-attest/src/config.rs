//! Verifier configuration and proof backend selection.
//!
//! Variables:
//! - `ROSCA_SCOPE` (default: `self-auth-demo`)
//! - `ROSCA_ENDPOINT` (default: `https://localhost/api/verify`)
//! - `ROSCA_MINIMUM_AGE` (default: 18)
//! - `ROSCA_EXCLUDED_COUNTRIES` (comma-separated alpha-3, default: empty)
//! - `ROSCA_OFAC` (default: false)
//! - `ROSCA_ISSUER_PUBLIC_KEY` (hex Ed25519 key; selects signed disclosures)
//! - `ROSCA_MOCK_PROOFS` (default: false; required when no issuer key is set)

use std::sync::Arc;

use rosca_core::CountryCode;

use crate::ed25519::Ed25519DisclosureVerifier;
use crate::hex;
use crate::package::sha256;
use crate::traits::ProofVerifier;

/// Default application scope.
pub const DEFAULT_SCOPE: &str = "self-auth-demo";

/// Default verification endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://localhost/api/verify";

/// Default verifier-level minimum age.
pub const DEFAULT_MINIMUM_AGE: u8 = 18;

/// Static policy applied to every attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Application scope a proof must be bound to.
    pub scope: String,
    /// Endpoint the context data must be bound to.
    pub endpoint: String,
    /// Minimum disclosed age. `0` disables the check.
    pub minimum_age: u8,
    /// Nationalities that are refused outright.
    pub excluded_countries: Vec<CountryCode>,
    /// Require a passed sanctions screen.
    pub ofac: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            scope: DEFAULT_SCOPE.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            minimum_age: DEFAULT_MINIMUM_AGE,
            excluded_countries: Vec::new(),
            ofac: false,
        }
    }
}

impl VerifierConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let minimum_age = match lookup("ROSCA_MINIMUM_AGE") {
            Some(raw) => raw
                .trim()
                .parse::<u8>()
                .map_err(|_| ConfigError::invalid("ROSCA_MINIMUM_AGE", &raw, "expected 0-255"))?,
            None => defaults.minimum_age,
        };

        let excluded_countries = match lookup("ROSCA_EXCLUDED_COUNTRIES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|code| {
                    CountryCode::new(code).map_err(|_| {
                        ConfigError::invalid("ROSCA_EXCLUDED_COUNTRIES", code, "expected ISO alpha-3")
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.excluded_countries,
        };

        Ok(Self {
            scope: lookup("ROSCA_SCOPE").unwrap_or(defaults.scope),
            endpoint: lookup("ROSCA_ENDPOINT").unwrap_or(defaults.endpoint),
            minimum_age,
            excluded_countries,
            ofac: parse_bool("ROSCA_OFAC", lookup("ROSCA_OFAC"))?.unwrap_or(defaults.ofac),
        })
    }

    /// Lowercase hex SHA-256 of the scope, as carried in public signals.
    pub fn scope_hash(&self) -> String {
        hex::encode(&sha256(&self.scope))
    }

    /// SHA-256 of the endpoint, as carried in context data.
    pub fn endpoint_hash(&self) -> [u8; 32] {
        sha256(&self.endpoint)
    }
}

/// Which proof system the gateway trusts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofBackend {
    /// Ed25519 signed disclosures from the issuer with this hex public key.
    Ed25519 {
        /// Hex-encoded issuer public key.
        public_key_hex: String,
    },
    /// Transparent mock proofs.
    Mock,
}

impl ProofBackend {
    /// Select a backend from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Select a backend from an arbitrary variable lookup.
    ///
    /// An issuer key wins over the mock flag. With neither set there is no
    /// backend, which is an error rather than a silent fallback to mock.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(key) = lookup("ROSCA_ISSUER_PUBLIC_KEY").filter(|k| !k.trim().is_empty()) {
            return Ok(Self::Ed25519 {
                public_key_hex: key.trim().to_string(),
            });
        }
        match parse_bool("ROSCA_MOCK_PROOFS", lookup("ROSCA_MOCK_PROOFS"))? {
            Some(true) => Ok(Self::Mock),
            _ => Err(ConfigError::NoProofBackend),
        }
    }

    /// Instantiate the verifier for this backend.
    pub fn build(&self) -> Result<Arc<dyn ProofVerifier>, ConfigError> {
        match self {
            Self::Ed25519 { public_key_hex } => {
                let verifier = Ed25519DisclosureVerifier::from_hex(public_key_hex).map_err(|e| {
                    ConfigError::invalid("ROSCA_ISSUER_PUBLIC_KEY", public_key_hex, &e.to_string())
                })?;
                Ok(Arc::new(verifier))
            }
            #[cfg(feature = "mock")]
            Self::Mock => Ok(Arc::new(crate::mock::MockProofSystem)),
            #[cfg(not(feature = "mock"))]
            Self::Mock => Err(ConfigError::MockUnavailable),
        }
    }
}

fn parse_bool(var: &'static str, raw: Option<String>) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::invalid(var, &raw, "expected a boolean")),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable holds an unusable value.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        /// Variable name.
        var: String,
        /// Offending value.
        value: String,
        /// What was expected.
        reason: String,
    },
    /// Neither an issuer key nor mock proofs are configured.
    #[error("no proof backend configured: set ROSCA_ISSUER_PUBLIC_KEY or ROSCA_MOCK_PROOFS=true")]
    NoProofBackend,
    /// Mock proofs requested but the crate was built without the `mock` feature.
    #[error("mock proofs requested but the mock feature is disabled")]
    MockUnavailable,
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(var: &str, value: &str, reason: &str) -> Self {
        Self::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
