//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! Every component is an explicit handle built once at startup:
//! - **Verifier**: the attestation gateway with its proof backend
//! - **Registry**: last verification per subject
//! - **Ledger**: circles, their locks, and the country/member indexes
//! - **Scheduler**: advances rotating circles through the settlement log
//! - **Payouts**: the in-memory settlement collaborator
//!
//! Nothing is reached through a process-wide singleton, so tests build an
//! isolated state per case.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use rosca_attest::{AttestationVerifier, ConfigError, ProofBackend, ProofVerifier, VerifierConfig};
use rosca_kyc::{EligibilityEvaluator, StalenessPolicy, VerificationRegistry};
use rosca_ledger::{CircleLedger, PayoutLog, RotationScheduler};
use rosca_state::PayoutOrdering;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static attestation policy.
    pub verifier: VerifierConfig,
    /// Proof system used to check attestations.
    pub backend: ProofBackend,
    /// How long a verification stays usable for eligibility.
    pub staleness: StalenessPolicy,
    /// Payout ordering for new circles.
    pub ordering: PayoutOrdering,
    /// Interval of the background rotation sweep, if enabled.
    pub auto_advance: Option<Duration>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    /// Development defaults: mock proofs, no expiry, join-order payouts.
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            verifier: VerifierConfig::default(),
            backend: ProofBackend::Mock,
            staleness: StalenessPolicy::NoExpiry,
            ordering: PayoutOrdering::JoinOrder,
            auto_advance: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::invalid("PORT", &raw, "expected a port number"))?,
            None => DEFAULT_PORT,
        };

        let ttl_days = match lookup("ROSCA_VERIFICATION_TTL_DAYS").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(raw.trim().parse::<u32>().map_err(|_| {
                ConfigError::invalid("ROSCA_VERIFICATION_TTL_DAYS", &raw, "expected whole days")
            })?),
            None => None,
        };

        let ordering = match lookup("ROSCA_PAYOUT_ORDER").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .parse::<PayoutOrdering>()
                .map_err(|e| ConfigError::invalid("ROSCA_PAYOUT_ORDER", &raw, &e))?,
            None => PayoutOrdering::default(),
        };

        let auto_advance = match lookup("ROSCA_AUTO_ADVANCE_SECS").filter(|v| !v.trim().is_empty()) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::invalid(
                        "ROSCA_AUTO_ADVANCE_SECS",
                        &raw,
                        "expected a positive number of seconds",
                    ))
                }
            },
            None => None,
        };

        let log_format = match lookup("ROSCA_LOG_FORMAT") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "" | "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::invalid("ROSCA_LOG_FORMAT", &raw, "expected text or json")),
            },
            None => LogFormat::Text,
        };

        Ok(Self {
            port,
            verifier: VerifierConfig::from_lookup(&lookup)?,
            backend: ProofBackend::from_lookup(&lookup)?,
            staleness: StalenessPolicy::from_ttl_days(ttl_days),
            ordering,
            auto_advance,
            log_format,
        })
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub verifier: Arc<AttestationVerifier>,
    pub registry: Arc<VerificationRegistry>,
    pub ledger: Arc<CircleLedger>,
    pub scheduler: RotationScheduler,
    pub payouts: Arc<PayoutLog>,
    /// Prometheus render handle. `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State with development defaults (mock proofs).
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config(AppConfig::default())
    }

    /// State built from `config`, instantiating its proof backend.
    pub fn with_config(config: AppConfig) -> Result<Self, ConfigError> {
        let proof_verifier = config.backend.build()?;
        Ok(Self::with_proof_verifier(config, proof_verifier))
    }

    /// State built from `config` with an explicit proof verifier.
    pub fn with_proof_verifier(config: AppConfig, proof_verifier: Arc<dyn ProofVerifier>) -> Self {
        let verifier = AttestationVerifier::new(config.verifier.clone(), proof_verifier);
        let registry = Arc::new(VerificationRegistry::new());
        let evaluator = EligibilityEvaluator::new(registry.clone(), config.staleness);
        let ledger = Arc::new(CircleLedger::new(evaluator, config.ordering));
        let payouts = Arc::new(PayoutLog::new());
        let scheduler = RotationScheduler::new(ledger.clone(), payouts.clone());
        Self {
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            registry,
            ledger,
            scheduler,
            payouts,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
