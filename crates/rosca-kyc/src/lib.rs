//! # rosca-kyc — Verification Registry and Eligibility
//!
//! Holds the latest successful attestation per subject and answers the one
//! question circles ask of it: may this subject join a circle with this
//! country and age range?
//!
//! - **Registry** (`registry.rs`): [`VerificationRegistry`], last-verified-wins
//!   storage behind the [`VerificationLookup`] read seam. Invalid results are
//!   never stored and never erase a previous good record.
//!
//! - **Eligibility** (`eligibility.rs`): [`EligibilityEvaluator`], a pure,
//!   fail-closed check with deterministic reason ordering, and the
//!   [`StalenessPolicy`] deciding how long a verification stays usable.

pub mod eligibility;
pub mod error;
pub mod registry;

pub use eligibility::{
    Eligibility, EligibilityCriteria, EligibilityEvaluator, IneligibleReason, StalenessPolicy,
};
pub use error::RegistryError;
pub use registry::{
    RecordOutcome, VerificationLookup, VerificationRecord, VerificationRegistry, VerificationSummary,
};
