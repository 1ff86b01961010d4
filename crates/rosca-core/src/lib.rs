#![deny(missing_docs)]

//! # rosca-core — Foundational Types for the ROSCA Stack
//!
//! Every other crate in the workspace depends on `rosca-core`; it depends on
//! nothing internal. Only `serde`, `serde_json`, `thiserror`, `chrono`, and
//! `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`SubjectId`] cannot be
//!    passed where a [`CountryCode`] is expected, and both are validated at
//!    construction. No bare strings for identifiers.
//!
//! 2. **Fixed-point money.** [`Amount`] stores micro-units (6 fractional
//!    digits) as an integer. Floats never touch a monetary value.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] is UTC with seconds precision.
//!
//! 4. **One error taxonomy.** Every domain error in the workspace reports an
//!    [`ErrorClass`], so callers decide retry/surface behavior uniformly.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rosca-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use amount::{Amount, AMOUNT_DECIMALS};
pub use error::{AmountError, ErrorClass, RoscaError, ValidationError};
pub use identity::{CircleId, CountryCode, SubjectId};
pub use temporal::Timestamp;
