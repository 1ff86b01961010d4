//! # rosca-state — Circle Lifecycle State Machine
//!
//! A [`Circle`] owns its members, the contributions received for the current
//! period, the payout order, and its phase. Every operation validates fully
//! before mutating anything, so a rejected call leaves the circle unchanged.
//!
//! ## Phases
//!
//! ```text
//! Open ──(members full)──▶ Active ──(all contributions in)──▶ Rotating
//!  │                         │                                   │
//!  │                         │          ◀──(payout, unpaid left)─┤
//!  │                         │                                   │
//!  └──▶ Cancelled ◀──────────┘          (payout, last paid)──▶ Completed
//! ```
//!
//! Cancellation is only possible from `Open` or `Active` before any payout.
//!
//! ## Modules
//!
//! - `policy`: [`CirclePolicy`], immutable, validated at construction.
//! - `ordering`: [`PayoutOrdering`], join order or a seeded permutation any
//!   observer can recompute.
//! - `circle`: [`Circle`], [`CirclePhase`], payout and transition records.

pub mod circle;
pub mod ordering;
pub mod policy;

pub use circle::{
    Circle, CircleError, CirclePhase, CircleSummary, ContributionReceipt, JoinReceipt,
    PayoutInstruction, PayoutRecord, PhaseTransition,
};
pub use ordering::PayoutOrdering;
pub use policy::{CirclePolicy, CirclePolicyDraft, PolicyError};
