//! # rosca-ledger — Circle Ledger and Rotation
//!
//! The single source of truth for circle state.
//!
//! ## Locking
//!
//! Each circle sits behind its own `RwLock`, shared through an `Arc`. The map
//! of circles has a separate lock that is only held long enough to look up or
//! insert an entry. Mutations on one circle are serialized; circles with
//! different ids proceed in parallel; readers clone a consistent snapshot
//! under the circle's read lock.
//!
//! Lock order, where two are held at once:
//! `circles map → country index` (creation) and
//! `circle → member index` (admission). No path acquires them in reverse.
//!
//! ## Modules
//!
//! - `ledger`: [`CircleLedger`], creation, admission, contributions, reads,
//!   cancellation.
//! - `scheduler`: [`RotationScheduler`], payout through a [`Settlement`]
//!   committed only when settlement succeeds.
//! - `settlement`: the [`Settlement`] boundary and the in-memory [`PayoutLog`].

pub mod error;
pub mod ledger;
pub mod scheduler;
pub mod settlement;

pub use error::LedgerError;
pub use ledger::CircleLedger;
pub use scheduler::{RotationScheduler, SweepReport};
pub use settlement::{PayoutLog, SettledPayout, Settlement, SettlementError};
