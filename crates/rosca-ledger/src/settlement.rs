//! # Settlement Boundary
//!
//! Moving value is someone else's job. The scheduler hands each payout to a
//! [`Settlement`] and commits the rotation only if it reports success.
//! Retries and timeouts belong to the implementation.

use parking_lot::Mutex;
use rosca_core::{CircleId, Timestamp};
use rosca_state::PayoutInstruction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The value-transfer collaborator.
pub trait Settlement: Send + Sync {
    /// Move `instruction.amount` to `instruction.recipient`.
    fn settle(&self, instruction: &PayoutInstruction) -> Result<(), SettlementError>;
}

/// Value transfer failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SettlementError(pub String);

/// A payout accepted by [`PayoutLog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledPayout {
    /// What was paid.
    #[serde(flatten)]
    pub instruction: PayoutInstruction,
    /// When it was accepted.
    pub settled_at: Timestamp,
}

/// In-memory settlement that records every instruction it is given.
#[derive(Debug, Default)]
pub struct PayoutLog {
    entries: Mutex<Vec<SettledPayout>>,
}

impl PayoutLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every settled payout, oldest first.
    pub fn entries(&self) -> Vec<SettledPayout> {
        self.entries.lock().clone()
    }

    /// Settled payouts of one circle, oldest first.
    pub fn for_circle(&self, id: CircleId) -> Vec<SettledPayout> {
        self.entries
            .lock()
            .iter()
            .filter(|p| p.instruction.circle_id == id)
            .cloned()
            .collect()
    }
}

impl Settlement for PayoutLog {
    fn settle(&self, instruction: &PayoutInstruction) -> Result<(), SettlementError> {
        self.entries.lock().push(SettledPayout {
            instruction: instruction.clone(),
            settled_at: Timestamp::now(),
        });
        Ok(())
    }
}
