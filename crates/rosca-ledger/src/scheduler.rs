//! # Rotation Scheduler
//!
//! Advances circles from `Rotating` to the next period.
//!
//! `advance_period` holds the circle's write lock across
//! prepare → settle → apply. If settlement fails nothing is committed: the
//! circle stays `Rotating` at the same period and the call can be retried.
//! Because the lock is held, no contribution or second advance can
//! interleave with an in-flight payout.

use std::sync::Arc;

use rosca_core::{CircleId, Timestamp};
use rosca_state::{CirclePhase, PayoutRecord};
use serde::Serialize;

use crate::error::LedgerError;
use crate::ledger::CircleLedger;
use crate::settlement::Settlement;

/// Outcome of one sweep over ready circles.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Payouts committed, with their circle.
    pub paid: Vec<(CircleId, PayoutRecord)>,
    /// Circles that could not be advanced, with the error code.
    pub failed: Vec<(CircleId, String)>,
}

/// Drives payouts for a ledger through a settlement collaborator.
#[derive(Clone)]
pub struct RotationScheduler {
    ledger: Arc<CircleLedger>,
    settlement: Arc<dyn Settlement>,
}

impl std::fmt::Debug for RotationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationScheduler")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl RotationScheduler {
    /// Scheduler for `ledger`, settling through `settlement`.
    pub fn new(ledger: Arc<CircleLedger>, settlement: Arc<dyn Settlement>) -> Self {
        Self { ledger, settlement }
    }

    /// The ledger being driven.
    pub fn ledger(&self) -> &Arc<CircleLedger> {
        &self.ledger
    }

    /// Pay the current period's recipient of circle `id` and advance it.
    pub fn advance_period(&self, id: CircleId) -> Result<PayoutRecord, LedgerError> {
        let cell = self.ledger.cell(id)?;
        let mut circle = cell.write();

        let instruction = circle.prepare_payout()?;
        if let Err(e) = self.settlement.settle(&instruction) {
            tracing::error!(
                circle = %id,
                period = instruction.period_index,
                recipient = %instruction.recipient,
                error = %e,
                "settlement failed, period not advanced"
            );
            return Err(e.into());
        }
        let record = circle.apply_payout(&instruction, Timestamp::now())?;
        let completed = circle.phase() == CirclePhase::Completed;
        drop(circle);

        metrics::counter!("rosca_payouts_total").increment(1);
        tracing::info!(
            circle = %id,
            period = record.period_index,
            recipient = %record.recipient,
            amount = %record.amount,
            "payout executed"
        );
        if completed {
            tracing::info!(circle = %id, "circle completed");
        }
        Ok(record)
    }

    /// Advance every circle currently `Rotating`.
    pub fn run_pending(&self) -> SweepReport {
        let mut report = SweepReport::default();
        for id in self.ledger.circles_in_phase(CirclePhase::Rotating) {
            match self.advance_period(id) {
                Ok(record) => report.paid.push((id, record)),
                Err(e) => report.failed.push((id, e.code().to_string())),
            }
        }
        report
    }
}
