//! # Circle Ledger
//!
//! Owns every circle. Each public operation is atomic: it runs against one
//! circle under that circle's write lock and either applies fully or returns
//! an error with nothing changed.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rosca_core::{CircleId, CountryCode, SubjectId, Timestamp};
use rosca_kyc::EligibilityEvaluator;
use rosca_state::{
    Circle, CirclePhase, CirclePolicy, CirclePolicyDraft, CircleSummary, ContributionReceipt,
    JoinReceipt, PayoutOrdering,
};

use crate::error::LedgerError;

type CircleCell = Arc<RwLock<Circle>>;

/// The authoritative store of circles.
pub struct CircleLedger {
    circles: RwLock<BTreeMap<CircleId, CircleCell>>,
    by_country: RwLock<HashMap<CountryCode, Vec<CircleId>>>,
    by_member: RwLock<HashMap<SubjectId, Vec<CircleId>>>,
    next_id: AtomicU64,
    evaluator: EligibilityEvaluator,
    ordering: PayoutOrdering,
}

impl std::fmt::Debug for CircleLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircleLedger")
            .field("circles", &self.total_circles())
            .field("ordering", &self.ordering)
            .finish_non_exhaustive()
    }
}

impl CircleLedger {
    /// Empty ledger checking joiners with `evaluator` and ordering payouts
    /// with `ordering`.
    pub fn new(evaluator: EligibilityEvaluator, ordering: PayoutOrdering) -> Self {
        Self {
            circles: RwLock::new(BTreeMap::new()),
            by_country: RwLock::new(HashMap::new()),
            by_member: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            evaluator,
            ordering,
        }
    }

    /// Payout ordering applied to new circles.
    pub fn ordering(&self) -> PayoutOrdering {
        self.ordering
    }

    /// Eligibility evaluator used for admission.
    pub fn evaluator(&self) -> &EligibilityEvaluator {
        &self.evaluator
    }

    // ── Mutations ──

    /// Validate `draft` and create an open circle.
    pub fn create_circle(&self, draft: CirclePolicyDraft) -> Result<CircleId, LedgerError> {
        let policy = CirclePolicy::new(draft)?;
        Ok(self.create_with_policy(policy, Timestamp::now()))
    }

    /// Create an open circle from an already validated policy.
    pub fn create_with_policy(&self, policy: CirclePolicy, now: Timestamp) -> CircleId {
        let country = policy.country_code().clone();

        // Id allocation and index appends share the map lock.
        let mut circles = self.circles.write();
        let id = CircleId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let circle = Circle::new(id, policy, self.ordering, now);
        circles.insert(id, Arc::new(RwLock::new(circle)));
        self.by_country.write().entry(country.clone()).or_default().push(id);
        drop(circles);

        metrics::counter!("rosca_circles_created_total").increment(1);
        tracing::info!(circle = %id, country = %country, "circle created");
        id
    }

    /// Admit `subject` to circle `id`.
    pub fn join_circle(&self, id: CircleId, subject: &SubjectId) -> Result<JoinReceipt, LedgerError> {
        self.join_circle_at(id, subject, Timestamp::now())
    }

    /// Admit `subject` to circle `id`, evaluating eligibility as of `now`.
    pub fn join_circle_at(
        &self,
        id: CircleId,
        subject: &SubjectId,
        now: Timestamp,
    ) -> Result<JoinReceipt, LedgerError> {
        let cell = self.cell(id)?;
        let mut circle = cell.write();
        let receipt = match circle.join(subject, &self.evaluator, now) {
            Ok(receipt) => receipt,
            Err(e) => {
                metrics::counter!("rosca_join_rejections_total", "reason" => e.code()).increment(1);
                tracing::info!(circle = %id, subject = %subject, error = %e, "join rejected");
                return Err(e.into());
            }
        };
        self.by_member
            .write()
            .entry(subject.clone())
            .or_default()
            .push(id);
        drop(circle);

        metrics::counter!("rosca_members_admitted_total").increment(1);
        tracing::info!(circle = %id, subject = %subject, position = receipt.position, "member admitted");
        if receipt.activated {
            tracing::info!(circle = %id, "circle activated");
        }
        Ok(receipt)
    }

    /// Record `subject`'s contribution to circle `id` for `period_index`.
    pub fn record_contribution(
        &self,
        id: CircleId,
        subject: &SubjectId,
        period_index: u32,
    ) -> Result<ContributionReceipt, LedgerError> {
        let cell = self.cell(id)?;
        let receipt = cell.write().contribute(subject, period_index, Timestamp::now())?;
        tracing::debug!(circle = %id, subject = %subject, period = period_index, "contribution recorded");
        if receipt.period_complete {
            tracing::info!(circle = %id, period = period_index, "period complete, awaiting payout");
        }
        Ok(receipt)
    }

    /// Cancel circle `id`.
    pub fn cancel_circle(&self, id: CircleId, reason: &str) -> Result<(), LedgerError> {
        let cell = self.cell(id)?;
        cell.write().cancel(reason, Timestamp::now())?;
        tracing::info!(circle = %id, reason, "circle cancelled");
        Ok(())
    }

    // ── Reads ──

    /// Snapshot of circle `id`.
    pub fn get_circle(&self, id: CircleId) -> Result<Circle, LedgerError> {
        Ok(self.cell(id)?.read().clone())
    }

    /// Compact view of circle `id`.
    pub fn summary(&self, id: CircleId) -> Result<CircleSummary, LedgerError> {
        Ok(self.cell(id)?.read().summary())
    }

    /// Circles requiring `country`, in creation order.
    pub fn list_circles_by_country(&self, country: &CountryCode) -> Vec<CircleId> {
        self.by_country
            .read()
            .get(country)
            .cloned()
            .unwrap_or_default()
    }

    /// Circles `subject` has joined, in join order.
    pub fn get_user_circles(&self, subject: &SubjectId) -> Vec<CircleId> {
        self.by_member
            .read()
            .get(subject)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of circles ever created.
    pub fn total_circles(&self) -> usize {
        self.circles.read().len()
    }

    /// Every circle id, ascending.
    pub fn circle_ids(&self) -> Vec<CircleId> {
        self.circles.read().keys().copied().collect()
    }

    /// Ids of circles currently in `phase`.
    pub fn circles_in_phase(&self, phase: CirclePhase) -> Vec<CircleId> {
        let cells: Vec<(CircleId, CircleCell)> = self
            .circles
            .read()
            .iter()
            .map(|(id, cell)| (*id, Arc::clone(cell)))
            .collect();
        cells
            .into_iter()
            .filter(|(_, cell)| cell.read().phase() == phase)
            .map(|(id, _)| id)
            .collect()
    }

    pub(crate) fn cell(&self, id: CircleId) -> Result<CircleCell, LedgerError> {
        self.circles
            .read()
            .get(&id)
            .cloned()
            .ok_or(LedgerError::CircleNotFound(id))
    }
}
