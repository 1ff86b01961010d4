//! # Circle State Machine
//!
//! ## Invariants
//!
//! - `members.len() <= max_members`, no duplicates, join order preserved.
//! - `Active` is only entered with a full member list.
//! - `contributions ⊆ members`.
//! - `current_period` only increases and never exceeds `duration_periods`.
//! - `payout_order` is fixed at activation; each member appears once.
//! - `Completed` only after every member received exactly one payout.
//!
//! Operations check every precondition before touching state. A payout is
//! split into [`Circle::prepare_payout`] (read only) and
//! [`Circle::apply_payout`] so the caller can settle value in between and
//! commit only on success.

use std::collections::BTreeSet;

use rosca_core::{Amount, AmountError, CircleId, ErrorClass, SubjectId, Timestamp};
use rosca_kyc::{EligibilityEvaluator, IneligibleReason};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ordering::PayoutOrdering;
use crate::policy::CirclePolicy;

// ─── Phase ───────────────────────────────────────────────────────────

/// Lifecycle phase of a circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CirclePhase {
    /// Accepting members.
    Open,
    /// Full; collecting the current period's contributions.
    Active,
    /// Every contribution for the period is in; awaiting payout.
    Rotating,
    /// Every member has been paid once (terminal).
    Completed,
    /// Cancelled before any payout (terminal).
    Cancelled,
}

impl CirclePhase {
    /// Whether this phase is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for CirclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "Open",
            Self::Active => "Active",
            Self::Rotating => "Rotating",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// A rejected circle operation. The circle is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircleError {
    /// Joining requires phase `Open`.
    #[error("circle is not open (phase {phase})")]
    CircleNotOpen {
        /// Current phase.
        phase: CirclePhase,
    },

    /// The subject is already a member.
    #[error("{0} is already a member")]
    AlreadyMember(SubjectId),

    /// The subject fails the circle's eligibility constraints.
    #[error("{subject} is not eligible: {reason}")]
    Ineligible {
        /// Rejected subject.
        subject: SubjectId,
        /// First failing check.
        reason: IneligibleReason,
    },

    /// Contribution for a period other than the current one.
    #[error("wrong period: current period is {expected}, got {got}")]
    WrongPeriod {
        /// Current period index.
        expected: u32,
        /// Submitted period index.
        got: u32,
    },

    /// The subject is not a member.
    #[error("{0} is not a member")]
    NotAMember(SubjectId),

    /// The member already contributed this period.
    #[error("{0} already contributed this period")]
    DuplicateContribution(SubjectId),

    /// Contributions require phase `Active`.
    #[error("circle is not collecting contributions (phase {phase})")]
    CircleNotActive {
        /// Current phase.
        phase: CirclePhase,
    },

    /// Not every member has contributed this period.
    #[error("period not ready: {missing} contribution(s) missing")]
    PeriodNotReady {
        /// Members yet to contribute.
        missing: usize,
    },

    /// The action is not valid in the current phase.
    #[error("cannot {action} a circle in phase {from}")]
    InvalidTransition {
        /// Current phase.
        from: CirclePhase,
        /// Attempted action.
        action: &'static str,
    },

    /// Cancellation after at least one payout.
    #[error("cannot cancel after {payouts} payout(s)")]
    CannotCancelAfterPayout {
        /// Payouts already made.
        payouts: usize,
    },

    /// The pool amount overflowed.
    #[error("payout amount overflow: {0}")]
    PayoutOverflow(AmountError),

    /// A prepared payout no longer matches the circle.
    #[error("stale payout instruction for period {got}, circle is at period {expected}")]
    StalePayout {
        /// Current period index.
        expected: u32,
        /// Period the instruction was prepared for.
        got: u32,
    },
}

impl CircleError {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Ineligible { .. } => ErrorClass::PolicyFailure,
            Self::PayoutOverflow(_) | Self::StalePayout { .. } => ErrorClass::Fatal,
            _ => ErrorClass::StateConflict,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CircleNotOpen { .. } => "CIRCLE_NOT_OPEN",
            Self::AlreadyMember(_) => "ALREADY_MEMBER",
            Self::Ineligible { .. } => "INELIGIBLE",
            Self::WrongPeriod { .. } => "WRONG_PERIOD",
            Self::NotAMember(_) => "NOT_A_MEMBER",
            Self::DuplicateContribution(_) => "DUPLICATE_CONTRIBUTION",
            Self::CircleNotActive { .. } => "CIRCLE_NOT_ACTIVE",
            Self::PeriodNotReady { .. } => "PERIOD_NOT_READY",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::CannotCancelAfterPayout { .. } => "CANNOT_CANCEL_AFTER_PAYOUT",
            Self::PayoutOverflow(_) => "PAYOUT_OVERFLOW",
            Self::StalePayout { .. } => "STALE_PAYOUT",
        }
    }
}

// ─── Records ─────────────────────────────────────────────────────────

/// One phase change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTransition {
    /// Phase before.
    pub from: CirclePhase,
    /// Phase after.
    pub to: CirclePhase,
    /// When it happened.
    pub at: Timestamp,
    /// Why.
    pub reason: String,
}

/// A payout that has been executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRecord {
    /// Period the payout closed.
    pub period_index: u32,
    /// Member paid.
    pub recipient: SubjectId,
    /// Pool paid out.
    pub amount: Amount,
    /// When it was committed.
    pub at: Timestamp,
}

/// A payout ready for settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutInstruction {
    /// Circle paying out.
    pub circle_id: CircleId,
    /// Period being closed.
    pub period_index: u32,
    /// Member to pay.
    pub recipient: SubjectId,
    /// `monthly_amount × members`.
    pub amount: Amount,
    /// Whether this is the final payout.
    pub completes_circle: bool,
}

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinReceipt {
    /// Zero-based join position.
    pub position: usize,
    /// Whether this join filled the circle and activated it.
    pub activated: bool,
}

/// Result of a successful contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionReceipt {
    /// Period contributed to.
    pub period_index: u32,
    /// Members yet to contribute this period.
    pub remaining: usize,
    /// Whether this contribution completed the period.
    pub period_complete: bool,
}

/// Compact view of a circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleSummary {
    /// Circle id.
    pub id: CircleId,
    /// Contribution per member per period.
    pub monthly_amount: Amount,
    /// Member cap.
    pub max_members: u32,
    /// Members joined so far.
    pub current_members: usize,
    /// Required nationality.
    pub country_code: rosca_core::CountryCode,
    /// Minimum age.
    pub min_age: u8,
    /// Maximum age.
    pub max_age: u8,
    /// Not completed and not cancelled.
    pub is_active: bool,
    /// Current phase.
    pub phase: CirclePhase,
}

// ─── Circle ──────────────────────────────────────────────────────────

/// A savings circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    id: CircleId,
    policy: CirclePolicy,
    ordering: PayoutOrdering,
    members: Vec<SubjectId>,
    #[serde(rename = "contributionsThisPeriod")]
    contributions: BTreeSet<SubjectId>,
    #[serde(rename = "currentPeriodIndex")]
    current_period: u32,
    payout_order: Vec<SubjectId>,
    phase: CirclePhase,
    created_at: Timestamp,
    transitions: Vec<PhaseTransition>,
    payouts: Vec<PayoutRecord>,
}

impl Circle {
    /// A new, empty, open circle.
    pub fn new(id: CircleId, policy: CirclePolicy, ordering: PayoutOrdering, now: Timestamp) -> Self {
        Self {
            id,
            policy,
            ordering,
            members: Vec::new(),
            contributions: BTreeSet::new(),
            current_period: 0,
            payout_order: Vec::new(),
            phase: CirclePhase::Open,
            created_at: now,
            transitions: Vec::new(),
            payouts: Vec::new(),
        }
    }

    // ── Accessors ──

    /// Circle id.
    pub fn id(&self) -> CircleId {
        self.id
    }

    /// Policy fixed at creation.
    pub fn policy(&self) -> &CirclePolicy {
        &self.policy
    }

    /// Payout ordering rule.
    pub fn ordering(&self) -> PayoutOrdering {
        self.ordering
    }

    /// Members in join order.
    pub fn members(&self) -> &[SubjectId] {
        &self.members
    }

    /// Whether `subject` is a member.
    pub fn is_member(&self, subject: &SubjectId) -> bool {
        self.members.contains(subject)
    }

    /// Members who contributed this period.
    pub fn contributions(&self) -> &BTreeSet<SubjectId> {
        &self.contributions
    }

    /// Current period index.
    pub fn current_period(&self) -> u32 {
        self.current_period
    }

    /// Payout order; empty while open.
    pub fn payout_order(&self) -> &[SubjectId] {
        &self.payout_order
    }

    /// Current phase.
    pub fn phase(&self) -> CirclePhase {
        self.phase
    }

    /// Creation time.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Phase change log.
    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    /// Executed payouts.
    pub fn payouts(&self) -> &[PayoutRecord] {
        &self.payouts
    }

    /// Pool paid each period: `monthly_amount × members`.
    pub fn pool_amount(&self) -> Result<Amount, CircleError> {
        self.policy
            .monthly_amount()
            .checked_mul(self.members.len() as u64)
            .map_err(CircleError::PayoutOverflow)
    }

    /// Compact view.
    pub fn summary(&self) -> CircleSummary {
        CircleSummary {
            id: self.id,
            monthly_amount: self.policy.monthly_amount(),
            max_members: self.policy.max_members(),
            current_members: self.members.len(),
            country_code: self.policy.country_code().clone(),
            min_age: self.policy.min_age(),
            max_age: self.policy.max_age(),
            is_active: !self.phase.is_terminal(),
            phase: self.phase,
        }
    }

    // ── Operations ──

    /// Admit `subject` if the circle is open, they are not yet a member, and
    /// they are eligible. Filling the last seat activates the circle and fixes
    /// the payout order.
    pub fn join(
        &mut self,
        subject: &SubjectId,
        evaluator: &EligibilityEvaluator,
        now: Timestamp,
    ) -> Result<JoinReceipt, CircleError> {
        if self.phase != CirclePhase::Open {
            return Err(CircleError::CircleNotOpen { phase: self.phase });
        }
        if self.is_member(subject) {
            return Err(CircleError::AlreadyMember(subject.clone()));
        }
        let verdict = evaluator.evaluate_at(subject, &self.policy.criteria(), now);
        if let Some(reason) = verdict.reason {
            return Err(CircleError::Ineligible {
                subject: subject.clone(),
                reason,
            });
        }

        self.members.push(subject.clone());
        let position = self.members.len() - 1;
        let activated = self.members.len() as u32 == self.policy.max_members();
        if activated {
            self.payout_order = self.ordering.order(self.id, &self.members);
            self.do_transition(CirclePhase::Active, "member cap reached", now);
        }
        Ok(JoinReceipt {
            position,
            activated,
        })
    }

    /// Record `subject`'s contribution for `period_index`. The last missing
    /// contribution moves the circle to `Rotating`.
    ///
    /// In `Rotating` every member has already paid, so a member resubmitting
    /// gets [`CircleError::DuplicateContribution`] rather than a phase error.
    pub fn contribute(
        &mut self,
        subject: &SubjectId,
        period_index: u32,
        now: Timestamp,
    ) -> Result<ContributionReceipt, CircleError> {
        if !matches!(self.phase, CirclePhase::Active | CirclePhase::Rotating) {
            return Err(CircleError::CircleNotActive { phase: self.phase });
        }
        if period_index != self.current_period {
            return Err(CircleError::WrongPeriod {
                expected: self.current_period,
                got: period_index,
            });
        }
        if !self.is_member(subject) {
            return Err(CircleError::NotAMember(subject.clone()));
        }
        if self.contributions.contains(subject) {
            return Err(CircleError::DuplicateContribution(subject.clone()));
        }

        self.contributions.insert(subject.clone());
        let remaining = self.members.len() - self.contributions.len();
        let period_complete = remaining == 0;
        if period_complete {
            self.do_transition(CirclePhase::Rotating, "all contributions received", now);
        }
        Ok(ContributionReceipt {
            period_index,
            remaining,
            period_complete,
        })
    }

    /// The payout due for the current period, without changing anything.
    pub fn prepare_payout(&self) -> Result<PayoutInstruction, CircleError> {
        match self.phase {
            CirclePhase::Rotating => {}
            CirclePhase::Active => {
                return Err(CircleError::PeriodNotReady {
                    missing: self.members.len() - self.contributions.len(),
                })
            }
            from => {
                return Err(CircleError::InvalidTransition {
                    from,
                    action: "advance",
                })
            }
        }
        let recipient = self
            .payout_order
            .get(self.current_period as usize)
            .cloned()
            .ok_or(CircleError::InvalidTransition {
                from: self.phase,
                action: "advance",
            })?;
        Ok(PayoutInstruction {
            circle_id: self.id,
            period_index: self.current_period,
            recipient,
            amount: self.pool_amount()?,
            completes_circle: self.current_period as usize + 1 == self.members.len(),
        })
    }

    /// Commit a payout produced by [`Circle::prepare_payout`]: clear the
    /// period's contributions, advance the period, and move to `Active` or
    /// `Completed`.
    pub fn apply_payout(
        &mut self,
        instruction: &PayoutInstruction,
        now: Timestamp,
    ) -> Result<PayoutRecord, CircleError> {
        let expected = self.prepare_payout()?;
        if &expected != instruction {
            return Err(CircleError::StalePayout {
                expected: self.current_period,
                got: instruction.period_index,
            });
        }

        let record = PayoutRecord {
            period_index: instruction.period_index,
            recipient: instruction.recipient.clone(),
            amount: instruction.amount,
            at: now,
        };
        self.payouts.push(record.clone());
        self.contributions.clear();
        self.current_period += 1;
        if self.current_period as usize == self.members.len() {
            self.do_transition(CirclePhase::Completed, "every member paid", now);
        } else {
            self.do_transition(CirclePhase::Active, "payout executed", now);
        }
        Ok(record)
    }

    /// Prepare and apply in one step.
    pub fn advance_period(&mut self, now: Timestamp) -> Result<PayoutRecord, CircleError> {
        let instruction = self.prepare_payout()?;
        self.apply_payout(&instruction, now)
    }

    /// Cancel an `Open` or `Active` circle that has made no payout.
    pub fn cancel(&mut self, reason: &str, now: Timestamp) -> Result<(), CircleError> {
        if !self.payouts.is_empty() {
            return Err(CircleError::CannotCancelAfterPayout {
                payouts: self.payouts.len(),
            });
        }
        if !matches!(self.phase, CirclePhase::Open | CirclePhase::Active) {
            return Err(CircleError::InvalidTransition {
                from: self.phase,
                action: "cancel",
            });
        }
        self.contributions.clear();
        self.do_transition(CirclePhase::Cancelled, reason, now);
        Ok(())
    }

    fn do_transition(&mut self, to: CirclePhase, reason: &str, now: Timestamp) {
        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            at: now,
            reason: reason.to_string(),
        });
        tracing::debug!(circle = %self.id, from = %self.phase, to = %to, reason, "phase transition");
        self.phase = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::tests::draft;
    use rosca_attest::{AttestationResult, DisclosedAttributes, DocumentType, VerificationDetails};
    use rosca_core::CountryCode;
    use rosca_kyc::{StalenessPolicy, VerificationRegistry};
    use std::sync::Arc;

    fn now() -> Timestamp {
        Timestamp::parse("2026-03-01T00:00:00Z").unwrap()
    }

    fn sid(s: &str) -> SubjectId {
        SubjectId::new(s).unwrap()
    }

    fn verified(reg: &VerificationRegistry, name: &str, country: &str, age: u8) -> SubjectId {
        let subject = sid(name);
        let result = AttestationResult {
            subject_id: subject.clone(),
            document_type: DocumentType::Passport,
            is_valid: true,
            disclosed: DisclosedAttributes {
                nationality_code: Some(CountryCode::new(country).unwrap()),
                age_at_verification: Some(age),
                is_unique: Some(true),
                passed_sanctions_screen: Some(true),
            },
            details: VerificationDetails {
                is_valid: true,
                is_minimum_age_valid: true,
                is_ofac_valid: true,
                is_country_valid: true,
                reasons: vec![],
            },
            verified_at: now(),
        };
        reg.record(&subject, result).unwrap();
        subject
    }

    struct Fixture {
        registry: Arc<VerificationRegistry>,
        evaluator: EligibilityEvaluator,
        circle: Circle,
    }

    fn fixture(members: u32) -> Fixture {
        let registry = Arc::new(VerificationRegistry::new());
        let evaluator = EligibilityEvaluator::new(registry.clone(), StalenessPolicy::NoExpiry);
        let policy = CirclePolicy::new(draft(members, members)).unwrap();
        Fixture {
            registry,
            evaluator,
            circle: Circle::new(CircleId::new(1), policy, PayoutOrdering::JoinOrder, now()),
        }
    }

    fn full_circle() -> (Fixture, Vec<SubjectId>) {
        let mut f = fixture(3);
        let subjects: Vec<_> = [("a", 20), ("b", 30), ("c", 40)]
            .iter()
            .map(|(n, age)| verified(&f.registry, n, "USA", *age))
            .collect();
        for s in &subjects {
            f.circle.join(s, &f.evaluator, now()).unwrap();
        }
        (f, subjects)
    }

    #[test]
    fn test_new_circle_is_open_and_empty() {
        let f = fixture(3);
        assert_eq!(f.circle.phase(), CirclePhase::Open);
        assert!(f.circle.members().is_empty());
        assert_eq!(f.circle.current_period(), 0);
        assert!(f.circle.payout_order().is_empty());
    }

    #[test]
    fn test_filling_last_seat_activates() {
        let (f, subjects) = full_circle();
        assert_eq!(f.circle.phase(), CirclePhase::Active);
        assert_eq!(f.circle.payout_order(), subjects.as_slice());
        assert_eq!(f.circle.transitions().len(), 1);
        assert_eq!(f.circle.transitions()[0].to, CirclePhase::Active);
    }

    #[test]
    fn test_join_rejections_leave_members_unchanged() {
        let mut f = fixture(3);
        let a = verified(&f.registry, "a", "USA", 20);
        let g = verified(&f.registry, "g", "GBR", 30);
        f.circle.join(&a, &f.evaluator, now()).unwrap();

        assert_eq!(
            f.circle.join(&a, &f.evaluator, now()),
            Err(CircleError::AlreadyMember(a.clone()))
        );
        match f.circle.join(&g, &f.evaluator, now()) {
            Err(CircleError::Ineligible { reason, .. }) => {
                assert!(reason.to_string().contains("country mismatch"))
            }
            other => panic!("expected Ineligible, got {other:?}"),
        }
        let err = f.circle.join(&sid("ghost"), &f.evaluator, now()).unwrap_err();
        assert_eq!(err.class(), ErrorClass::PolicyFailure);
        assert_eq!(f.circle.members(), &[a]);
    }

    #[test]
    fn test_join_full_circle_not_open() {
        let (mut f, _) = full_circle();
        let d = verified(&f.registry, "d", "USA", 50);
        assert_eq!(
            f.circle.join(&d, &f.evaluator, now()),
            Err(CircleError::CircleNotOpen {
                phase: CirclePhase::Active
            })
        );
        assert_eq!(f.circle.members().len(), 3);
    }

    #[test]
    fn test_contribution_checks() {
        let (mut f, s) = full_circle();
        assert_eq!(
            f.circle.contribute(&s[0], 1, now()),
            Err(CircleError::WrongPeriod { expected: 0, got: 1 })
        );
        assert_eq!(
            f.circle.contribute(&sid("outsider"), 0, now()),
            Err(CircleError::NotAMember(sid("outsider")))
        );
        let receipt = f.circle.contribute(&s[0], 0, now()).unwrap();
        assert_eq!(receipt.remaining, 2);
        assert_eq!(
            f.circle.contribute(&s[0], 0, now()),
            Err(CircleError::DuplicateContribution(s[0].clone()))
        );
    }

    #[test]
    fn test_contribution_before_activation_rejected() {
        let mut f = fixture(3);
        let a = verified(&f.registry, "a", "USA", 20);
        f.circle.join(&a, &f.evaluator, now()).unwrap();
        assert_eq!(
            f.circle.contribute(&a, 0, now()),
            Err(CircleError::CircleNotActive {
                phase: CirclePhase::Open
            })
        );
    }

    #[test]
    fn test_advance_requires_all_contributions() {
        let (mut f, s) = full_circle();
        f.circle.contribute(&s[0], 0, now()).unwrap();
        assert_eq!(
            f.circle.advance_period(now()),
            Err(CircleError::PeriodNotReady { missing: 2 })
        );
        assert_eq!(f.circle.phase(), CirclePhase::Active);
        assert_eq!(f.circle.current_period(), 0);
    }

    #[test]
    fn test_full_rotation_pays_each_member_once() {
        let (mut f, s) = full_circle();
        let mut recipients = Vec::new();
        for period in 0..3u32 {
            for m in &s {
                f.circle.contribute(m, period, now()).unwrap();
            }
            assert_eq!(f.circle.phase(), CirclePhase::Rotating);
            let payout = f.circle.advance_period(now()).unwrap();
            assert_eq!(payout.amount.to_string(), "300.00");
            recipients.push(payout.recipient);
            assert_eq!(f.circle.current_period(), period + 1);
            assert!(f.circle.contributions().is_empty());
        }
        assert_eq!(recipients, s);
        assert_eq!(f.circle.phase(), CirclePhase::Completed);
        assert_eq!(f.circle.payouts().len(), 3);
        assert!(!f.circle.summary().is_active);
        assert!(matches!(
            f.circle.advance_period(now()),
            Err(CircleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_stale_instruction_rejected() {
        let (mut f, s) = full_circle();
        for m in &s {
            f.circle.contribute(m, 0, now()).unwrap();
        }
        let mut instruction = f.circle.prepare_payout().unwrap();
        assert!(!instruction.completes_circle);
        instruction.period_index = 5;
        let err = f.circle.apply_payout(&instruction, now()).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert_eq!(f.circle.current_period(), 0);
        assert_eq!(f.circle.phase(), CirclePhase::Rotating);
    }

    #[test]
    fn test_cancel_rules() {
        let mut open = fixture(3);
        open.circle.cancel("organiser request", now()).unwrap();
        assert_eq!(open.circle.phase(), CirclePhase::Cancelled);

        let (mut f, s) = full_circle();
        for m in &s {
            f.circle.contribute(m, 0, now()).unwrap();
        }
        assert!(matches!(
            f.circle.cancel("x", now()),
            Err(CircleError::InvalidTransition { .. })
        ));
        f.circle.advance_period(now()).unwrap();
        assert_eq!(
            f.circle.cancel("x", now()),
            Err(CircleError::CannotCancelAfterPayout { payouts: 1 })
        );
        assert_eq!(f.circle.phase(), CirclePhase::Active);
    }

    #[test]
    fn test_summary_and_snapshot_serialization() {
        let (f, _) = full_circle();
        let summary = f.circle.summary();
        assert_eq!(summary.current_members, 3);
        assert!(summary.is_active);
        let v = serde_json::to_value(&f.circle).unwrap();
        assert_eq!(v["phase"], "Active");
        assert_eq!(v["currentPeriodIndex"], 0);
        assert_eq!(v["members"].as_array().map(|m| m.len()), Some(3));
        assert_eq!(v["payoutOrder"][0], "a");
    }
}
