//! # Concurrent Joins and Member-Cap Properties
//!
//! Many threads race to join the same circle. The member cap, single
//! membership, and activation-exactly-once must hold regardless of
//! interleaving. A full rotation pays every member exactly once under
//! either ordering.

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use rosca_attest::{
    AttestationResult, DisclosedAttributes, DocumentType, VerificationDetails,
};
use rosca_core::{Amount, CountryCode, SubjectId, Timestamp};
use rosca_kyc::{EligibilityEvaluator, StalenessPolicy, VerificationRegistry};
use rosca_ledger::{CircleLedger, PayoutLog, RotationScheduler};
use rosca_state::{CirclePhase, CirclePolicyDraft, PayoutOrdering};

fn record(registry: &VerificationRegistry, name: &str) -> SubjectId {
    let subject = SubjectId::new(name).unwrap();
    let result = AttestationResult {
        subject_id: subject.clone(),
        document_type: DocumentType::Passport,
        is_valid: true,
        disclosed: DisclosedAttributes {
            nationality_code: Some(CountryCode::new("USA").unwrap()),
            age_at_verification: Some(30),
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
        verified_at: Timestamp::now(),
    };
    registry.record(&subject, result).unwrap();
    subject
}

fn setup(applicants: usize) -> (Arc<CircleLedger>, Vec<SubjectId>) {
    setup_with(applicants, PayoutOrdering::JoinOrder)
}

fn setup_with(applicants: usize, ordering: PayoutOrdering) -> (Arc<CircleLedger>, Vec<SubjectId>) {
    let registry = Arc::new(VerificationRegistry::new());
    let subjects = (0..applicants)
        .map(|i| record(&registry, &format!("applicant-{i}")))
        .collect();
    let evaluator = EligibilityEvaluator::new(registry, StalenessPolicy::NoExpiry);
    (
        Arc::new(CircleLedger::new(evaluator, ordering)),
        subjects,
    )
}

fn policy(max_members: u32) -> CirclePolicyDraft {
    CirclePolicyDraft {
        monthly_amount: Amount::parse("25").unwrap(),
        max_members,
        duration_periods: max_members,
        country_code: CountryCode::new("USA").unwrap(),
        min_age: 18,
        max_age: 100,
    }
}

/// Join every subject from its own thread; returns (successes, activations).
fn race(ledger: &Arc<CircleLedger>, id: rosca_core::CircleId, subjects: &[SubjectId]) -> (usize, usize) {
    let handles: Vec<_> = subjects
        .iter()
        .cloned()
        .map(|subject| {
            let ledger = Arc::clone(ledger);
            thread::spawn(move || ledger.join_circle(id, &subject))
        })
        .collect();

    let mut joined = 0;
    let mut activations = 0;
    for handle in handles {
        if let Ok(receipt) = handle.join().unwrap() {
            joined += 1;
            if receipt.activated {
                activations += 1;
            }
        }
    }
    (joined, activations)
}

#[test]
fn concurrent_joins_never_exceed_cap() {
    let (ledger, subjects) = setup(40);
    let id = ledger.create_circle(policy(10)).unwrap();

    let (joined, activations) = race(&ledger, id, &subjects);

    assert_eq!(joined, 10);
    assert_eq!(activations, 1);
    let circle = ledger.get_circle(id).unwrap();
    assert_eq!(circle.members().len(), 10);
    assert_eq!(circle.phase(), CirclePhase::Active);
    assert_eq!(circle.payout_order(), circle.members());
}

#[test]
fn concurrent_duplicate_joins_admit_once() {
    let (ledger, subjects) = setup(1);
    let id = ledger.create_circle(policy(5)).unwrap();
    let same = vec![subjects[0].clone(); 16];

    let (joined, activations) = race(&ledger, id, &same);

    assert_eq!(joined, 1);
    assert_eq!(activations, 0);
    assert_eq!(ledger.get_circle(id).unwrap().members().len(), 1);
}

#[test]
fn concurrent_contributions_complete_period_once() {
    let (ledger, subjects) = setup(8);
    let id = ledger.create_circle(policy(8)).unwrap();
    for s in &subjects {
        ledger.join_circle(id, s).unwrap();
    }

    let handles: Vec<_> = subjects
        .iter()
        .cloned()
        .map(|subject| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.record_contribution(id, &subject, 0).unwrap())
        })
        .collect();
    let completions = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|receipt| receipt.period_complete)
        .count();

    assert_eq!(completions, 1);
    assert_eq!(ledger.get_circle(id).unwrap().phase(), CirclePhase::Rotating);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn members_never_exceed_max(max_members in 2u32..=12, applicants in 0usize..30) {
        let (ledger, subjects) = setup(applicants);
        let id = ledger.create_circle(policy(max_members)).unwrap();

        let mut activations = 0;
        for s in &subjects {
            if let Ok(receipt) = ledger.join_circle(id, s) {
                if receipt.activated {
                    activations += 1;
                }
            }
        }

        let circle = ledger.get_circle(id).unwrap();
        let expected = applicants.min(max_members as usize);
        prop_assert_eq!(circle.members().len(), expected);
        prop_assert!(circle.members().len() <= max_members as usize);
        let full = expected == max_members as usize;
        prop_assert_eq!(activations, usize::from(full));
        prop_assert_eq!(circle.phase() == CirclePhase::Active, full);
    }

    #[test]
    fn full_rotation_pays_each_member_once(
        members in 2u32..=12,
        seeded in any::<bool>(),
    ) {
        let ordering = if seeded {
            PayoutOrdering::SeededPermutation
        } else {
            PayoutOrdering::JoinOrder
        };
        let (ledger, subjects) = setup_with(members as usize, ordering);
        let scheduler = RotationScheduler::new(Arc::clone(&ledger), Arc::new(PayoutLog::new()));
        let id = ledger.create_circle(policy(members)).unwrap();
        for s in &subjects {
            ledger.join_circle(id, s).unwrap();
        }

        let mut recipients = Vec::new();
        for period in 0..members {
            for s in &subjects {
                ledger.record_contribution(id, s, period).unwrap();
            }
            recipients.push(scheduler.advance_period(id).unwrap().recipient);
        }

        let circle = ledger.get_circle(id).unwrap();
        prop_assert_eq!(circle.phase(), CirclePhase::Completed);
        prop_assert_eq!(circle.payouts().len(), members as usize);
        prop_assert_eq!(recipients.as_slice(), circle.payout_order());
        let mut paid = recipients;
        paid.sort();
        let mut expected = circle.members().to_vec();
        expected.sort();
        prop_assert_eq!(paid, expected);
    }
}
