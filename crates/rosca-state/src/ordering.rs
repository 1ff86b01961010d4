//! # Payout Ordering
//!
//! Decides, at activation, which member is paid in which period.
//!
//! - [`PayoutOrdering::JoinOrder`]: payout order equals join order.
//! - [`PayoutOrdering::SeededPermutation`]: a Fisher–Yates shuffle driven by
//!   a SHA-256 counter stream. The seed is derived from the circle id and the
//!   join-ordered member list, both public, so anyone can recompute the order.
//!   Joining early no longer guarantees an early payout.

use rosca_core::{CircleId, SubjectId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const SEED_DOMAIN: &[u8] = b"rosca-payout-order/v1";

/// Payout ordering rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoutOrdering {
    /// Members are paid in the order they joined.
    #[default]
    JoinOrder,
    /// Members are paid in a reproducible pseudo-random order.
    #[serde(rename = "seeded")]
    SeededPermutation,
}

impl PayoutOrdering {
    /// The payout order for `members` (join order) of circle `id`.
    pub fn order(&self, id: CircleId, members: &[SubjectId]) -> Vec<SubjectId> {
        let mut order = members.to_vec();
        if *self == Self::SeededPermutation {
            let mut stream = DigestStream::new(seed(id, members));
            for i in (1..order.len()).rev() {
                let j = stream.below(i as u64 + 1) as usize;
                order.swap(i, j);
            }
        }
        order
    }
}

impl std::fmt::Display for PayoutOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JoinOrder => f.write_str("join-order"),
            Self::SeededPermutation => f.write_str("seeded"),
        }
    }
}

impl std::str::FromStr for PayoutOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "join-order" | "join_order" | "join" => Ok(Self::JoinOrder),
            "seeded" | "seeded-permutation" | "random" => Ok(Self::SeededPermutation),
            other => Err(format!("unknown payout ordering {other:?}: expected join-order or seeded")),
        }
    }
}

fn seed(id: CircleId, members: &[SubjectId]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SEED_DOMAIN);
    hasher.update(id.to_be_bytes());
    for member in members {
        let bytes = member.as_str().as_bytes();
        hasher.update((bytes.len() as u32).to_be_bytes());
        hasher.update(bytes);
    }
    hasher.finalize().into()
}

/// Unbounded stream of u64 words: SHA-256(seed || counter), 4 words per block.
struct DigestStream {
    seed: [u8; 32],
    counter: u64,
    block: [u8; 32],
    offset: usize,
}

impl DigestStream {
    fn new(seed: [u8; 32]) -> Self {
        Self {
            seed,
            counter: 0,
            block: [0; 32],
            offset: 32,
        }
    }

    fn next_u64(&mut self) -> u64 {
        if self.offset == 32 {
            let mut hasher = Sha256::new();
            hasher.update(self.seed);
            hasher.update(self.counter.to_be_bytes());
            self.block = hasher.finalize().into();
            self.counter += 1;
            self.offset = 0;
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.block[self.offset..self.offset + 8]);
        self.offset += 8;
        u64::from_be_bytes(word)
    }

    /// Uniform value in `0..bound` by rejection sampling.
    fn below(&mut self, bound: u64) -> u64 {
        let zone = u64::MAX - (u64::MAX % bound);
        loop {
            let x = self.next_u64();
            if x < zone {
                return x % bound;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn members(n: usize) -> Vec<SubjectId> {
        (0..n)
            .map(|i| SubjectId::new(format!("member-{i:02}")).unwrap())
            .collect()
    }

    #[test]
    fn join_order_is_identity() {
        let m = members(5);
        assert_eq!(PayoutOrdering::JoinOrder.order(CircleId::new(1), &m), m);
    }

    #[test]
    fn seeded_is_reproducible_permutation() {
        let m = members(10);
        let a = PayoutOrdering::SeededPermutation.order(CircleId::new(7), &m);
        let b = PayoutOrdering::SeededPermutation.order(CircleId::new(7), &m);
        assert_eq!(a, b);
        let sa: BTreeSet<_> = a.iter().collect();
        let sm: BTreeSet<_> = m.iter().collect();
        assert_eq!(sa, sm);
    }

    #[test]
    fn seeded_depends_on_circle_id() {
        let m = members(12);
        let orders: BTreeSet<Vec<SubjectId>> = (1..=8)
            .map(|id| PayoutOrdering::SeededPermutation.order(CircleId::new(id), &m))
            .collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn below_stays_in_range() {
        let mut stream = DigestStream::new([3u8; 32]);
        for bound in 1..50u64 {
            assert!(stream.below(bound) < bound);
        }
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("join-order".parse::<PayoutOrdering>().unwrap(), PayoutOrdering::JoinOrder);
        assert_eq!("seeded".parse::<PayoutOrdering>().unwrap(), PayoutOrdering::SeededPermutation);
        assert!("lottery".parse::<PayoutOrdering>().is_err());
        assert_eq!(PayoutOrdering::SeededPermutation.to_string(), "seeded");
        assert_eq!(
            serde_json::to_string(&PayoutOrdering::JoinOrder).unwrap(),
            "\"join-order\""
        );
    }
}
