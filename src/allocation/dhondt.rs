//! D'Hondt (highest averages) seat distribution.
//!
//! Each round awards the next seat to the party with the largest quotient
//! `votes / (seats_won + 1)`. Quotients are compared exactly by
//! cross-multiplying in `u128`, so no floating point enters the choice.
//!
//! Ties are broken, in order, by larger raw vote total, then fewer seats won
//! so far, then `PartyId` order. With every party on zero votes this hands
//! seats out round-robin in key order.

use super::{AllocationError, AllocationResult};
use crate::model::election::{PartyId, SeatAssignments, VoteData};
use std::cmp::Ordering;

/// Distribute `seats` seats across every party in `votes`.
///
/// Every party in `votes` appears in the result, possibly with zero seats,
/// and the seat counts always sum to `seats`.
pub fn distribute(votes: &VoteData, seats: u32) -> AllocationResult<SeatAssignments> {
    let mut assigned: SeatAssignments = votes.keys().map(|id| (id.clone(), 0)).collect();

    if seats == 0 {
        return Ok(assigned);
    }
    if votes.is_empty() {
        return Err(AllocationError::EmptyPartySet { seats });
    }

    for _ in 0..seats {
        let winner =
            next_award(votes, &assigned).ok_or(AllocationError::EmptyPartySet { seats })?;
        if let Some(count) = assigned.get_mut(winner) {
            *count += 1;
        }
    }

    Ok(assigned)
}

/// Pick the party that wins the next seat.
fn next_award<'a>(votes: &'a VoteData, assigned: &SeatAssignments) -> Option<&'a PartyId> {
    let mut best: Option<(&PartyId, u64, u32)> = None;

    for (id, &v) in votes {
        let s = assigned.get(id).copied().unwrap_or(0);
        best = match best {
            None => Some((id, v, s)),
            Some((best_id, best_v, best_s)) => {
                if beats(v, s, best_v, best_s) {
                    Some((id, v, s))
                } else {
                    Some((best_id, best_v, best_s))
                }
            }
        };
    }

    best.map(|(id, _, _)| id)
}

/// Whether a challenger strictly beats the incumbent. Key order is implicit:
/// the incumbent was encountered first, so it keeps any remaining tie.
fn beats(v_a: u64, s_a: u32, v_b: u64, s_b: u32) -> bool {
    match cmp_quotients(v_a, s_a, v_b, s_b) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => match v_a.cmp(&v_b) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => s_a < s_b,
        },
    }
}

/// Compare `v_a / (s_a + 1)` against `v_b / (s_b + 1)`.
fn cmp_quotients(v_a: u64, s_a: u32, v_b: u64, s_b: u32) -> Ordering {
    let lhs = (v_a as u128) * (s_b as u128 + 1);
    let rhs = (v_b as u128) * (s_a as u128 + 1);
    lhs.cmp(&rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn votes(pairs: &[(&str, u64)]) -> VoteData {
        pairs.iter().map(|(k, v)| (PartyId::from(*k), *v)).collect()
    }

    fn seats_of(assigned: &SeatAssignments, id: &str) -> u32 {
        assigned[&PartyId::from(id)]
    }

    #[test]
    fn textbook_example() {
        let v = votes(&[("A", 100_000), ("B", 80_000), ("C", 30_000), ("D", 20_000)]);

        let assigned = distribute(&v, 8).unwrap();

        assert_eq!(seats_of(&assigned, "A"), 4);
        assert_eq!(seats_of(&assigned, "B"), 3);
        assert_eq!(seats_of(&assigned, "C"), 1);
        assert_eq!(seats_of(&assigned, "D"), 0);
    }

    #[test]
    fn zero_seats_returns_all_zero() {
        let v = votes(&[("A", 10), ("B", 3)]);
        let assigned = distribute(&v, 0).unwrap();

        assert_eq!(seats_of(&assigned, "A"), 0);
        assert_eq!(seats_of(&assigned, "B"), 0);
        assert_eq!(assigned.len(), 2);
    }

    #[test]
    fn zero_seats_with_no_parties_is_empty() {
        assert!(distribute(&VoteData::new(), 0).unwrap().is_empty());
    }

    #[test]
    fn no_parties_is_an_error() {
        assert_eq!(
            distribute(&VoteData::new(), 3),
            Err(AllocationError::EmptyPartySet { seats: 3 })
        );
    }

    #[test]
    fn zero_vote_party_gets_nothing_when_others_have_votes() {
        let v = votes(&[("A", 0), ("B", 1)]);
        let assigned = distribute(&v, 5).unwrap();

        assert_eq!(seats_of(&assigned, "A"), 0);
        assert_eq!(seats_of(&assigned, "B"), 5);
    }

    #[test]
    fn all_zero_votes_split_round_robin() {
        let v = votes(&[("A", 0), ("B", 0), ("C", 0)]);
        let assigned = distribute(&v, 4).unwrap();

        assert_eq!(seats_of(&assigned, "A"), 2);
        assert_eq!(seats_of(&assigned, "B"), 1);
        assert_eq!(seats_of(&assigned, "C"), 1);
    }

    #[test]
    fn equal_quotient_prefers_larger_party() {
        // After A takes the first seat, A's quotient is 100/2 = 50, equal to B's 50/1.
        let v = votes(&[("A", 100), ("B", 50)]);
        let assigned = distribute(&v, 2).unwrap();

        assert_eq!(seats_of(&assigned, "A"), 2);
        assert_eq!(seats_of(&assigned, "B"), 0);
    }

    #[test]
    fn exact_tie_goes_to_first_key() {
        let v = votes(&[("A", 10), ("B", 10)]);
        let assigned = distribute(&v, 1).unwrap();

        assert_eq!(seats_of(&assigned, "A"), 1);
        assert_eq!(seats_of(&assigned, "B"), 0);
    }

    #[test]
    fn large_vote_totals_do_not_overflow() {
        let v = votes(&[("A", u64::MAX), ("B", u64::MAX - 1)]);
        let assigned = distribute(&v, 2).unwrap();

        assert_eq!(seats_of(&assigned, "A"), 1);
        assert_eq!(seats_of(&assigned, "B"), 1);
    }

    fn arb_votes() -> impl Strategy<Value = VoteData> {
        prop::collection::btree_map("[a-h]", 0u64..10_000_000, 1..8)
            .prop_map(|m| m.into_iter().map(|(k, v)| (PartyId(k), v)).collect::<VoteData>())
    }

    proptest! {
        #[test]
        fn seat_total_matches_request(v in arb_votes(), seats in 0u32..200) {
            let assigned = distribute(&v, seats).unwrap();
            prop_assert_eq!(assigned.values().sum::<u32>(), seats);
            prop_assert_eq!(assigned.len(), v.len());
        }

        #[test]
        fn more_votes_never_means_fewer_seats(v in arb_votes(), seats in 1u32..200) {
            let assigned = distribute(&v, seats).unwrap();
            for (a, va) in &v {
                for (b, vb) in &v {
                    if va > vb {
                        prop_assert!(assigned[a] >= assigned[b]);
                    }
                }
            }
        }
    }
}
