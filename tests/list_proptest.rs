//! Property-based tests: the list against a naive sorted-Vec model.

use proptest::prelude::*;
use skiprank::{InsertError, RankedSkipList};

// =============================================================================
// Test helpers
// =============================================================================

/// A model entry: quarter-steps for the score (exactly representable as f64)
/// and a small member id. Small spaces force score ties, duplicate inserts,
/// and removals that actually hit.
type Pair = (i8, u8);

fn score(q: i8) -> f64 {
    q as f64 * 0.25
}

fn member(id: u8) -> String {
    // Zero-padded so lexicographic member order equals numeric id order,
    // making (q, id) tuple order the list's (score, member) order.
    format!("m{:03}", id)
}

#[derive(Clone, Debug)]
enum Op {
    Insert { q: i8, id: u8 },
    Remove { q: i8, id: u8 },
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (-16i8..16, 0u8..24).prop_map(|(q, id)| Op::Insert { q, id }),
        1 => (-16i8..16, 0u8..24).prop_map(|(q, id)| Op::Remove { q, id }),
    ]
}

/// Apply one op to both the list and the model, checking the result agrees
/// with what the model says should happen.
fn apply(list: &mut RankedSkipList, model: &mut Vec<Pair>, op: &Op) {
    match *op {
        Op::Insert { q, id } => {
            let res = list.insert(score(q), member(id));
            if model.contains(&(q, id)) {
                assert!(matches!(res, Err(InsertError::Duplicate { .. })));
            } else {
                res.unwrap();
                model.push((q, id));
                model.sort();
            }
        }
        Op::Remove { q, id } => {
            let removed = list.remove(score(q), &member(id));
            let pos = model.iter().position(|&p| p == (q, id));
            assert_eq!(removed, pos.is_some());
            if let Some(p) = pos {
                model.remove(p);
            }
        }
    }
}

fn build(ops: &[Op]) -> (RankedSkipList, Vec<Pair>) {
    let mut list = RankedSkipList::new();
    let mut model = Vec::new();
    for op in ops {
        apply(&mut list, &mut model, op);
    }
    (list, model)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Level-0 traversal yields exactly the model's sorted contents, in both
    /// directions, and len agrees.
    #[test]
    fn traversal_matches_model(ops in prop::collection::vec(arbitrary_op(), 1..120)) {
        let (list, model) = build(&ops);

        prop_assert_eq!(list.len(), model.len() as u64);

        let got: Vec<Pair> = list
            .iter()
            .map(|e| ((e.score * 4.0) as i8, e.member[1..].parse::<u8>().unwrap()))
            .collect();
        prop_assert_eq!(&got, &model);

        let mut rev: Vec<Pair> = list
            .iter_rev()
            .map(|e| ((e.score * 4.0) as i8, e.member[1..].parse::<u8>().unwrap()))
            .collect();
        rev.reverse();
        prop_assert_eq!(&rev, &model);
    }

    /// rank() computed from span sums equals the position a linear scan of
    /// the model finds, and entry_at_rank() inverts it.
    #[test]
    fn rank_agrees_with_linear_position(ops in prop::collection::vec(arbitrary_op(), 1..120)) {
        let (list, model) = build(&ops);

        for (i, &(q, id)) in model.iter().enumerate() {
            let k = i as u64 + 1;
            prop_assert_eq!(list.rank(score(q), &member(id)), Some(k));
            let e = list.entry_at_rank(k).unwrap();
            prop_assert_eq!(e.score, score(q));
            prop_assert_eq!(&e.member, &member(id));
        }
        prop_assert_eq!(list.entry_at_rank(0), None);
        prop_assert_eq!(list.entry_at_rank(model.len() as u64 + 1), None);
        // A pair not in the model has no rank.
        prop_assert_eq!(list.rank(1000.0, "absent"), None);
    }

    /// range_by_rank equals the model slice over the clamped window.
    #[test]
    fn range_matches_model_slice(
        ops in prop::collection::vec(arbitrary_op(), 1..120),
        lo in 0u64..40,
        hi in 0u64..40,
    ) {
        let (list, model) = build(&ops);

        let got: Vec<Pair> = list
            .range_by_rank(lo, hi)
            .map(|e| ((e.score * 4.0) as i8, e.member[1..].parse::<u8>().unwrap()))
            .collect();

        let lo = lo.max(1) as usize;
        let hi = (hi as usize).min(model.len());
        let expected: Vec<Pair> = if lo > hi {
            Vec::new()
        } else {
            model[lo - 1..hi].to_vec()
        };
        prop_assert_eq!(got, expected);
    }

    /// Removing an existing pair drops exactly that pair; its rank is gone
    /// and every survivor keeps its relative position.
    #[test]
    fn removal_is_complete_and_minimal(
        ops in prop::collection::vec(arbitrary_op(), 1..120),
        pick in 0.0..1.0f64,
    ) {
        let (mut list, mut model) = build(&ops);
        if model.is_empty() {
            return Ok(());
        }

        let victim = model[(pick * model.len() as f64) as usize % model.len()];
        prop_assert!(list.remove(score(victim.0), &member(victim.1)));
        model.retain(|&p| p != victim);

        prop_assert_eq!(list.len(), model.len() as u64);
        prop_assert_eq!(list.rank(score(victim.0), &member(victim.1)), None);
        for (i, &(q, id)) in model.iter().enumerate() {
            prop_assert_eq!(list.rank(score(q), &member(id)), Some(i as u64 + 1));
        }
    }
}
