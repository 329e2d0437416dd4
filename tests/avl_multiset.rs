use std::collections::BTreeMap;

use proptest::prelude::*;
use rank_tree::AvlMultiset;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

/// Generates keys in a range narrow enough to force duplicates.
fn key_strategy() -> impl Strategy<Value = i64> {
    -200i64..200
}

/// Expands a `key -> occurrence count` model into its sorted key sequence.
fn expand(model: &BTreeMap<i64, usize>) -> Vec<i64> {
    model.iter().flat_map(|(&key, &n)| std::iter::repeat_n(key, n)).collect()
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum SetOp {
    Insert(i64),
    Remove(i64),
    Contains(i64),
    Count(i64),
    First,
    Last,
}

fn set_op_strategy() -> impl Strategy<Value = SetOp> {
    prop_oneof![
        5 => key_strategy().prop_map(SetOp::Insert),
        3 => key_strategy().prop_map(SetOp::Remove),
        2 => key_strategy().prop_map(SetOp::Contains),
        2 => key_strategy().prop_map(SetOp::Count),
        1 => Just(SetOp::First),
        1 => Just(SetOp::Last),
    ]
}

// ─── Model-based CRUD ────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random op sequence against a counted `BTreeMap` model and
    /// asserts identical observable results at every step.
    #[test]
    fn ops_match_multiset_model(ops in proptest::collection::vec(set_op_strategy(), TEST_SIZE)) {
        let mut set: AvlMultiset<i64> = AvlMultiset::new();
        let mut model: BTreeMap<i64, usize> = BTreeMap::new();
        let mut model_len = 0usize;

        for op in &ops {
            match op {
                SetOp::Insert(key) => {
                    set.insert(*key);
                    *model.entry(*key).or_insert(0) += 1;
                    model_len += 1;
                }
                SetOp::Remove(key) => {
                    let present = match model.get_mut(key) {
                        Some(n) => {
                            *n -= 1;
                            if *n == 0 {
                                model.remove(key);
                            }
                            model_len -= 1;
                            true
                        }
                        None => false,
                    };
                    prop_assert_eq!(set.remove(key), present, "remove({})", key);
                }
                SetOp::Contains(key) => {
                    prop_assert_eq!(set.contains(key), model.contains_key(key), "contains({})", key);
                }
                SetOp::Count(key) => {
                    prop_assert_eq!(set.count(key), model.get(key).copied().unwrap_or(0), "count({})", key);
                }
                SetOp::First => {
                    prop_assert_eq!(set.first(), model.keys().next(), "first()");
                }
                SetOp::Last => {
                    prop_assert_eq!(set.last(), model.keys().next_back(), "last()");
                }
            }
            prop_assert_eq!(set.len(), model_len, "len mismatch after {:?}", op);
            prop_assert_eq!(set.is_empty(), model_len == 0);
        }

        let inorder: Vec<i64> = set.iter().copied().collect();
        prop_assert_eq!(inorder, expand(&model), "in-order traversal diverged from model");
    }

    /// `kth_largest(k)` must agree with the descending sort for every valid
    /// rank, and miss for every invalid one.
    #[test]
    fn kth_largest_matches_descending_sort(keys in proptest::collection::vec(key_strategy(), 0..500)) {
        let set: AvlMultiset<i64> = keys.iter().copied().collect();
        let mut sorted = keys;
        sorted.sort_unstable_by(|a, b| b.cmp(a));

        prop_assert_eq!(set.kth_largest(0), None);
        for (i, expected) in sorted.iter().enumerate() {
            prop_assert_eq!(set.kth_largest(i + 1), Some(expected), "rank {}", i + 1);
        }
        prop_assert_eq!(set.kth_largest(sorted.len() + 1), None);
    }

    /// `range_query(a, b)` must equal the in-order traversal filtered to
    /// `[a, b]`, for arbitrary (possibly inverted) bounds.
    #[test]
    fn range_query_matches_filtered_inorder(
        keys in proptest::collection::vec(key_strategy(), 0..500),
        a in key_strategy(),
        b in key_strategy(),
    ) {
        let set: AvlMultiset<i64> = keys.into_iter().collect();
        let got: Vec<i64> = set.range_query(a, b).copied().collect();
        let expected: Vec<i64> = set.iter().copied().filter(|&k| a <= k && k <= b).collect();
        prop_assert_eq!(got, expected);
    }

    /// Inserting a fresh key and removing it again restores the previous
    /// in-order sequence exactly.
    #[test]
    fn insert_remove_round_trip(
        keys in proptest::collection::vec(key_strategy(), 0..500),
        probe in key_strategy(),
    ) {
        let mut set: AvlMultiset<i64> = keys.into_iter().collect();
        let before: Vec<i64> = set.iter().copied().collect();

        set.insert(probe);
        prop_assert_eq!(set.len(), before.len() + 1);
        prop_assert!(set.remove(&probe));

        let after: Vec<i64> = set.iter().copied().collect();
        prop_assert_eq!(after, before);
    }

    /// After insert-only workloads the height must respect the AVL bound.
    #[test]
    fn height_stays_within_the_avl_bound(keys in proptest::collection::vec(any::<i64>(), 1..TEST_SIZE)) {
        let set: AvlMultiset<i64> = keys.iter().copied().collect();
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bound = (1.44 * ((set.len() + 2) as f64).log2()).ceil() as usize;
        prop_assert!(
            set.height() <= bound,
            "height {} exceeds the AVL bound {} for {} keys", set.height(), bound, set.len()
        );
    }

    /// Owning iteration drains every key in ascending order.
    #[test]
    fn into_iter_drains_in_order(keys in proptest::collection::vec(key_strategy(), 0..500)) {
        let set: AvlMultiset<i64> = keys.iter().copied().collect();
        let drained: Vec<i64> = set.into_iter().collect();
        let mut sorted = keys;
        sorted.sort_unstable();
        prop_assert_eq!(drained, sorted);
    }
}

// ─── Directed cases ──────────────────────────────────────────────────────────

#[test]
fn empty_set_answers_every_query_negatively() {
    let set: AvlMultiset<i64> = AvlMultiset::new();
    assert_eq!(set.len(), 0);
    assert!(set.is_empty());
    assert_eq!(set.height(), 0);
    assert_eq!(set.get(&1), None);
    assert_eq!(set.kth_largest(1), None);
    assert_eq!(set.first(), None);
    assert_eq!(set.last(), None);
    assert_eq!(set.iter().next(), None);
    assert_eq!(set.range_query(0, 10).next(), None);
}

#[test]
fn range_query_with_inverted_bounds_is_empty() {
    let set: AvlMultiset<i64> = [1, 2, 3].into();
    assert_eq!(set.range_query(3, 1).next(), None);
}

#[test]
fn range_query_bounds_are_inclusive() {
    let set: AvlMultiset<i64> = [1, 2, 3, 4, 5].into();
    let hits: Vec<i64> = set.range_query(2, 4).copied().collect();
    assert_eq!(hits, [2, 3, 4]);
    let exact: Vec<i64> = set.range_query(3, 3).copied().collect();
    assert_eq!(exact, [3]);
}

#[test]
fn clear_resets_but_keeps_working() {
    let mut set: AvlMultiset<i64> = (0..100).collect();
    set.clear();
    assert!(set.is_empty());
    set.insert(42);
    assert_eq!(set.iter().copied().collect::<Vec<_>>(), [42]);
}

#[test]
fn clones_are_independent() {
    let mut original: AvlMultiset<i64> = [1, 2, 3].into();
    let copy = original.clone();
    original.remove(&2);
    assert_eq!(original.iter().copied().collect::<Vec<_>>(), [1, 3]);
    assert_eq!(copy.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
}

#[test]
fn with_capacity_reserves_node_storage() {
    let set: AvlMultiset<i64> = AvlMultiset::with_capacity(64);
    assert!(set.capacity() >= 64);
    assert!(set.is_empty());
}

#[test]
fn debug_formats_as_a_set() {
    let set: AvlMultiset<i64> = [2, 1].into();
    assert_eq!(format!("{set:?}"), "{1, 2}");
}

#[test]
fn borrowed_lookups_work_on_owned_keys() {
    let set: AvlMultiset<String> = ["pear", "apple"].map(String::from).into();
    assert!(set.contains("apple"));
    assert_eq!(set.get("pear").map(String::as_str), Some("pear"));
    assert_eq!(set.count("plum"), 0);
}
