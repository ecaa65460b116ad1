//! Differential tests against `std::collections::BTreeMap`, plus property
//! tests over random insertion sequences and fanouts.

use std::collections::BTreeMap;

use proptest::prelude::*;

use ordered_index::OrderedIndex;

fn populate(fanout: usize, data: &[i32]) -> (OrderedIndex<i32, i32>, BTreeMap<i32, i32>) {
    let mut tree = OrderedIndex::new(fanout).unwrap();
    let mut map = BTreeMap::new();
    for &k in data {
        tree.insert(k, k * 10).unwrap();
        map.insert(k, k * 10);
    }
    (tree, map)
}

#[test]
fn full_scan_matches_btreemap() {
    for &fanout in &[3usize, 4, 5, 8] {
        let data: Vec<i32> = (0..100).map(|i| (i * 37) % 100).collect();
        let (tree, map) = populate(fanout, &data);
        let got: Vec<_> = tree.items().map(|(k, v)| (*k, *v)).collect();
        let exp: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, exp, "fanout = {}", fanout);
    }
}

#[test]
fn reverse_scan_matches_btreemap() {
    let data: Vec<i32> = (0..200).map(|i| (i * 73) % 211).collect();
    let (tree, map) = populate(4, &data);
    let got: Vec<_> = tree.items_rev().map(|(k, v)| (*k, *v)).collect();
    let exp: Vec<_> = map.iter().rev().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(got, exp);
}

#[test]
fn point_lookups_match_btreemap() {
    let data: Vec<i32> = (0..150).map(|i| i * 3).collect();
    let (tree, map) = populate(5, &data);
    for k in -10..500 {
        assert_eq!(tree.get(&k), map.get(&k), "key = {}", k);
        assert_eq!(tree.contains_key(&k), map.contains_key(&k));
    }
}

proptest! {
    /// Insertion sequences of arbitrary length, key distribution, and
    /// fanout agree with the model map on return values, ordering,
    /// completeness, lookups, and backward/forward symmetry.
    #[test]
    fn random_insertions_match_the_model(
        fanout in 3usize..10,
        entries in proptest::collection::vec((0u16..500, any::<u32>()), 0..400),
    ) {
        let mut tree: OrderedIndex<u16, u32> = OrderedIndex::new(fanout).unwrap();
        let mut model: BTreeMap<u16, u32> = BTreeMap::new();

        for &(k, v) in &entries {
            let expected = model.insert(k, v);
            let got = tree.insert(k, v).unwrap();
            prop_assert_eq!(got, expected);
        }

        prop_assert_eq!(tree.len(), model.len());
        let report = tree.check_invariants_detailed();
        prop_assert!(report.is_ok(), "invalid tree: {:?}", report);

        let forward: Vec<(u16, u32)> = tree.items().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&forward, &expected);

        let mut reversed = forward;
        reversed.reverse();
        let backward: Vec<(u16, u32)> = tree.items_rev().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(backward, reversed);

        for k in 0u16..500 {
            prop_assert_eq!(tree.get(&k), model.get(&k));
        }
    }

    /// Distinct-key sequences are fully enumerated: N inserts, N entries,
    /// each key visited exactly once.
    #[test]
    fn distinct_keys_are_all_visited_once(
        fanout in 3usize..8,
        mut keys in proptest::collection::hash_set(any::<i32>(), 0..300),
    ) {
        let mut tree: OrderedIndex<i32, ()> = OrderedIndex::new(fanout).unwrap();
        let n = keys.len();
        for &k in keys.iter() {
            prop_assert_eq!(tree.insert(k, ()).unwrap(), None);
        }
        prop_assert_eq!(tree.len(), n);

        let walked: Vec<i32> = tree.keys().copied().collect();
        prop_assert_eq!(walked.len(), n);
        for window in walked.windows(2) {
            prop_assert!(window[0] < window[1], "strictly ascending, no repeats");
        }
        for k in &walked {
            prop_assert!(keys.remove(k));
        }
        prop_assert!(keys.is_empty());
    }
}
