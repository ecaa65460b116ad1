//! Insertion and split behavior at fanout 4, the configuration the split
//! arithmetic is easiest to reason about by hand.

use ordered_index::{IndexError, OrderedIndex};

#[test]
fn fanout_below_minimum_is_rejected() {
    for bad in [0usize, 1, 2] {
        let res = OrderedIndex::<i32, i32>::new(bad);
        assert!(
            matches!(res, Err(IndexError::InvalidFanout(_))),
            "fanout {} should be rejected",
            bad
        );
    }
    assert!(OrderedIndex::<i32, i32>::new(3).is_ok());
}

#[test]
fn first_insert_creates_leaf_root() {
    let mut tree: OrderedIndex<i32, &str> = OrderedIndex::new(4).unwrap();
    assert_eq!(tree.height(), 0);
    tree.insert(7, "seven").unwrap();
    assert_eq!(tree.height(), 1);
    assert!(tree.is_leaf_root());
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get(&7), Some(&"seven"));
}

#[test]
fn fifth_ascending_insert_splits_three_two() {
    // fanout 4: the fifth key overflows the root leaf. The ordered buffer
    // of 5 entries redistributes ceil(5/2) = 3 left and 2 right, and the
    // right leaf's first key is promoted into a fresh root.
    let mut tree: OrderedIndex<i32, i32> = OrderedIndex::new(4).unwrap();
    for k in 1..=4 {
        tree.insert(k, k * 10).unwrap();
        assert!(tree.is_leaf_root(), "no split before the fifth insert");
    }
    tree.insert(5, 50).unwrap();

    assert_eq!(tree.height(), 2);
    assert_eq!(tree.leaf_count(), 2);
    assert!(!tree.is_leaf_root());
    assert_eq!(tree.len(), 5);

    assert_eq!(tree.leaf_sizes(), vec![3, 2]);
    let keys: Vec<i32> = tree.keys().copied().collect();
    assert_eq!(keys, vec![1, 2, 3, 4, 5]);
    tree.check_invariants_detailed().unwrap();
}

#[test]
fn vehicle_key_scenario() {
    // String keys, fanout 4: five registrations force one split, and exact
    // lookups keep working across the two leaves.
    let mut tree: OrderedIndex<String, u32> = OrderedIndex::new(4).unwrap();
    for (i, key) in ["A1", "B2", "C3", "D4", "E5"].iter().enumerate() {
        tree.insert(key.to_string(), i as u32).unwrap();
    }

    assert_eq!(tree.height(), 2);
    assert_eq!(tree.leaf_count(), 2);
    let chained: Vec<&str> = tree.keys().map(|k| k.as_str()).collect();
    assert_eq!(chained, vec!["A1", "B2", "C3", "D4", "E5"]);

    assert_eq!(tree.get(&"C3".to_string()), Some(&2));
    assert_eq!(tree.get(&"Z9".to_string()), None);
    assert!(matches!(
        tree.get_item(&"Z9".to_string()),
        Err(IndexError::KeyNotFound)
    ));
    tree.check_invariants_detailed().unwrap();
}

#[test]
fn duplicate_key_overwrites_and_returns_old_value() {
    let mut tree: OrderedIndex<&str, i32> = OrderedIndex::new(4).unwrap();
    assert_eq!(tree.insert("KA-01", 1).unwrap(), None);
    assert_eq!(tree.insert("KA-02", 2).unwrap(), None);
    assert_eq!(tree.insert("KA-01", 100).unwrap(), Some(1));
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.get(&"KA-01"), Some(&100));
    tree.check_invariants_detailed().unwrap();
}

#[test]
fn get_mut_updates_in_place() {
    let mut tree: OrderedIndex<i32, i32> = OrderedIndex::new(4).unwrap();
    for k in 0..20 {
        tree.insert(k, 0).unwrap();
    }
    *tree.get_mut(&13).unwrap() = 99;
    assert_eq!(tree.get(&13), Some(&99));
    assert_eq!(tree.get(&12), Some(&0));
}

#[test]
fn ascending_inserts_grow_multiple_levels() {
    let mut tree: OrderedIndex<i32, i32> = OrderedIndex::new(4).unwrap();
    for k in 0..200 {
        tree.insert(k, k).unwrap();
        tree.check_invariants_detailed().unwrap();
    }
    assert_eq!(tree.len(), 200);
    assert!(tree.height() >= 3, "200 keys at fanout 4 need several levels");
    let keys: Vec<i32> = tree.keys().copied().collect();
    assert_eq!(keys, (0..200).collect::<Vec<_>>());
}

#[test]
fn descending_inserts_split_at_the_left_edge() {
    let mut tree: OrderedIndex<i32, i32> = OrderedIndex::new(4).unwrap();
    for k in (0..200).rev() {
        tree.insert(k, -k).unwrap();
        tree.check_invariants_detailed().unwrap();
    }
    assert_eq!(tree.len(), 200);
    let keys: Vec<i32> = tree.keys().copied().collect();
    assert_eq!(keys, (0..200).collect::<Vec<_>>());
    for k in 0..200 {
        assert_eq!(tree.get(&k), Some(&-k));
    }
}

#[test]
fn interleaved_inserts_route_by_strictly_greater_separator() {
    // Inserting outward from the middle lands keys on both sides of every
    // separator, including keys equal to a separator (which route right).
    let mut tree: OrderedIndex<i32, i32> = OrderedIndex::new(4).unwrap();
    let mut keys = Vec::new();
    for i in 0..60 {
        let k = if i % 2 == 0 { 500 + i } else { 500 - i };
        keys.push(k);
        tree.insert(k, k).unwrap();
        tree.check_invariants_detailed().unwrap();
    }
    keys.sort_unstable();
    let walked: Vec<i32> = tree.keys().copied().collect();
    assert_eq!(walked, keys);
}

#[test]
fn smallest_fanout_still_splits_correctly() {
    let mut tree: OrderedIndex<u32, u32> = OrderedIndex::new(3).unwrap();
    for k in 0..100 {
        tree.insert(k, k + 1).unwrap();
        tree.check_invariants_detailed().unwrap();
    }
    assert_eq!(tree.len(), 100);
    for k in 0..100 {
        assert_eq!(tree.get(&k), Some(&(k + 1)));
    }
    assert_eq!(tree.get(&100), None);
}
