//! Leaf-chain traversal: forward order, backward symmetry, laziness.

use ordered_index::OrderedIndex;

fn build(fanout: usize, n: i32) -> OrderedIndex<i32, i32> {
    let mut tree = OrderedIndex::new(fanout).unwrap();
    for k in 0..n {
        tree.insert(k, k * 2).unwrap();
    }
    tree
}

#[test]
fn empty_tree_yields_nothing() {
    let tree: OrderedIndex<i32, i32> = OrderedIndex::new(4).unwrap();
    assert_eq!(tree.items().count(), 0);
    assert_eq!(tree.items_rev().count(), 0);
    assert_eq!(tree.first(), None);
    assert_eq!(tree.last(), None);
}

#[test]
fn forward_walk_is_ascending_across_leaf_boundaries() {
    let tree = build(4, 137);
    let keys: Vec<i32> = tree.items().map(|(k, _)| *k).collect();
    assert_eq!(keys, (0..137).collect::<Vec<_>>());
    for window in keys.windows(2) {
        assert!(window[0] < window[1]);
    }
}

#[test]
fn backward_walk_is_exact_reverse_of_forward() {
    for n in [0, 1, 4, 5, 23, 137] {
        let tree = build(4, n);
        let mut forward: Vec<(i32, i32)> = tree.items().map(|(k, v)| (*k, *v)).collect();
        let backward: Vec<(i32, i32)> = tree.items_rev().map(|(k, v)| (*k, *v)).collect();
        forward.reverse();
        assert_eq!(backward, forward, "n = {}", n);
    }
}

#[test]
fn traversal_is_restartable() {
    let tree = build(5, 60);
    let first_pass: Vec<i32> = tree.items().map(|(k, _)| *k).collect();
    let second_pass: Vec<i32> = tree.items().map(|(k, _)| *k).collect();
    assert_eq!(first_pass, second_pass);
}

#[test]
fn iterator_reports_exact_size() {
    let tree = build(4, 42);
    let mut it = tree.items();
    assert_eq!(it.len(), 42);
    it.next();
    it.next_back();
    assert_eq!(it.len(), 40);
}

#[test]
fn front_and_back_cursors_meet_without_overlap() {
    let tree = build(4, 31);
    let mut it = tree.items();
    let mut seen = Vec::new();
    loop {
        match it.next() {
            Some((k, _)) => seen.push(*k),
            None => break,
        }
        if let Some((k, _)) = it.next_back() {
            seen.push(*k);
        }
    }
    assert_eq!(seen.len(), 31);
    seen.sort_unstable();
    assert_eq!(seen, (0..31).collect::<Vec<_>>());
}

#[test]
fn keys_and_values_follow_the_same_order() {
    let tree = build(4, 25);
    let keys: Vec<i32> = tree.keys().copied().collect();
    let values: Vec<i32> = tree.values().copied().collect();
    assert_eq!(keys, (0..25).collect::<Vec<_>>());
    assert_eq!(values, (0..25).map(|k| k * 2).collect::<Vec<_>>());
}

#[test]
fn first_and_last_track_the_chain_ends() {
    let mut tree: OrderedIndex<i32, &str> = OrderedIndex::new(4).unwrap();
    tree.insert(50, "mid").unwrap();
    assert_eq!(tree.first(), Some((&50, &"mid")));
    assert_eq!(tree.last(), Some((&50, &"mid")));
    tree.insert(10, "low").unwrap();
    tree.insert(90, "high").unwrap();
    assert_eq!(tree.first(), Some((&10, &"low")));
    assert_eq!(tree.last(), Some((&90, &"high")));
}

#[test]
fn single_leaf_tree_iterates_both_ways() {
    let tree = build(8, 5);
    assert!(tree.is_leaf_root());
    let forward: Vec<i32> = tree.items().map(|(k, _)| *k).collect();
    let backward: Vec<i32> = tree.items_rev().map(|(k, _)| *k).collect();
    assert_eq!(forward, vec![0, 1, 2, 3, 4]);
    assert_eq!(backward, vec![4, 3, 2, 1, 0]);
}
