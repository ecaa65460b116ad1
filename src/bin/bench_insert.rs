use std::collections::BTreeMap;
use std::env;
use std::hint::black_box;
use std::time::Instant;

use ordered_index::OrderedIndex;

fn parse_arg<T: std::str::FromStr>(i: usize, default: T) -> T {
    env::args()
        .nth(i)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

// Fibonacci hashing to scramble insertion order without a rand dependency.
fn generate_dataset(n: usize) -> Vec<(u64, u64)> {
    (0..n as u64)
        .map(|i| (i.wrapping_mul(0x9E3779B97F4A7C15), i))
        .collect()
}

fn main() {
    // Usage: bench_insert [n=1000000] [fanout=16]
    let n: usize = parse_arg(1, 1_000_000);
    let fanout: usize = parse_arg(2, 16);

    let dataset = generate_dataset(n);
    let lookup_keys: Vec<u64> = dataset.iter().map(|(k, _)| *k).collect();

    let mut tree: OrderedIndex<u64, u64> = OrderedIndex::new(fanout).unwrap();
    let t0 = Instant::now();
    for &(k, v) in &dataset {
        tree.insert(k, v).unwrap();
    }
    let tree_insert = t0.elapsed();
    let t0 = Instant::now();
    for k in &lookup_keys {
        black_box(tree.get(k));
    }
    let tree_get = t0.elapsed();
    let t0 = Instant::now();
    let walked = tree.items().count();
    let tree_scan = t0.elapsed();
    assert_eq!(walked, n);

    let mut map = BTreeMap::new();
    let t0 = Instant::now();
    for &(k, v) in &dataset {
        map.insert(k, v);
    }
    let map_insert = t0.elapsed();
    let t0 = Instant::now();
    for k in &lookup_keys {
        black_box(map.get(k));
    }
    let map_get = t0.elapsed();

    println!("items: {}  |  fanout: {}", n, fanout);
    println!(
        "ordered-index  insert: {:?}  get: {:?}  scan: {:?}",
        tree_insert, tree_get, tree_scan
    );
    println!("std BTreeMap   insert: {:?}  get: {:?}", map_insert, map_get);
}
