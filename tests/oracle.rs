//! Randomized operation sequences checked against `std::collections` oracles.
//!
//! Every step is followed by a full `validate()`, so a broken split, borrow
//! or merge is caught at the operation that caused it.

use ordtree::{BPlusTree, BTree, LinearProbingMap, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};

const STEPS: usize = 4_000;
const KEY_SPACE: u32 = 600;

#[test]
fn test_btree_matches_btreemap() -> Result<()> {
    for order in [2, 3, 5] {
        let mut rng = StdRng::seed_from_u64(0xB7 + order as u64);
        let mut tree = BTree::new(order)?;
        let mut oracle = BTreeMap::new();

        for step in 0..STEPS {
            let key = rng.gen_range(0..KEY_SPACE);
            if rng.gen_bool(0.6) {
                let value = rng.gen::<u64>();
                assert_eq!(tree.insert(key, value), oracle.insert(key, value));
            } else {
                match oracle.remove(&key) {
                    Some(expected) => assert_eq!(tree.delete(&key)?, expected),
                    None => assert!(tree.delete(&key).unwrap_err().is_not_found()),
                }
            }
            tree.validate()
                .unwrap_or_else(|e| panic!("order {order}, step {step}: {e}"));
            assert_eq!(tree.len(), oracle.len());
        }

        let pairs: Vec<(u32, u64)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u32, u64)> = oracle.into_iter().collect();
        assert_eq!(pairs, expected);
    }
    Ok(())
}

#[test]
fn test_bplus_matches_btreemap() -> Result<()> {
    for order in [2, 3, 4, 5, 8] {
        let mut rng = StdRng::seed_from_u64(0xB9 + order as u64);
        let mut tree = BPlusTree::new(order)?;
        let mut oracle = BTreeMap::new();

        for step in 0..STEPS {
            let key = rng.gen_range(0..KEY_SPACE);
            match rng.gen_range(0..10) {
                0..=5 => {
                    let value = rng.gen::<u64>();
                    assert_eq!(tree.insert(key, value), oracle.insert(key, value));
                }
                6..=8 => assert_eq!(tree.delete(&key), oracle.remove(&key)),
                _ => {
                    let high = key + rng.gen_range(0..50);
                    let got: Vec<u64> = tree.range_query(&key, &high).copied().collect();
                    let want: Vec<u64> = oracle.range(key..=high).map(|(_, v)| *v).collect();
                    assert_eq!(got, want, "range [{key}, {high}]");
                }
            }
            tree.validate()
                .unwrap_or_else(|e| panic!("order {order}, step {step}: {e}"));
            assert_eq!(tree.len(), oracle.len());
        }

        let keys: Vec<u32> = tree.keys().copied().collect();
        assert_eq!(keys, oracle.keys().copied().collect::<Vec<_>>());
    }
    Ok(())
}

#[test]
fn test_hash_matches_hashmap() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x4A5);
    let mut map = LinearProbingMap::new();
    let mut oracle = HashMap::new();

    for _ in 0..20_000 {
        let key = rng.gen_range(0..KEY_SPACE);
        if rng.gen_bool(0.5) {
            assert_eq!(map.insert(key, key * 2), oracle.insert(key, key * 2));
        } else {
            match oracle.remove(&key) {
                Some(expected) => assert_eq!(map.delete(&key)?, expected),
                None => assert!(map.delete(&key).is_err()),
            }
        }
        assert_eq!(map.len(), oracle.len());
    }

    for key in 0..KEY_SPACE {
        assert_eq!(map.get(&key), oracle.get(&key));
    }
    assert_eq!(map.iter().count(), oracle.len());
    Ok(())
}

#[test]
fn test_arena_slots_are_recycled() -> Result<()> {
    let mut tree = BPlusTree::new(3)?;
    for round in 0..5 {
        for k in 0..200 {
            tree.insert(k, round);
        }
        let peak = tree.stats().node_count;
        for k in 0..200 {
            tree.delete(&k);
        }
        tree.validate()?;
        assert_eq!(tree.stats().node_count, 1);
        assert!(peak > 1);
    }
    Ok(())
}
