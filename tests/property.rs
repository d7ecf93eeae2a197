//! Property-based tests for both tree engines.
//!
//! - Ordering: traversal yields strictly ascending keys
//! - Last write wins: search returns the latest value per key
//! - Delete then miss: removed keys are reported absent
//! - Range exactness: range queries match a `BTreeMap` range

use ordtree::{BPlusTree, BTree};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn key_value_pairs(max_len: usize) -> impl Strategy<Value = Vec<(i16, i32)>> {
    prop::collection::vec((any::<i16>(), any::<i32>()), 0..max_len)
}

proptest! {
    #[test]
    fn traversal_is_strictly_ascending(entries in key_value_pairs(400), order in 2usize..9) {
        let mut btree = BTree::new(order).unwrap();
        let mut bplus = BPlusTree::new(order).unwrap();
        for (k, v) in &entries {
            btree.insert(*k, *v);
            bplus.insert(*k, *v);
        }

        let bkeys: Vec<i16> = btree.keys().copied().collect();
        let pkeys: Vec<i16> = bplus.keys().copied().collect();
        prop_assert!(bkeys.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(&bkeys, &pkeys);
        prop_assert!(btree.validate().is_ok());
        prop_assert!(bplus.validate().is_ok());
    }

    #[test]
    fn search_returns_last_write(entries in key_value_pairs(400), order in 2usize..9) {
        let mut btree = BTree::new(order).unwrap();
        let mut bplus = BPlusTree::new(order).unwrap();
        let mut expected = BTreeMap::new();
        for (k, v) in &entries {
            btree.insert(*k, *v);
            bplus.insert(*k, *v);
            expected.insert(*k, *v);
        }

        for (k, v) in &expected {
            prop_assert_eq!(btree.search(k).ok(), Some(v));
            prop_assert_eq!(bplus.search(k), Some(v));
        }
        prop_assert_eq!(btree.len(), expected.len());
        prop_assert_eq!(bplus.len(), expected.len());
    }

    #[test]
    fn deleted_keys_are_absent(
        entries in key_value_pairs(300),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..150),
        order in 2usize..7,
    ) {
        let mut btree = BTree::new(order).unwrap();
        let mut bplus = BPlusTree::new(order).unwrap();
        for (k, v) in &entries {
            btree.insert(*k, *v);
            bplus.insert(*k, *v);
        }

        if !entries.is_empty() {
            for pick in &picks {
                let key = entries[pick.index(entries.len())].0;
                let _ = btree.delete(&key);
                bplus.delete(&key);
                prop_assert!(btree.search(&key).unwrap_err().is_not_found());
                prop_assert_eq!(bplus.search(&key), None);
            }
        }
        prop_assert!(btree.validate().is_ok());
        prop_assert!(bplus.validate().is_ok());
    }

    #[test]
    fn range_matches_oracle(
        keys in prop::collection::btree_set(any::<i16>(), 0..300),
        low in any::<i16>(),
        high in any::<i16>(),
        order in 2usize..9,
    ) {
        let mut tree = BPlusTree::new(order).unwrap();
        for k in &keys {
            tree.insert(*k, i32::from(*k) * 2);
        }

        let got: Vec<i32> = tree.range_query(&low, &high).copied().collect();
        let want: Vec<i32> = if low <= high {
            keys.range(low..=high).map(|k| i32::from(*k) * 2).collect()
        } else {
            Vec::new()
        };
        prop_assert_eq!(got, want);
    }
}
