//! Leaf-chain cursor for ordered scans.
//!
//! Once positioned on a leaf, the cursor never revisits internal nodes: it
//! follows `next` links until the chain ends or a key passes the upper bound.
//! The iterator borrows the tree, so the tree cannot change underneath it;
//! a fresh scan re-descends from the root.

use super::node::Node;
use crate::arena::NodeArena;
use crate::types::NodeId;
use std::iter::FusedIterator;

/// Ascending iterator over a [`BPlusTree`](super::BPlusTree), optionally
/// bounded above (inclusive)
pub struct Iter<'a, K, V> {
    nodes: &'a NodeArena<Node<K, V>>,
    /// Leaf holding the next entry, `None` once exhausted
    leaf: Option<NodeId>,
    /// Index of the next entry within `leaf`
    index: usize,
    /// Inclusive upper bound
    upper: Option<K>,
}

impl<'a, K: Ord, V> Iter<'a, K, V> {
    pub(crate) fn new(
        nodes: &'a NodeArena<Node<K, V>>,
        leaf: NodeId,
        index: usize,
        upper: Option<K>,
    ) -> Self {
        Self {
            nodes,
            leaf: Some(leaf),
            index,
            upper,
        }
    }

    pub(crate) fn empty(nodes: &'a NodeArena<Node<K, V>>) -> Self {
        Self {
            nodes,
            leaf: None,
            index: 0,
            upper: None,
        }
    }
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        loop {
            let leaf = nodes[self.leaf?].as_leaf()?;

            if self.index < leaf.keys.len() {
                let key = &leaf.keys[self.index];
                if self.upper.as_ref().is_some_and(|hi| key > hi) {
                    self.leaf = None;
                    return None;
                }
                let value = &leaf.values[self.index];
                self.index += 1;
                return Some((key, value));
            }

            self.leaf = leaf.next;
            self.index = 0;
        }
    }
}

impl<K: Ord, V> FusedIterator for Iter<'_, K, V> {}

#[cfg(test)]
mod tests {
    use crate::bplus::BPlusTree;

    #[test]
    fn test_cursor_crosses_leaves() {
        let mut tree = BPlusTree::new(3).unwrap();
        for k in 0..20 {
            tree.insert(k, k * 100);
        }
        assert!(tree.stats().leaf_count > 1);

        let pairs: Vec<(i32, i32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, (0..20).map(|k| (k, k * 100)).collect::<Vec<_>>());
    }

    #[test]
    fn test_cursor_is_fused() {
        let mut tree = BPlusTree::new(3).unwrap();
        tree.insert(1, "a");
        tree.insert(2, "b");
        let mut range = tree.range(&1, &1);
        assert_eq!(range.next(), Some((&1, &"a")));
        assert_eq!(range.next(), None);
        assert_eq!(range.next(), None);
    }
}
