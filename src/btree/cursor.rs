//! B-tree cursor for in-order iteration.
//!
//! The cursor keeps a stack of `(node_id, index)` pairs describing the path
//! from the root to the next entry. Entries live in internal nodes as well as
//! leaves, so after yielding `keys[i]` of an internal node the cursor
//! descends to the leftmost leaf of `children[i + 1]`.

use super::node::Node;
use crate::arena::NodeArena;
use crate::types::NodeId;

/// In-order iterator over a [`BTree`](super::BTree)
pub struct Iter<'a, K, V> {
    /// Node storage of the tree being walked
    nodes: &'a NodeArena<Node<K, V>>,
    /// Path to the next entry; the top holds the index of the next key
    stack: Vec<(NodeId, usize)>,
    /// Entries not yet yielded
    remaining: usize,
}

impl<'a, K: Ord, V> Iter<'a, K, V> {
    pub(crate) fn new(nodes: &'a NodeArena<Node<K, V>>, root: NodeId, len: usize) -> Self {
        let mut iter = Self {
            nodes,
            stack: Vec::new(),
            remaining: len,
        };
        iter.descend_to_leftmost(root);
        iter
    }

    /// Push the path from `id` down to its leftmost leaf
    fn descend_to_leftmost(&mut self, id: NodeId) {
        let mut current = id;
        loop {
            self.stack.push((current, 0));
            match self.nodes[current].children.first() {
                Some(&child) => current = child,
                None => return,
            }
        }
    }
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        loop {
            let (id, idx) = *self.stack.last()?;
            let node = &nodes[id];

            if idx < node.len() {
                if let Some(top) = self.stack.last_mut() {
                    top.1 += 1;
                }
                if !node.is_leaf() {
                    self.descend_to_leftmost(node.children[idx + 1]);
                }
                self.remaining = self.remaining.saturating_sub(1);
                return Some((&node.keys[idx], &node.values[idx]));
            }

            // Node exhausted, resume in the parent
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Ord, V> ExactSizeIterator for Iter<'_, K, V> {}
