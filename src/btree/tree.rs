//! B-tree core implementation.
//!
//! This module provides the main BTree struct with operations for:
//! - insert: Preemptive-split insertion (overwrites existing keys)
//! - search: Point lookups that may stop at an internal node
//! - delete: Single-pass removal with refill-before-descent
//! - iter: In-order traversal
//!
//! A node holds at most `2 * order - 1` keys and every node except the root
//! holds at least `order - 1`.

use super::cursor::Iter;
use super::node::Node;
use crate::arena::NodeArena;
use crate::error::{Result, TreeError};
use crate::store::KvStore;
use crate::types::{NodeId, TreeConfig};
use crate::{TreeNode, TreeStats};
use std::fmt;
use std::mem;
use tracing::{debug, trace};

/// An in-memory B-tree
#[derive(Debug, Clone)]
pub struct BTree<K, V> {
    /// Node storage
    nodes: NodeArena<Node<K, V>>,
    /// Root node (a leaf while the tree is small)
    root: NodeId,
    /// Minimum degree
    order: usize,
    /// Number of stored pairs
    len: usize,
}

impl<K: Ord, V> BTree<K, V> {
    /// Create an empty B-tree with the given minimum degree
    pub fn new(order: usize) -> Result<Self> {
        Self::with_config(TreeConfig::new(order))
    }

    /// Create an empty B-tree from a configuration
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let mut nodes = NodeArena::new();
        let root = nodes.alloc(Node::new_leaf());
        Ok(Self {
            nodes,
            root,
            order: config.order,
            len: 0,
        })
    }

    /// The minimum degree this tree was built with
    pub fn order(&self) -> usize {
        self.order
    }

    /// Maximum keys per node
    pub fn max_keys(&self) -> usize {
        2 * self.order - 1
    }

    /// Minimum keys per non-root node
    pub fn min_keys(&self) -> usize {
        self.order - 1
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels (1 for a lone root leaf)
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut id = self.root;
        while let Some(&child) = self.nodes[id].children.first() {
            height += 1;
            id = child;
        }
        height
    }

    /// Remove every pair
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::new_leaf());
        self.len = 0;
    }

    /// Look up a key
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut id = self.root;
        loop {
            let node = &self.nodes[id];
            let idx = node.find_key(key);
            if node.holds(idx, key) {
                return Some(&node.values[idx]);
            }
            if node.is_leaf() {
                return None;
            }
            id = node.children[idx];
        }
    }

    /// Look up a key for in-place modification
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let mut id = self.root;
        loop {
            let node = &self.nodes[id];
            let idx = node.find_key(key);
            if node.holds(idx, key) {
                return Some(&mut self.nodes[id].values[idx]);
            }
            if node.is_leaf() {
                return None;
            }
            id = node.children[idx];
        }
    }

    /// Look up a key, failing with [`TreeError::KeyNotFound`] on a miss
    pub fn search(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(TreeError::KeyNotFound)
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert or update a key-value pair
    ///
    /// An existing key keeps its position and gets the new value; the old
    /// value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.get_mut(&key) {
            return Some(mem::replace(slot, value));
        }

        if self.nodes[self.root].len() == self.max_keys() {
            let old_root = self.root;
            self.root = self.nodes.alloc(Node::new_root_above(old_root));
            self.split_child(self.root, 0);
            debug!(height = self.height(), "b-tree root split");
        }

        self.insert_non_full(key, value);
        self.len += 1;
        None
    }

    /// Descend from the root, splitting full children before entering them
    fn insert_non_full(&mut self, key: K, value: V) {
        let max_keys = self.max_keys();
        let mut id = self.root;

        loop {
            let node = &self.nodes[id];
            let mut idx = node.find_key(&key);

            if node.is_leaf() {
                let node = &mut self.nodes[id];
                node.keys.insert(idx, key);
                node.values.insert(idx, value);
                return;
            }

            if self.nodes[node.children[idx]].len() == max_keys {
                self.split_child(id, idx);
                if key > self.nodes[id].keys[idx] {
                    idx += 1;
                }
            }

            id = self.nodes[id].children[idx];
        }
    }

    /// Split the full child at `index` of `parent`
    ///
    /// The median entry moves up into `parent` at `index`; the upper half
    /// becomes a new sibling at `index + 1`.
    fn split_child(&mut self, parent: NodeId, index: usize) {
        let order = self.order;
        let child_id = self.nodes[parent].children[index];

        let child = &mut self.nodes[child_id];
        let mut keys = child.keys.split_off(order - 1);
        let mut values = child.values.split_off(order - 1);
        let children = if child.is_leaf() {
            Vec::new()
        } else {
            child.children.split_off(order)
        };
        let median_key = keys.remove(0);
        let median_value = values.remove(0);

        let sibling = self.nodes.alloc(Node {
            keys,
            values,
            children,
        });

        let parent_node = &mut self.nodes[parent];
        parent_node.keys.insert(index, median_key);
        parent_node.values.insert(index, median_value);
        parent_node.children.insert(index + 1, sibling);

        trace!(%parent, %child_id, %sibling, "b-tree split");
    }

    /// Delete a key from the tree
    ///
    /// Returns the removed value, or [`TreeError::KeyNotFound`]. A miss may
    /// still have rebalanced nodes along the search path; the tree stays
    /// valid either way.
    pub fn delete(&mut self, key: &K) -> Result<V> {
        let result = self.remove_from(self.root, key);
        self.collapse_root();
        if result.is_ok() {
            self.len -= 1;
        }
        result
    }

    /// Replace an empty internal root with its only child
    fn collapse_root(&mut self) {
        loop {
            let root = &self.nodes[self.root];
            if !root.keys.is_empty() || root.is_leaf() {
                return;
            }
            let child = root.children[0];
            self.nodes.remove(self.root);
            self.root = child;
            debug!(height = self.height(), "b-tree root collapsed");
        }
    }

    fn remove_from(&mut self, id: NodeId, key: &K) -> Result<V> {
        let node = &self.nodes[id];
        let idx = node.find_key(key);

        if node.holds(idx, key) {
            if node.is_leaf() {
                let node = &mut self.nodes[id];
                node.keys.remove(idx);
                return Ok(node.values.remove(idx));
            }
            return self.remove_from_internal(id, idx, key);
        }

        if node.is_leaf() {
            return Err(TreeError::KeyNotFound);
        }

        let was_last = idx == node.len();
        if self.nodes[node.children[idx]].len() < self.order {
            self.fill(id, idx);
        }

        // A fill at the last index merges into the left sibling
        let node = &self.nodes[id];
        let next = if was_last && idx > node.len() {
            node.children[idx - 1]
        } else {
            node.children[idx]
        };
        self.remove_from(next, key)
    }

    /// Remove `keys[idx]` of an internal node
    fn remove_from_internal(&mut self, id: NodeId, idx: usize, key: &K) -> Result<V> {
        let node = &self.nodes[id];
        let left = node.children[idx];
        let right = node.children[idx + 1];

        if self.nodes[left].len() >= self.order {
            let (pred_key, pred_value) = self.pop_max(left);
            let node = &mut self.nodes[id];
            node.keys[idx] = pred_key;
            Ok(mem::replace(&mut node.values[idx], pred_value))
        } else if self.nodes[right].len() >= self.order {
            let (succ_key, succ_value) = self.pop_min(right);
            let node = &mut self.nodes[id];
            node.keys[idx] = succ_key;
            Ok(mem::replace(&mut node.values[idx], succ_value))
        } else {
            self.merge(id, idx);
            self.remove_from(left, key)
        }
    }

    /// Remove the largest entry of the subtree rooted at `start`
    ///
    /// `start` must hold at least `order` keys.
    fn pop_max(&mut self, start: NodeId) -> (K, V) {
        let mut id = start;
        loop {
            let node = &self.nodes[id];
            if node.is_leaf() {
                let (key, value, _) = self.nodes[id].pop_back();
                return (key, value);
            }
            let last = node.len();
            if self.nodes[node.children[last]].len() < self.order {
                self.fill(id, last);
            }
            let node = &self.nodes[id];
            id = node.children[node.len()];
        }
    }

    /// Remove the smallest entry of the subtree rooted at `start`
    ///
    /// `start` must hold at least `order` keys.
    fn pop_min(&mut self, start: NodeId) -> (K, V) {
        let mut id = start;
        loop {
            let node = &self.nodes[id];
            if node.is_leaf() {
                let (key, value, _) = self.nodes[id].pop_front();
                return (key, value);
            }
            if self.nodes[node.children[0]].len() < self.order {
                self.fill(id, 0);
            }
            id = self.nodes[id].children[0];
        }
    }

    /// Bring the child at `idx` up to at least `order` keys
    fn fill(&mut self, id: NodeId, idx: usize) {
        let node = &self.nodes[id];
        let last = node.len();

        if idx != 0 && self.nodes[node.children[idx - 1]].len() >= self.order {
            self.borrow_from_prev(id, idx);
        } else if idx != last && self.nodes[node.children[idx + 1]].len() >= self.order {
            self.borrow_from_next(id, idx);
        } else if idx != last {
            self.merge(id, idx);
        } else {
            self.merge(id, idx - 1);
        }
    }

    /// Rotate the left sibling's last entry through the parent into `children[idx]`
    fn borrow_from_prev(&mut self, id: NodeId, idx: usize) {
        let child = self.nodes[id].children[idx];
        let sibling = self.nodes[id].children[idx - 1];

        let (key, value, moved) = self.nodes[sibling].pop_back();
        let parent = &mut self.nodes[id];
        let sep_key = mem::replace(&mut parent.keys[idx - 1], key);
        let sep_value = mem::replace(&mut parent.values[idx - 1], value);
        self.nodes[child].push_front(sep_key, sep_value, moved);

        trace!(%child, from = %sibling, "b-tree borrow from left");
    }

    /// Rotate the right sibling's first entry through the parent into `children[idx]`
    fn borrow_from_next(&mut self, id: NodeId, idx: usize) {
        let child = self.nodes[id].children[idx];
        let sibling = self.nodes[id].children[idx + 1];

        let (key, value, moved) = self.nodes[sibling].pop_front();
        let parent = &mut self.nodes[id];
        let sep_key = mem::replace(&mut parent.keys[idx], key);
        let sep_value = mem::replace(&mut parent.values[idx], value);
        self.nodes[child].push_back(sep_key, sep_value, moved);

        trace!(%child, from = %sibling, "b-tree borrow from right");
    }

    /// Fold `children[idx + 1]` and the separator `keys[idx]` into `children[idx]`
    fn merge(&mut self, id: NodeId, idx: usize) {
        let parent = &mut self.nodes[id];
        let child = parent.children[idx];
        let sibling = parent.children.remove(idx + 1);
        let sep_key = parent.keys.remove(idx);
        let sep_value = parent.values.remove(idx);

        let absorbed = self.nodes.remove(sibling);
        let node = &mut self.nodes[child];
        node.keys.push(sep_key);
        node.values.push(sep_value);
        node.keys.extend(absorbed.keys);
        node.values.extend(absorbed.values);
        node.children.extend(absorbed.children);

        trace!(%child, absorbed = %sibling, "b-tree merge");
    }

    /// Iterate over all pairs in ascending key order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.nodes, self.root, self.len)
    }

    /// Iterate over all keys in ascending order
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterate over all values in ascending key order
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Get statistics about the tree shape
    pub fn stats(&self) -> TreeStats {
        let leaf_count = self.count_leaves(self.root);
        TreeStats {
            len: self.len,
            height: self.height(),
            node_count: self.nodes.len(),
            leaf_count,
        }
    }

    fn count_leaves(&self, id: NodeId) -> usize {
        let node = &self.nodes[id];
        if node.is_leaf() {
            1
        } else {
            node.children.iter().map(|&c| self.count_leaves(c)).sum()
        }
    }

    /// Check every structural invariant
    ///
    /// Verifies key order within and across nodes, per-node capacity bounds,
    /// uniform leaf depth, and that the arena holds no unreachable nodes.
    pub fn validate(&self) -> Result<()> {
        let root = self
            .nodes
            .get(self.root)
            .ok_or_else(|| TreeError::corruption(format!("root {} is not live", self.root)))?;
        if !root.is_leaf() && root.keys.is_empty() {
            return Err(TreeError::corruption("internal root has no keys"));
        }

        let mut walk = Walk::default();
        self.validate_node(self.root, None, None, 1, &mut walk)?;

        if walk.nodes != self.nodes.len() {
            return Err(TreeError::corruption(format!(
                "{} nodes reachable but {} allocated",
                walk.nodes,
                self.nodes.len()
            )));
        }
        if walk.keys != self.len {
            return Err(TreeError::corruption(format!(
                "{} keys stored but len is {}",
                walk.keys, self.len
            )));
        }
        Ok(())
    }

    fn validate_node(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        walk: &mut Walk,
    ) -> Result<()> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| TreeError::corruption(format!("child {id} is not live")))?;
        walk.nodes += 1;
        walk.keys += node.len();

        if node.values.len() != node.keys.len() {
            return Err(TreeError::corruption(format!(
                "node {id} has {} keys but {} values",
                node.keys.len(),
                node.values.len()
            )));
        }
        if node.len() > self.max_keys() {
            return Err(TreeError::corruption(format!(
                "node {id} holds {} keys, max is {}",
                node.len(),
                self.max_keys()
            )));
        }
        if id != self.root && node.len() < self.min_keys() {
            return Err(TreeError::corruption(format!(
                "node {id} holds {} keys, min is {}",
                node.len(),
                self.min_keys()
            )));
        }
        if node.keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TreeError::corruption(format!("node {id} keys are not ascending")));
        }
        let below = lower.is_some_and(|lo| node.keys.first().is_some_and(|k| k <= lo));
        let above = upper.is_some_and(|hi| node.keys.last().is_some_and(|k| k >= hi));
        if below || above {
            return Err(TreeError::corruption(format!(
                "node {id} keys escape their separator range"
            )));
        }

        if node.is_leaf() {
            match walk.leaf_depth {
                Some(expected) if expected != depth => {
                    return Err(TreeError::corruption(format!(
                        "leaf {id} at depth {depth}, expected {expected}"
                    )));
                }
                Some(_) => {}
                None => walk.leaf_depth = Some(depth),
            }
            return Ok(());
        }

        if node.children.len() != node.keys.len() + 1 {
            return Err(TreeError::corruption(format!(
                "node {id} has {} keys but {} children",
                node.keys.len(),
                node.children.len()
            )));
        }
        for (i, &child) in node.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(&node.keys[i - 1]) };
            let hi = node.keys.get(i).or(upper);
            self.validate_node(child, lo, hi, depth + 1, walk)?;
        }
        Ok(())
    }
}

impl<K: Ord + fmt::Display, V: fmt::Display> BTree<K, V> {
    /// Export the tree structure for visualization
    pub fn export_tree(&self) -> TreeNode {
        self.export_node(self.root)
    }

    fn export_node(&self, id: NodeId) -> TreeNode {
        let node = &self.nodes[id];
        TreeNode {
            node_id: id.value(),
            is_leaf: node.is_leaf(),
            keys: node.keys.iter().map(ToString::to_string).collect(),
            values: node.values.iter().map(ToString::to_string).collect(),
            children: node.children.iter().map(|&c| self.export_node(c)).collect(),
        }
    }
}

/// Counters gathered while validating
#[derive(Default)]
struct Walk {
    nodes: usize,
    keys: usize,
    leaf_depth: Option<usize>,
}

impl<'a, K: Ord, V> IntoIterator for &'a BTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> KvStore<K, V> for BTree<K, V> {
    fn insert(&mut self, key: K, value: V) {
        BTree::insert(self, key, value);
    }

    fn search(&self, key: &K) -> Result<&V> {
        BTree::search(self, key)
    }

    fn delete(&mut self, key: &K) -> Result<V> {
        BTree::delete(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn name(&self) -> &'static str {
        "btree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(order: usize, keys: &[i32]) -> BTree<i32, String> {
        let mut tree = BTree::new(order).unwrap();
        for &k in keys {
            tree.insert(k, format!("v{k}"));
        }
        tree
    }

    #[test]
    fn test_btree_rejects_small_order() {
        assert!(matches!(
            BTree::<i32, i32>::new(1),
            Err(TreeError::InvalidConfiguration { order: 1, min: 2 })
        ));
        assert!(BTree::<i32, i32>::new(2).is_ok());
    }

    #[test]
    fn test_btree_empty() -> Result<()> {
        let tree: BTree<i32, i32> = BTree::new(3)?;
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert!(matches!(tree.search(&1), Err(TreeError::KeyNotFound)));
        tree.validate()
    }

    #[test]
    fn test_btree_insert_and_search() -> Result<()> {
        let tree = tree_with(2, &[50, 10, 70, 30, 90, 20, 60, 40, 80]);
        for k in [10, 20, 30, 40, 50, 60, 70, 80, 90] {
            assert_eq!(tree.search(&k)?, &format!("v{k}"));
        }
        assert!(tree.search(&55).is_err());
        assert_eq!(tree.len(), 9);
        tree.validate()
    }

    #[test]
    fn test_btree_root_split_shape() -> Result<()> {
        // order 2: a node holds at most 3 keys
        let tree = tree_with(2, &[1, 2, 3, 4]);
        let export = tree.export_tree();
        assert_eq!(export.keys, vec!["2"]);
        assert_eq!(export.children.len(), 2);
        assert_eq!(export.children[0].keys, vec!["1"]);
        assert_eq!(export.children[1].keys, vec!["3", "4"]);
        tree.validate()
    }

    #[test]
    fn test_btree_overwrite_keeps_single_entry() -> Result<()> {
        let mut tree = tree_with(2, &[1, 2, 3, 4, 5, 6, 7]);
        // 2 and 4 now sit in internal nodes
        assert_eq!(tree.insert(4, "new".to_string()), Some("v4".to_string()));
        assert_eq!(tree.insert(1, "one".to_string()), Some("v1".to_string()));
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.search(&4)?, "new");
        assert_eq!(tree.search(&1)?, "one");
        assert_eq!(tree.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6, 7]);
        tree.validate()
    }

    #[test]
    fn test_btree_delete_leaf_and_internal() -> Result<()> {
        let mut tree = tree_with(2, &(1..=20).collect::<Vec<_>>());
        assert_eq!(tree.delete(&1)?, "v1");
        // an internal key
        let root_key: i32 = tree.export_tree().keys[0].parse().unwrap();
        assert_eq!(tree.delete(&root_key)?, format!("v{root_key}"));
        tree.validate()?;
        assert!(tree.search(&1).is_err());
        assert!(tree.search(&root_key).is_err());
        assert_eq!(tree.len(), 18);
        Ok(())
    }

    #[test]
    fn test_btree_delete_missing() -> Result<()> {
        let mut tree = tree_with(2, &(1..=10).collect::<Vec<_>>());
        assert!(matches!(tree.delete(&42), Err(TreeError::KeyNotFound)));
        assert_eq!(tree.len(), 10);
        tree.validate()
    }

    #[test]
    fn test_btree_delete_all_collapses_root() -> Result<()> {
        let keys: Vec<i32> = (0..200).map(|i| (i * 37) % 200).collect();
        let mut tree = tree_with(3, &keys);
        assert!(tree.height() > 1);
        for k in keys.iter().rev() {
            tree.delete(k)?;
            tree.validate()?;
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.stats().node_count, 1);
        Ok(())
    }

    #[test]
    fn test_btree_iter_in_order() {
        let tree = tree_with(2, &[5, 3, 8, 1, 4, 7, 9, 2, 6]);
        let keys: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, (1..=9).collect::<Vec<_>>());
        assert_eq!(tree.iter().len(), 9);
        assert_eq!(tree.values().next().map(String::as_str), Some("v1"));
    }

    #[test]
    fn test_btree_stats_and_clear() {
        let mut tree = tree_with(2, &(0..50).collect::<Vec<_>>());
        let stats = tree.stats();
        assert_eq!(stats.len, 50);
        assert_eq!(stats.height, tree.height());
        assert!(stats.leaf_count > 1);
        assert!(stats.node_count > stats.leaf_count);

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.stats().node_count, 1);
    }

    #[test]
    fn test_btree_get_mut() -> Result<()> {
        let mut tree = tree_with(2, &[1, 2, 3, 4, 5]);
        if let Some(v) = tree.get_mut(&2) {
            v.push('!');
        }
        assert_eq!(tree.search(&2)?, "v2!");
        assert!(tree.get_mut(&9).is_none());
        Ok(())
    }
}
