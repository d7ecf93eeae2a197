//! B+tree core implementation.
//!
//! Capacity rules for a tree of order `m`:
//! - a node overflows once it holds `m` keys, so at most `m - 1` remain
//! - a non-root leaf holds at least `m / 2` keys
//! - a non-root internal node keeps at least `ceil(m / 2)` children, which is
//!   `(m - 1) / 2` keys (the same as `m / 2` for odd `m`)
//!
//! Leaf splits copy the new leaf's first key into the parent. Internal splits
//! move the median up and keep it in neither half. Underflow repair tries,
//! in order: borrow from the left sibling, borrow from the right sibling,
//! merge into the left sibling, merge the right sibling in. At order 2 an
//! internal node may keep a single child and no keys; when such an only child
//! empties it is freed, together with any ancestor it leaves childless.

use super::cursor::Iter;
use super::node::{InternalNode, LeafNode, Node};
use crate::arena::NodeArena;
use crate::error::{Result, TreeError};
use crate::store::KvStore;
use crate::types::{NodeId, TreeConfig};
use crate::{TreeNode, TreeStats};
use std::fmt;
use std::mem;
use tracing::{debug, trace};

/// An in-memory B+tree with a linked leaf chain
#[derive(Debug, Clone)]
pub struct BPlusTree<K, V> {
    nodes: NodeArena<Node<K, V>>,
    root: NodeId,
    order: usize,
    len: usize,
}

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Create an empty B+tree of the given order
    pub fn new(order: usize) -> Result<Self> {
        Self::with_config(TreeConfig::new(order))
    }

    /// Create an empty B+tree from a configuration
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let mut nodes = NodeArena::new();
        let root = nodes.alloc(Node::Leaf(LeafNode::new()));
        Ok(Self {
            nodes,
            root,
            order: config.order,
            len: 0,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Maximum keys per node
    pub fn max_keys(&self) -> usize {
        self.order - 1
    }

    /// Minimum keys per non-root leaf
    pub fn min_leaf_keys(&self) -> usize {
        self.order / 2
    }

    /// Minimum keys per non-root internal node
    pub fn min_internal_keys(&self) -> usize {
        (self.order - 1) / 2
    }

    fn min_keys_for(&self, id: NodeId) -> usize {
        if self.nodes[id].is_leaf() {
            self.min_leaf_keys()
        } else {
            self.min_internal_keys()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels (1 for a lone root leaf)
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut id = self.root;
        while let Node::Internal(node) = &self.nodes[id] {
            height += 1;
            id = node.children[0];
        }
        height
    }

    /// Remove every pair
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::Leaf(LeafNode::new()));
        self.len = 0;
    }

    fn leaf(&self, id: NodeId) -> &LeafNode<K, V> {
        match self.nodes[id].as_leaf() {
            Some(leaf) => leaf,
            None => panic!("node {id} is not a leaf"),
        }
    }

    fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode<K, V> {
        match &mut self.nodes[id] {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("node {id} is not a leaf"),
        }
    }

    fn internal(&self, id: NodeId) -> &InternalNode<K> {
        match self.nodes[id].as_internal() {
            Some(node) => node,
            None => panic!("node {id} is not an internal node"),
        }
    }

    fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode<K> {
        match &mut self.nodes[id] {
            Node::Internal(node) => node,
            Node::Leaf(_) => panic!("node {id} is not an internal node"),
        }
    }

    /// Descend to the only leaf whose key range contains `key`
    fn find_leaf(&self, key: &K) -> NodeId {
        let mut id = self.root;
        while let Node::Internal(node) = &self.nodes[id] {
            id = node.children[node.child_for(key)];
        }
        id
    }

    fn first_leaf(&self) -> NodeId {
        let mut id = self.root;
        while let Node::Internal(node) = &self.nodes[id] {
            id = node.children[0];
        }
        id
    }

    /// Look up a key
    pub fn get(&self, key: &K) -> Option<&V> {
        let leaf = self.leaf(self.find_leaf(key));
        leaf.find(key).ok().map(|idx| &leaf.values[idx])
    }

    /// Look up a key for in-place modification
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find_leaf(key);
        let leaf = self.leaf_mut(id);
        match leaf.find(key) {
            Ok(idx) => Some(&mut leaf.values[idx]),
            Err(_) => None,
        }
    }

    /// Look up a key; absence is `None`, never a default value
    pub fn search(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert or update a key-value pair, returning the previous value
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let order = self.order;
        let leaf_id = self.find_leaf(&key);
        let leaf = self.leaf_mut(leaf_id);

        let pos = match leaf.find(&key) {
            Ok(idx) => return Some(mem::replace(&mut leaf.values[idx], value)),
            Err(pos) => pos,
        };
        leaf.keys.insert(pos, key);
        leaf.values.insert(pos, value);
        let overflow = leaf.keys.len() >= order;

        self.len += 1;
        if overflow {
            self.split_leaf(leaf_id);
        }
        None
    }

    /// Move the upper half of a full leaf into a new right sibling
    fn split_leaf(&mut self, id: NodeId) {
        let mid = self.order / 2;
        let leaf = self.leaf_mut(id);
        let keys = leaf.keys.split_off(mid);
        let values = leaf.values.split_off(mid);
        let parent = leaf.parent;
        let next = leaf.next;
        let separator = keys[0].clone();

        let sibling = self.nodes.alloc(Node::Leaf(LeafNode {
            keys,
            values,
            parent,
            next,
            prev: Some(id),
        }));
        if let Some(next) = next {
            self.leaf_mut(next).prev = Some(sibling);
        }
        self.leaf_mut(id).next = Some(sibling);

        trace!(leaf = %id, %sibling, "b+tree leaf split");
        self.insert_into_parent(id, separator, sibling);
    }

    /// Link `right` after `left` under their parent, splitting upward as needed
    fn insert_into_parent(&mut self, mut left: NodeId, mut separator: K, mut right: NodeId) {
        let order = self.order;

        loop {
            let Some(parent) = self.nodes[left].parent() else {
                let root = self.nodes.alloc(Node::Internal(InternalNode {
                    keys: vec![separator],
                    children: vec![left, right],
                    parent: None,
                }));
                self.nodes[left].set_parent(Some(root));
                self.nodes[right].set_parent(Some(root));
                self.root = root;
                debug!(height = self.height(), "b+tree root split");
                return;
            };

            let node = self.internal_mut(parent);
            let pos = node.index_of(left);
            node.keys.insert(pos, separator);
            node.children.insert(pos + 1, right);
            let overflow = node.keys.len() >= order;
            self.nodes[right].set_parent(Some(parent));
            if !overflow {
                return;
            }

            let mid = order / 2;
            let node = self.internal_mut(parent);
            let mut keys = node.keys.split_off(mid);
            let children = node.children.split_off(mid + 1);
            let grandparent = node.parent;
            let promoted = keys.remove(0);

            let sibling = self.nodes.alloc(Node::Internal(InternalNode {
                keys,
                children: Vec::new(),
                parent: grandparent,
            }));
            for &child in &children {
                self.nodes[child].set_parent(Some(sibling));
            }
            self.internal_mut(sibling).children = children;

            trace!(node = %parent, %sibling, "b+tree internal split");
            left = parent;
            separator = promoted;
            right = sibling;
        }
    }

    /// Delete a key, returning its value; a missing key is a no-op
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let min = self.min_leaf_keys();
        let leaf_id = self.find_leaf(key);
        let leaf = self.leaf_mut(leaf_id);

        let pos = leaf.find(key).ok()?;
        leaf.keys.remove(pos);
        let value = leaf.values.remove(pos);
        let underflow = leaf.keys.len() < min;

        self.len -= 1;
        if underflow && leaf_id != self.root {
            self.rebalance(leaf_id);
        }
        Some(value)
    }

    /// Repair an underflowing non-root node, cascading toward the root
    fn rebalance(&mut self, start: NodeId) {
        let mut id = start;
        loop {
            let Some(parent) = self.nodes[id].parent() else {
                return;
            };
            let min = self.min_keys_for(id);
            let (idx, left, right) = {
                let node = self.internal(parent);
                let idx = node.index_of(id);
                let left = idx.checked_sub(1).map(|i| node.children[i]);
                (idx, left, node.children.get(idx + 1).copied())
            };

            if left.is_some_and(|left| self.nodes[left].len() > min) {
                self.borrow_from_left(parent, idx);
                return;
            }
            if right.is_some_and(|right| self.nodes[right].len() > min) {
                self.borrow_from_right(parent, idx);
                return;
            }
            match (left, right) {
                (Some(_), _) => self.merge(parent, idx - 1),
                (None, Some(_)) => self.merge(parent, idx),
                // Only child under a keyless order-2 internal node
                (None, None) => {
                    if self.nodes[id].len() == 0 {
                        self.prune(id);
                    }
                    return;
                }
            }

            if parent == self.root {
                self.collapse_root();
                return;
            }
            if self.nodes[parent].len() >= self.min_internal_keys() {
                return;
            }
            id = parent;
        }
    }

    /// Free an emptied leaf with no siblings, along with every ancestor
    /// that is left without children
    fn prune(&mut self, start: NodeId) {
        let mut id = start;
        while let Some(parent) = self.nodes[id].parent() {
            if let Node::Leaf(leaf) = self.nodes.remove(id) {
                if let Some(prev) = leaf.prev {
                    self.leaf_mut(prev).next = leaf.next;
                }
                if let Some(next) = leaf.next {
                    self.leaf_mut(next).prev = leaf.prev;
                }
            }

            let p = self.internal_mut(parent);
            let idx = p.index_of(id);
            p.children.remove(idx);
            if !p.keys.is_empty() {
                p.keys.remove(idx.saturating_sub(1));
            }
            let drained = p.children.is_empty();
            trace!(node = %id, %parent, "b+tree prune");

            if !drained {
                break;
            }
            id = parent;
        }
        self.collapse_root();
    }

    /// Replace an internal root without keys by its only child
    fn collapse_root(&mut self) {
        while let Node::Internal(root) = &self.nodes[self.root] {
            if !root.keys.is_empty() {
                return;
            }
            let child = root.children[0];
            self.nodes.remove(self.root);
            self.nodes[child].set_parent(None);
            self.root = child;
            debug!(height = self.height(), "b+tree root collapsed");
        }
    }

    /// Move one entry from `children[idx - 1]` into `children[idx]`
    fn borrow_from_left(&mut self, parent: NodeId, idx: usize) {
        let (node_id, left_id) = {
            let p = self.internal(parent);
            (p.children[idx], p.children[idx - 1])
        };

        if self.nodes[node_id].is_leaf() {
            let left = self.leaf_mut(left_id);
            let last = left.keys.len() - 1;
            let key = left.keys.remove(last);
            let value = left.values.remove(last);
            let separator = key.clone();

            let node = self.leaf_mut(node_id);
            node.keys.insert(0, key);
            node.values.insert(0, value);
            self.internal_mut(parent).keys[idx - 1] = separator;
        } else {
            let left = self.internal_mut(left_id);
            let last = left.keys.len() - 1;
            let key = left.keys.remove(last);
            let child = left.children.remove(last + 1);
            let separator = mem::replace(&mut self.internal_mut(parent).keys[idx - 1], key);

            let node = self.internal_mut(node_id);
            node.keys.insert(0, separator);
            node.children.insert(0, child);
            self.nodes[child].set_parent(Some(node_id));
        }

        trace!(node = %node_id, from = %left_id, "b+tree borrow from left");
    }

    /// Move one entry from `children[idx + 1]` into `children[idx]`
    fn borrow_from_right(&mut self, parent: NodeId, idx: usize) {
        let (node_id, right_id) = {
            let p = self.internal(parent);
            (p.children[idx], p.children[idx + 1])
        };

        if self.nodes[node_id].is_leaf() {
            let right = self.leaf_mut(right_id);
            let key = right.keys.remove(0);
            let value = right.values.remove(0);
            let separator = right.keys[0].clone();

            let node = self.leaf_mut(node_id);
            node.keys.push(key);
            node.values.push(value);
            self.internal_mut(parent).keys[idx] = separator;
        } else {
            let right = self.internal_mut(right_id);
            let key = right.keys.remove(0);
            let child = right.children.remove(0);
            let separator = mem::replace(&mut self.internal_mut(parent).keys[idx], key);

            let node = self.internal_mut(node_id);
            node.keys.push(separator);
            node.children.push(child);
            self.nodes[child].set_parent(Some(node_id));
        }

        trace!(node = %node_id, from = %right_id, "b+tree borrow from right");
    }

    /// Fold `children[idx + 1]` into `children[idx]` and drop their separator
    fn merge(&mut self, parent: NodeId, idx: usize) {
        let p = self.internal_mut(parent);
        let survivor = p.children[idx];
        let absorbed_id = p.children.remove(idx + 1);
        let separator = p.keys.remove(idx);

        match self.nodes.remove(absorbed_id) {
            Node::Leaf(absorbed) => {
                let node = self.leaf_mut(survivor);
                node.keys.extend(absorbed.keys);
                node.values.extend(absorbed.values);
                node.next = absorbed.next;
                if let Some(next) = absorbed.next {
                    self.leaf_mut(next).prev = Some(survivor);
                }
            }
            Node::Internal(absorbed) => {
                for &child in &absorbed.children {
                    self.nodes[child].set_parent(Some(survivor));
                }
                let node = self.internal_mut(survivor);
                node.keys.push(separator);
                node.keys.extend(absorbed.keys);
                node.children.extend(absorbed.children);
            }
        }

        trace!(node = %survivor, absorbed = %absorbed_id, "b+tree merge");
    }

    /// Iterate over all pairs by walking the leaf chain
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.nodes, self.first_leaf(), 0, None)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Iterate over the pairs with `low <= key <= high` in ascending order
    ///
    /// Empty when `low > high`.
    pub fn range(&self, low: &K, high: &K) -> Iter<'_, K, V> {
        if low > high {
            return Iter::empty(&self.nodes);
        }
        let leaf_id = self.find_leaf(low);
        let index = self.leaf(leaf_id).keys.partition_point(|k| k < low);
        Iter::new(&self.nodes, leaf_id, index, Some(high.clone()))
    }

    /// Values of the keys in `[low, high]`, in ascending key order
    pub fn range_query(&self, low: &K, high: &K) -> impl Iterator<Item = &V> + '_ {
        self.range(low, high).map(|(_, v)| v)
    }

    /// Get statistics about the tree shape
    pub fn stats(&self) -> TreeStats {
        let mut leaf_count = 0;
        let mut leaf = Some(self.first_leaf());
        while let Some(id) = leaf {
            leaf_count += 1;
            leaf = self.leaf(id).next;
        }
        TreeStats {
            len: self.len,
            height: self.height(),
            node_count: self.nodes.len(),
            leaf_count,
        }
    }

    /// Check every structural invariant
    ///
    /// Besides key order and capacity bounds this walks the leaf chain in
    /// both directions and compares it against the leaves reachable from the
    /// root.
    pub fn validate(&self) -> Result<()> {
        let root = self
            .nodes
            .get(self.root)
            .ok_or_else(|| TreeError::corruption(format!("root {} is not live", self.root)))?;
        if root.parent().is_some() {
            return Err(TreeError::corruption("root has a parent"));
        }
        if !root.is_leaf() && root.len() == 0 {
            return Err(TreeError::corruption("internal root has no keys"));
        }

        let mut walk = Walk::default();
        self.validate_node(self.root, None, None, None, 1, &mut walk)?;

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
        self.validate_chain(&walk.leaves)
    }

    #[allow(clippy::too_many_arguments)]
    fn validate_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
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

        if node.parent() != parent {
            return Err(TreeError::corruption(format!("node {id} has a stale parent link")));
        }
        let keys = node.keys();
        if keys.len() > self.max_keys() {
            return Err(TreeError::corruption(format!(
                "node {id} holds {} keys, max is {}",
                keys.len(),
                self.max_keys()
            )));
        }
        let min = self.min_keys_for(id);
        if parent.is_some() && keys.len() < min {
            return Err(TreeError::corruption(format!(
                "node {id} holds {} keys, min is {min}",
                keys.len()
            )));
        }
        if keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TreeError::corruption(format!("node {id} keys are not ascending")));
        }
        let below = lower.is_some_and(|lo| keys.first().is_some_and(|k| k < lo));
        let above = upper.is_some_and(|hi| keys.last().is_some_and(|k| k >= hi));
        if below || above {
            return Err(TreeError::corruption(format!(
                "node {id} keys escape their separator range"
            )));
        }

        match node {
            Node::Leaf(leaf) => {
                if leaf.values.len() != leaf.keys.len() {
                    return Err(TreeError::corruption(format!(
                        "leaf {id} has {} keys but {} values",
                        leaf.keys.len(),
                        leaf.values.len()
                    )));
                }
                match walk.leaf_depth {
                    Some(expected) if expected != depth => {
                        return Err(TreeError::corruption(format!(
                            "leaf {id} at depth {depth}, expected {expected}"
                        )));
                    }
                    Some(_) => {}
                    None => walk.leaf_depth = Some(depth),
                }
                walk.keys += leaf.keys.len();
                walk.leaves.push(id);
                Ok(())
            }
            Node::Internal(internal) => {
                if internal.children.len() != internal.keys.len() + 1 {
                    return Err(TreeError::corruption(format!(
                        "node {id} has {} keys but {} children",
                        internal.keys.len(),
                        internal.children.len()
                    )));
                }
                for (i, &child) in internal.children.iter().enumerate() {
                    let lo = if i == 0 {
                        lower
                    } else {
                        Some(&internal.keys[i - 1])
                    };
                    let hi = internal.keys.get(i).or(upper);
                    self.validate_node(child, Some(id), lo, hi, depth + 1, walk)?;
                }
                Ok(())
            }
        }
    }

    /// The chain must visit exactly `leaves`, in order, with matching back links
    fn validate_chain(&self, leaves: &[NodeId]) -> Result<()> {
        let mut prev: Option<NodeId> = None;
        let mut last_key: Option<&K> = None;
        let mut current = leaves.first().copied();

        for (position, &expected) in leaves.iter().enumerate() {
            let Some(id) = current else {
                return Err(TreeError::corruption(format!(
                    "leaf chain ends after {position} of {} leaves",
                    leaves.len()
                )));
            };
            if id != expected {
                return Err(TreeError::corruption(format!(
                    "leaf chain visits {id} where {expected} was expected"
                )));
            }
            let leaf = self.leaf(id);
            if leaf.prev != prev {
                return Err(TreeError::corruption(format!("leaf {id} has a stale prev link")));
            }
            if let (Some(last), Some(first)) = (last_key, leaf.keys.first()) {
                if first <= last {
                    return Err(TreeError::corruption(format!(
                        "leaf chain is not ascending at {id}"
                    )));
                }
            }
            if let Some(k) = leaf.keys.last() {
                last_key = Some(k);
            }
            prev = Some(id);
            current = leaf.next;
        }

        if let Some(extra) = current {
            return Err(TreeError::corruption(format!(
                "leaf chain continues to unreachable node {extra}"
            )));
        }
        Ok(())
    }
}

impl<K: Ord + Clone + fmt::Display, V: fmt::Display> BPlusTree<K, V> {
    /// Export the tree structure for visualization
    pub fn export_tree(&self) -> TreeNode {
        self.export_node(self.root)
    }

    fn export_node(&self, id: NodeId) -> TreeNode {
        match &self.nodes[id] {
            Node::Leaf(leaf) => TreeNode {
                node_id: id.value(),
                is_leaf: true,
                keys: leaf.keys.iter().map(ToString::to_string).collect(),
                values: leaf.values.iter().map(ToString::to_string).collect(),
                children: Vec::new(),
            },
            Node::Internal(node) => TreeNode {
                node_id: id.value(),
                is_leaf: false,
                keys: node.keys.iter().map(ToString::to_string).collect(),
                values: Vec::new(),
                children: node.children.iter().map(|&c| self.export_node(c)).collect(),
            },
        }
    }
}

/// Counters gathered while validating
#[derive(Default)]
struct Walk {
    nodes: usize,
    keys: usize,
    leaf_depth: Option<usize>,
    leaves: Vec<NodeId>,
}

impl<'a, K: Ord + Clone, V> IntoIterator for &'a BPlusTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord + Clone, V> KvStore<K, V> for BPlusTree<K, V> {
    fn insert(&mut self, key: K, value: V) {
        BPlusTree::insert(self, key, value);
    }

    fn search(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(TreeError::KeyNotFound)
    }

    fn delete(&mut self, key: &K) -> Result<V> {
        BPlusTree::delete(self, key).ok_or(TreeError::KeyNotFound)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn name(&self) -> &'static str {
        "bplus"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(order: usize, keys: &[i32]) -> BPlusTree<i32, i32> {
        let mut tree = BPlusTree::new(order).unwrap();
        for &k in keys {
            tree.insert(k, k * 10);
        }
        tree
    }

    #[test]
    fn test_bplus_rejects_small_order() {
        assert!(BPlusTree::<i32, i32>::new(1).is_err());
        assert!(BPlusTree::<i32, i32>::new(2).is_ok());
    }

    #[test]
    fn test_bplus_empty() -> Result<()> {
        let tree: BPlusTree<i32, i32> = BPlusTree::new(3)?;
        assert_eq!(tree.search(&1), None);
        assert_eq!(tree.iter().count(), 0);
        assert_eq!(tree.range(&0, &10).count(), 0);
        tree.validate()
    }

    #[test]
    fn test_bplus_leaf_split_copies_separator() -> Result<()> {
        // order 3: the third key overflows the root leaf
        let tree = tree_with(3, &[10, 20, 30]);
        let export = tree.export_tree();
        assert!(!export.is_leaf);
        assert_eq!(export.keys, vec!["20"]);
        assert_eq!(export.children[0].keys, vec!["10"]);
        assert_eq!(export.children[1].keys, vec!["20", "30"]);
        assert!(export.values.is_empty());
        tree.validate()
    }

    #[test]
    fn test_bplus_internal_split_moves_median() -> Result<()> {
        let tree = tree_with(3, &[1, 2, 3, 4, 5]);
        // leaves [1] [2] [3] [4,5] overflow the root, whose median 3 moves up alone
        let export = tree.export_tree();
        assert_eq!(export.keys, vec!["3"]);
        assert_eq!(export.children[0].keys, vec!["2"]);
        assert_eq!(export.children[1].keys, vec!["4"]);
        assert_eq!(tree.height(), 3);
        tree.validate()
    }

    #[test]
    fn test_bplus_separator_key_routes_right() {
        let tree = tree_with(3, &[10, 20, 30, 40, 50]);
        for k in [10, 20, 30, 40, 50] {
            assert_eq!(tree.search(&k), Some(&(k * 10)));
        }
    }

    #[test]
    fn test_bplus_overwrite() -> Result<()> {
        let mut tree = tree_with(4, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(tree.insert(3, 333), Some(30));
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.search(&3), Some(&333));
        tree.validate()
    }

    #[test]
    fn test_bplus_delete_missing_is_noop() -> Result<()> {
        let mut tree = tree_with(3, &[1, 2, 3, 4]);
        assert_eq!(tree.delete(&99), None);
        assert_eq!(tree.len(), 4);
        tree.validate()
    }

    #[test]
    fn test_bplus_borrow_from_left_updates_separator() -> Result<()> {
        // order 5: leaves hold 2..=4 keys
        let mut tree = tree_with(5, &[10, 20, 30, 40, 50, 5, 6]);
        // leaves [5,6,10,20] [30,40,50]
        tree.delete(&40);
        tree.delete(&50);
        let export = tree.export_tree();
        assert_eq!(export.children[1].keys, vec!["20", "30"]);
        assert_eq!(export.keys, vec!["20"]);
        tree.validate()
    }

    #[test]
    fn test_bplus_merge_shrinks_height() -> Result<()> {
        let mut tree = tree_with(3, &[1, 2, 3]);
        assert_eq!(tree.height(), 2);
        tree.delete(&3);
        tree.delete(&2);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.stats().node_count, 1);
        assert_eq!(tree.keys().copied().collect::<Vec<_>>(), vec![1]);
        tree.validate()
    }

    #[test]
    fn test_bplus_range_bounds() {
        let tree = tree_with(4, &(1..=30).collect::<Vec<_>>());
        let values: Vec<i32> = tree.range_query(&7, &12).copied().collect();
        assert_eq!(values, vec![70, 80, 90, 100, 110, 120]);
        assert_eq!(tree.range(&12, &7).count(), 0);
        assert_eq!(tree.range(&31, &40).count(), 0);
        assert_eq!(tree.range(&-5, &2).count(), 2);
        assert_eq!(tree.range(&15, &15).next(), Some((&15, &150)));
    }

    #[test]
    fn test_bplus_order_two_degenerate_shape() -> Result<()> {
        let mut tree = tree_with(2, &(0..16).collect::<Vec<_>>());
        tree.validate()?;
        for k in (0..16).step_by(3) {
            assert_eq!(tree.delete(&k), Some(k * 10));
            tree.validate()?;
        }
        let keys: Vec<i32> = tree.keys().copied().collect();
        let expected: Vec<i32> = (0..16).filter(|k| k % 3 != 0).collect();
        assert_eq!(keys, expected);
        Ok(())
    }

    #[test]
    fn test_bplus_order_two_drain_frees_nodes() -> Result<()> {
        let mut tree = BPlusTree::new(2)?;
        for round in 0..3 {
            for k in 0..200 {
                tree.insert(k, round);
            }
            assert!(tree.height() > 2);
            for k in 0..200 {
                assert_eq!(tree.delete(&k), Some(round));
                tree.validate()?;
            }
            let stats = tree.stats();
            assert_eq!(stats.node_count, 1);
            assert_eq!(stats.leaf_count, 1);
            assert_eq!(tree.height(), 1);
        }
        Ok(())
    }

    #[test]
    fn test_bplus_order_two_prune_keeps_chain() -> Result<()> {
        let mut tree = tree_with(2, &(0..32).collect::<Vec<_>>());
        for k in (0..32).rev().step_by(2) {
            tree.delete(&k);
            tree.validate()?;
        }
        let keys: Vec<i32> = tree.keys().copied().collect();
        assert_eq!(keys, (0..32).step_by(2).collect::<Vec<_>>());
        assert_eq!(tree.stats().leaf_count, 16);
        assert_eq!(tree.range(&3, &9).map(|(k, _)| *k).collect::<Vec<_>>(), vec![4, 6, 8]);
        Ok(())
    }

    #[test]
    fn test_bplus_stats() {
        let tree = tree_with(3, &(0..10).collect::<Vec<_>>());
        let stats = tree.stats();
        assert_eq!(stats.len, 10);
        assert!(stats.leaf_count >= 5);
        assert!(stats.node_count > stats.leaf_count);
        assert_eq!(stats.height, tree.height());
    }
}
