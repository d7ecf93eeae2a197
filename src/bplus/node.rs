//! B+tree node layout.
//!
//! Internal nodes hold routing keys and children only. Leaves hold the
//! key-value pairs and are threaded into a doubly linked chain in key order.

use crate::types::NodeId;

/// Routing node: `children.len() == keys.len() + 1`
#[derive(Debug, Clone)]
pub(crate) struct InternalNode<K> {
    pub(crate) keys: Vec<K>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

/// Data node, linked to its neighbours in the leaf chain
#[derive(Debug, Clone)]
pub(crate) struct LeafNode<K, V> {
    pub(crate) keys: Vec<K>,
    pub(crate) values: Vec<V>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) enum Node<K, V> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K, V>),
}

impl<K: Ord> InternalNode<K> {
    /// Child to descend into for `key`; a key equal to a separator goes right
    pub(crate) fn child_for(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k <= key)
    }

    /// Position of `child` among this node's children
    ///
    /// # Panics
    ///
    /// Panics if `child` is not linked under this node.
    pub(crate) fn index_of(&self, child: NodeId) -> usize {
        match self.children.iter().position(|&c| c == child) {
            Some(idx) => idx,
            None => panic!("node {child} is missing from its parent"),
        }
    }
}

impl<K: Ord, V> LeafNode<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            parent: None,
            next: None,
            prev: None,
        }
    }

    /// Binary search for `key`: `Ok(index)` on a hit, `Err(insert_pos)` otherwise
    pub(crate) fn find(&self, key: &K) -> Result<usize, usize> {
        self.keys.binary_search(key)
    }
}

impl<K, V> Node<K, V> {
    pub(crate) fn keys(&self) -> &[K] {
        match self {
            Self::Internal(node) => &node.keys,
            Self::Leaf(leaf) => &leaf.keys,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.keys().len()
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub(crate) fn parent(&self) -> Option<NodeId> {
        match self {
            Self::Internal(node) => node.parent,
            Self::Leaf(leaf) => leaf.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        match self {
            Self::Internal(node) => node.parent = parent,
            Self::Leaf(leaf) => leaf.parent = parent,
        }
    }

    pub(crate) fn as_leaf(&self) -> Option<&LeafNode<K, V>> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Internal(_) => None,
        }
    }

    pub(crate) fn as_internal(&self) -> Option<&InternalNode<K>> {
        match self {
            Self::Internal(node) => Some(node),
            Self::Leaf(_) => None,
        }
    }
}
