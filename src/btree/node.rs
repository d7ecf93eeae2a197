//! B-tree node layout.

use crate::types::NodeId;

/// A B-tree node
///
/// `values[i]` belongs to `keys[i]`. Internal nodes carry
/// `keys.len() + 1` children; leaves carry none.
#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) keys: Vec<K>,
    pub(crate) values: Vec<V>,
    pub(crate) children: Vec<NodeId>,
}

impl<K: Ord, V> Node<K, V> {
    /// Create an empty leaf
    pub(crate) fn new_leaf() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an empty internal node above `child`
    pub(crate) fn new_root_above(child: NodeId) -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            children: vec![child],
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    /// Index of the first key that is not less than `key`
    pub(crate) fn find_key(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k < key)
    }

    /// Whether `keys[idx]` exists and equals `key`
    pub(crate) fn holds(&self, idx: usize, key: &K) -> bool {
        idx < self.keys.len() && self.keys[idx] == *key
    }

    /// Remove the last entry, and the last child for internal nodes
    pub(crate) fn pop_back(&mut self) -> (K, V, Option<NodeId>) {
        let last = self.keys.len() - 1;
        let key = self.keys.remove(last);
        let value = self.values.remove(last);
        (key, value, self.children.pop())
    }

    /// Remove the first entry, and the first child for internal nodes
    pub(crate) fn pop_front(&mut self) -> (K, V, Option<NodeId>) {
        let key = self.keys.remove(0);
        let value = self.values.remove(0);
        let child = if self.is_leaf() {
            None
        } else {
            Some(self.children.remove(0))
        };
        (key, value, child)
    }

    pub(crate) fn push_front(&mut self, key: K, value: V, child: Option<NodeId>) {
        self.keys.insert(0, key);
        self.values.insert(0, value);
        if let Some(child) = child {
            self.children.insert(0, child);
        }
    }

    pub(crate) fn push_back(&mut self, key: K, value: V, child: Option<NodeId>) {
        self.keys.push(key);
        self.values.push(value);
        if let Some(child) = child {
            self.children.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(keys: &[i32]) -> Node<i32, i32> {
        Node {
            keys: keys.to_vec(),
            values: keys.iter().map(|k| k * 10).collect(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_find_key() {
        let node = leaf(&[10, 20, 30]);
        assert_eq!(node.find_key(&5), 0);
        assert_eq!(node.find_key(&10), 0);
        assert_eq!(node.find_key(&15), 1);
        assert_eq!(node.find_key(&30), 2);
        assert_eq!(node.find_key(&31), 3);
        assert!(node.holds(1, &20));
        assert!(!node.holds(1, &15));
        assert!(!node.holds(3, &31));
    }

    #[test]
    fn test_pop_and_push_leaf() {
        let mut node = leaf(&[1, 2, 3]);
        assert_eq!(node.pop_back(), (3, 30, None));
        assert_eq!(node.pop_front(), (1, 10, None));
        node.push_front(0, 0, None);
        node.push_back(9, 90, None);
        assert_eq!(node.keys, vec![0, 2, 9]);
        assert_eq!(node.values, vec![0, 20, 90]);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_pop_internal_moves_child() {
        let mut node: Node<i32, i32> = Node {
            keys: vec![5, 8],
            values: vec![50, 80],
            children: vec![NodeId(1), NodeId(2), NodeId(3)],
        };
        assert_eq!(node.pop_back(), (8, 80, Some(NodeId(3))));
        assert_eq!(node.pop_front(), (5, 50, Some(NodeId(1))));
        assert_eq!(node.children, vec![NodeId(2)]);
    }
}
