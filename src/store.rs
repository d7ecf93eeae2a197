//! The key-value contract shared by every data structure in the crate.

use crate::error::Result;

/// Insert, point search and delete, exposed uniformly by the B-tree, the
/// B+tree and the hash table
///
/// The engines' inherent methods keep their own miss conventions (the B+tree
/// returns `Option`). Through this trait every miss is
/// [`TreeError::KeyNotFound`](crate::TreeError::KeyNotFound).
pub trait KvStore<K, V> {
    /// Insert a pair, overwriting the value of an existing key
    fn insert(&mut self, key: K, value: V);

    /// Look up the value stored for `key`
    fn search(&self, key: &K) -> Result<&V>;

    /// Remove `key` and return its value
    fn delete(&mut self, key: &K) -> Result<V>;

    /// Number of stored pairs
    fn len(&self) -> usize;

    /// Whether the store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name used in benchmark reports
    fn name(&self) -> &'static str;
}
