//! B-tree implementation.
//!
//! This module provides an in-memory B-tree that supports:
//! - Point lookups (search)
//! - Insertions with overwrite (insert)
//! - Deletions with borrow/merge rebalancing (delete)
//! - In-order traversal (iter)

mod cursor;
mod node;
mod tree;

pub use cursor::Iter;
pub use tree::BTree;
