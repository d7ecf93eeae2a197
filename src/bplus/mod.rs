//! B+tree implementation.
//!
//! Values live only in leaves, which form a doubly linked chain in key
//! order. Internal nodes carry routing keys. Range scans descend once and
//! then follow the chain.

mod cursor;
mod node;
mod tree;

pub use cursor::Iter;
pub use tree::BPlusTree;
