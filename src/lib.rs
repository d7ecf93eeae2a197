//! # ordtree
//!
//! In-memory ordered key-value engines built on balanced search trees.
//!
//! ## Architecture
//!
//! - **Arena** (`arena`): index-addressed node storage shared by both trees
//! - **B-Tree** (`btree`): keys and values in every node, preemptive splits
//! - **B+Tree** (`bplus`): values in a linked leaf chain, inclusive range scans
//! - **Hash table** (`hash`): linear-probing baseline for the benchmarks
//! - **Store contract** (`store`): uniform insert/search/delete over all three
//! - **Harness** (`bench`): timed bulk phases over a delimited data file
//!
//! ## Usage
//!
//! ```rust
//! use ordtree::{BPlusTree, BTree};
//!
//! let mut tree = BTree::new(3)?;
//! tree.insert(7, "seven");
//! assert_eq!(tree.search(&7)?, &"seven");
//!
//! let mut index = BPlusTree::new(4)?;
//! for k in 0..100 {
//!     index.insert(k, k * k);
//! }
//! let squares: Vec<_> = index.range_query(&3, &5).copied().collect();
//! assert_eq!(squares, vec![9, 16, 25]);
//! # Ok::<(), ordtree::TreeError>(())
//! ```

pub mod arena;
pub mod bench;
pub mod bplus;
pub mod btree;
pub mod error;
pub mod hash;
pub mod store;
pub mod types;

pub use error::{Result, TreeError};
pub use store::KvStore;
pub use types::{NodeId, TreeConfig, DEFAULT_ORDER, MIN_ORDER};

// Re-export main public API
pub use bench::{BenchConfig, BenchReport, Engine, Workload};
pub use bplus::BPlusTree;
pub use btree::BTree;
pub use hash::LinearProbingMap;

use serde::{Deserialize, Serialize};

/// Node type for visualization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Arena slot of the node
    pub node_id: u32,
    /// Whether this is a leaf node
    pub is_leaf: bool,
    /// Keys in this node
    pub keys: Vec<String>,
    /// Values (empty for B+tree internal nodes)
    pub values: Vec<String>,
    /// Child nodes (only for interior nodes)
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Total keys in this subtree
    pub fn key_count(&self) -> usize {
        self.keys.len() + self.children.iter().map(TreeNode::key_count).sum::<usize>()
    }
}

/// Tree shape statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    /// Stored pairs
    pub len: usize,
    /// Levels, counting the root
    pub height: usize,
    /// Live nodes
    pub node_count: usize,
    /// Leaf nodes
    pub leaf_count: usize,
}
